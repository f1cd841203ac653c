//! End-to-end scenarios against literal record lists, no network or
//! subprocess involved (spec.md §8, scenarios S1-S6).

use chrono::{TimeZone, Utc};
use ribrecon::observer::graph::GraphObserver;
use ribrecon::observer::path::PathObserver;
use ribrecon::observer::update_counter::UpdateCounterObserver;
use ribrecon::record::{RecordKind, RibRecord, UpdateRecord};
use ribrecon::rib::RibStore;
use std::cell::RefCell;
use std::rc::Rc;

fn rib_record(peer_ip: &str, peer_asn: u32, prefix: &str, as_path: &str) -> RibRecord {
    RibRecord {
        peer_ip: peer_ip.to_string(),
        peer_asn,
        prefix: prefix.to_string(),
        as_path: as_path.to_string(),
    }
}

fn announcement(ts: i64, peer_ip: &str, peer_asn: u32, prefix: &str, as_path: &str) -> UpdateRecord {
    UpdateRecord {
        ts: Utc.timestamp_opt(ts, 0).unwrap(),
        kind: RecordKind::Announcement,
        peer_ip: peer_ip.to_string(),
        peer_asn,
        prefix: prefix.to_string(),
        as_path: as_path.to_string(),
    }
}

fn withdrawal(ts: i64, peer_ip: &str, prefix: &str) -> UpdateRecord {
    UpdateRecord {
        ts: Utc.timestamp_opt(ts, 0).unwrap(),
        kind: RecordKind::Withdrawal,
        peer_ip: peer_ip.to_string(),
        peer_asn: 0,
        prefix: prefix.to_string(),
        as_path: String::new(),
    }
}

#[test]
fn s1_empty_window_build_and_dump() {
    let ts = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let mut store = RibStore::new(vec![], ts, ts);

    let output_dir = tempfile::tempdir().unwrap();
    let graph = Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.path())));
    let path = Rc::new(RefCell::new(PathObserver::new("path", output_dir.path())));
    store.attach_observer(graph);
    store.attach_observer(path.clone());

    store.build_rc(
        "rrc00",
        vec![
            rib_record("1.2.3.4", 100, "10.0.0.0/24", "100 200 300"),
            rib_record("1.2.3.4", 100, "10.1.0.0/24", "100 200 300"),
        ]
        .into_iter(),
    );

    store.dump(ts, None).unwrap();

    assert_eq!(path.borrow().paths_count.get("100 200 300"), Some(&2));

    let mut other = RibStore::new(vec![], ts, ts);
    other.build_rc(
        "rrc00",
        vec![
            rib_record("1.2.3.4", 100, "10.0.0.0/24", "100 200 300"),
            rib_record("1.2.3.4", 100, "10.1.0.0/24", "100 200 300"),
        ]
        .into_iter(),
    );
    store.compare(&other);
}

#[test]
fn s2_single_announcement_builds_graph_edges_and_path_count() {
    let ts_start = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let ts_end = Utc.timestamp_opt(1_000_100, 0).unwrap();
    let mut store = RibStore::new(vec![], ts_start, ts_end);

    let output_dir = tempfile::tempdir().unwrap();
    let graph = Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.path())));
    let path = Rc::new(RefCell::new(PathObserver::new("path", output_dir.path())));
    store.attach_observer(graph.clone());
    store.attach_observer(path.clone());

    // Warm start with an empty RIB that still knows about the peer.
    store.build_rc("rrc00", std::iter::empty());
    store
        .data
        .get_mut("rrc00")
        .unwrap()
        .entry("1.2.3.4".to_string())
        .or_default();

    store.update_rc(
        "rrc00",
        vec![announcement(1_000_050, "1.2.3.4", 100, "10.0.0.0/24", "100 200 300")].into_iter(),
    );

    assert_eq!(graph.borrow().graph_ipv4.get(&(100, 200)), Some(&1));
    assert_eq!(graph.borrow().graph_ipv4.get(&(200, 300)), Some(&1));
    assert_eq!(path.borrow().paths_count.get("100 200 300"), Some(&1));
}

#[test]
fn s3_path_replacement_moves_edges_and_path_count() {
    let ts_start = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let ts_end = Utc.timestamp_opt(1_000_100, 0).unwrap();
    let mut store = RibStore::new(vec![], ts_start, ts_end);

    let output_dir = tempfile::tempdir().unwrap();
    let graph = Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.path())));
    let path = Rc::new(RefCell::new(PathObserver::new("path", output_dir.path())));
    store.attach_observer(graph.clone());
    store.attach_observer(path.clone());

    store.build_rc("rrc00", std::iter::empty());
    store
        .data
        .get_mut("rrc00")
        .unwrap()
        .entry("1.2.3.4".to_string())
        .or_default();

    store.update_rc(
        "rrc00",
        vec![
            announcement(1_000_010, "1.2.3.4", 100, "10.0.0.0/24", "100 200 300"),
            announcement(1_000_020, "1.2.3.4", 100, "10.0.0.0/24", "100 200 400"),
        ]
        .into_iter(),
    );

    assert_eq!(graph.borrow().graph_ipv4.get(&(200, 300)), None);
    assert_eq!(graph.borrow().graph_ipv4.get(&(100, 200)), Some(&1));
    assert_eq!(graph.borrow().graph_ipv4.get(&(200, 400)), Some(&1));
    assert_eq!(path.borrow().paths_count.get("100 200 400"), Some(&1));
    assert!(!path.borrow().paths_count.contains_key("100 200 300"));
}

#[test]
fn s4_withdrawal_of_absent_entry_is_a_no_op() {
    let ts_start = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let ts_end = Utc.timestamp_opt(1_000_100, 0).unwrap();
    let mut store = RibStore::new(vec![], ts_start, ts_end);

    let output_dir = tempfile::tempdir().unwrap();
    let counter = Rc::new(RefCell::new(UpdateCounterObserver::new("update_count", output_dir.path())));
    store.attach_observer(counter.clone());

    store.build_rc("rrc00", std::iter::empty());
    store
        .data
        .get_mut("rrc00")
        .unwrap()
        .entry("1.2.3.4".to_string())
        .or_default();

    store.update_rc("rrc00", vec![withdrawal(1_000_010, "1.2.3.4", "10.0.0.0/8")].into_iter());

    assert!(counter.borrow().n_updates_per_peer.is_empty());
}

#[test]
fn s5_malformed_announcement_purges_existing_entry() {
    let ts_start = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let ts_end = Utc.timestamp_opt(1_000_100, 0).unwrap();
    let mut store = RibStore::new(vec![], ts_start, ts_end);

    let output_dir = tempfile::tempdir().unwrap();
    let graph = Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.path())));
    store.attach_observer(graph.clone());

    store.build_rc(
        "rrc00",
        vec![rib_record("1.2.3.4", 100, "10.0.0.0/24", "100 200 300")].into_iter(),
    );
    assert_eq!(graph.borrow().graph_ipv4.get(&(200, 300)), Some(&1));

    store.update_rc(
        "rrc00",
        vec![announcement(1_000_010, "1.2.3.4", 100, "10.0.0.0/24", "100 {200,201} 300")].into_iter(),
    );

    assert_eq!(graph.borrow().graph_ipv4.get(&(100, 200)), None);
    assert_eq!(graph.borrow().graph_ipv4.get(&(200, 300)), None);
    assert!(!store.data["rrc00"]["1.2.3.4"].contains_key("10.0.0.0/24"));
}

#[test]
fn s6_stop_updating_latches_and_halts_consumption() {
    let ts_start = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let ts_end = Utc.timestamp_opt(1_000_100, 0).unwrap();
    let mut store = RibStore::new(vec![], ts_start, ts_end);

    let output_dir = tempfile::tempdir().unwrap();
    let graph = Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.path())));
    store.attach_observer(graph.clone());

    store.build_rc("rrc00", std::iter::empty());
    store
        .data
        .get_mut("rrc00")
        .unwrap()
        .entry("1.2.3.4".to_string())
        .or_default();

    // past ts_end + 1s, followed by a record that would have been valid had
    // it been processed — it must be skipped because the stream halts at
    // the first record past the margin.
    store.update_rc(
        "rrc00",
        vec![
            announcement(1_000_102, "1.2.3.4", 100, "10.0.0.0/24", "100 200 300"),
            announcement(1_000_010, "1.2.3.4", 100, "10.1.0.0/24", "100 500 600"),
        ]
        .into_iter(),
    );

    assert_eq!(store.stop_updating["rrc00"], true);
    assert_eq!(graph.borrow().graph_ipv4.get(&(100, 200)), None);
    assert_eq!(graph.borrow().graph_ipv4.get(&(100, 500)), None);
}
