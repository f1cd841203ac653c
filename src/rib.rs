/*!
The RIB store (spec.md §4.2-4.4): a `route_collector -> peer_ip -> prefix ->
as_path` map, fed by already-decoded [`RibRecord`]/[`UpdateRecord`] streams
(decoding and downloading are the caller's concern; see [`crate::decoder`]
and [`crate::download`]). Every mutation is fanned out to attached
[`Observer`]s before the store applies it to its own map, so an observer
always sees the path being replaced, not just the new one.
*/
use crate::error::Result;
use crate::observer::Observer;
use crate::record::{classify, AddressFamily, RecordKind, RibRecord, UpdateRecord};
use crate::sanitize::{sanitize_path, SanitizeOutcome};
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// peer_ip -> prefix -> as_path
pub type PeerRib = HashMap<String, HashMap<String, Vec<u32>>>;

/// Outcome of building or updating one collector's slice of the store.
/// Mirrors the informational logging the reconstruction driver emits.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildStats {
    pub entries: u64,
    pub invalid: u64,
}

pub struct RibStore {
    observers: Vec<Rc<RefCell<dyn Observer>>>,
    /// rc -> peer_ip -> prefix -> as_path
    pub data: HashMap<String, PeerRib>,
    /// rc -> true once an update past `ts_end + 1s` has been seen.
    pub stop_updating: HashMap<String, bool>,
    peer_ip_filter: Vec<String>,
    ts_start: DateTime<Utc>,
    ts_end: DateTime<Utc>,
}

impl RibStore {
    pub fn new(peer_ip_filter: Vec<String>, ts_start: DateTime<Utc>, ts_end: DateTime<Utc>) -> Self {
        RibStore {
            observers: Vec::new(),
            data: HashMap::new(),
            stop_updating: HashMap::new(),
            peer_ip_filter,
            ts_start,
            ts_end,
        }
    }

    pub fn attach_observer(&mut self, observer: Rc<RefCell<dyn Observer>>) {
        self.observers.push(observer);
    }

    pub fn detach_observer(&mut self, name: &str) {
        self.observers.retain(|o| o.borrow().name() != name);
    }

    fn passes_filter(&self, peer_ip: &str) -> bool {
        self.peer_ip_filter.is_empty() || self.peer_ip_filter.iter().any(|p| p == peer_ip)
    }

    fn notify_add_path(&self, rc: &str, peer_ip: &str, prefix: &str, path: &[u32], family: AddressFamily) {
        for observer in &self.observers {
            let mut observer = observer.borrow_mut();
            match family {
                AddressFamily::V4 => observer.add_path_v4(rc, peer_ip, prefix, path),
                AddressFamily::V6 => observer.add_path_v6(rc, peer_ip, prefix, path),
            }
        }
    }

    fn notify_withdrawal(&self, rc: &str, peer_ip: &str, prefix: &str, path: &[u32], family: AddressFamily) {
        for observer in &self.observers {
            let mut observer = observer.borrow_mut();
            match family {
                AddressFamily::V4 => observer.update_withdrawal_v4(rc, peer_ip, prefix, path),
                AddressFamily::V6 => observer.update_withdrawal_v6(rc, peer_ip, prefix, path),
            }
        }
    }

    fn notify_announcement(
        &self,
        rc: &str,
        peer_ip: &str,
        prefix: &str,
        new_path: &[u32],
        old_path: Option<&[u32]>,
        family: AddressFamily,
    ) {
        for observer in &self.observers {
            let mut observer = observer.borrow_mut();
            match family {
                AddressFamily::V4 => observer.update_announcement_v4(rc, peer_ip, prefix, new_path, old_path),
                AddressFamily::V6 => observer.update_announcement_v6(rc, peer_ip, prefix, new_path, old_path),
            }
        }
    }

    /// Build (or rebuild) one collector's slice of the store from a decoded
    /// RIB-dump record stream.
    pub fn build_rc(&mut self, rc: &str, records: impl Iterator<Item = RibRecord>) -> BuildStats {
        let mut peer_rib: PeerRib = HashMap::new();
        let mut stats = BuildStats::default();

        for record in records {
            stats.entries += 1;
            if !self.passes_filter(&record.peer_ip) {
                continue;
            }
            match sanitize_path(&record.as_path, record.peer_asn) {
                SanitizeOutcome::Valid(path) => {
                    let family = classify(&record.prefix);
                    self.notify_add_path(rc, &record.peer_ip, &record.prefix, &path, family);
                    peer_rib
                        .entry(record.peer_ip)
                        .or_default()
                        .insert(record.prefix, path);
                }
                _ => stats.invalid += 1,
            }
        }

        if stats.entries == 0 {
            log::warn!("RIB content empty for collector {rc}");
        } else {
            log::info!(
                "{} invalid entries out of {} ({:.2} %)",
                stats.invalid,
                stats.entries,
                100.0 * stats.invalid as f64 / stats.entries as f64
            );
        }

        self.data.insert(rc.to_string(), peer_rib);
        self.stop_updating.insert(rc.to_string(), false);
        stats
    }

    /// Apply a decoded update-stream for one collector. Updates before
    /// `ts_start` are skipped; the first update past `ts_end + 1s` latches
    /// `stop_updating` for this collector and ends the stream early.
    pub fn update_rc(&mut self, rc: &str, records: impl Iterator<Item = UpdateRecord>) {
        let margin = self.ts_end + Duration::seconds(1);

        for update in records {
            if update.ts < self.ts_start {
                continue;
            }
            if update.ts > margin {
                self.stop_updating.insert(rc.to_string(), true);
                return;
            }
            if !self.passes_filter(&update.peer_ip) {
                continue;
            }

            let Some(peer_rib) = self.data.get_mut(rc) else {
                continue;
            };

            match update.kind {
                RecordKind::Withdrawal => {
                    let Some(prefixes) = peer_rib.get_mut(&update.peer_ip) else {
                        continue;
                    };
                    if let Some(old_path) = prefixes.remove(&update.prefix) {
                        let family = classify(&update.prefix);
                        self.notify_withdrawal(rc, &update.peer_ip, &update.prefix, &old_path, family);
                    }
                }
                RecordKind::Announcement => {
                    // A peer not yet present in the RIB is ignored entirely;
                    // the original RIB dump is the only source of truth for
                    // which peers exist at a collector.
                    let Some(prefixes) = peer_rib.get_mut(&update.peer_ip) else {
                        continue;
                    };
                    let family = classify(&update.prefix);
                    match sanitize_path(&update.as_path, update.peer_asn) {
                        SanitizeOutcome::Valid(new_path) => {
                            let old_path = prefixes.get(&update.prefix).cloned();
                            self.notify_announcement(
                                rc,
                                &update.peer_ip,
                                &update.prefix,
                                &new_path,
                                old_path.as_deref(),
                                family,
                            );
                            prefixes.insert(update.prefix, new_path);
                        }
                        _ => {
                            // Malformed or invalid path: drop whatever stale
                            // entry we had, since it can no longer be trusted.
                            if let Some(old_path) = prefixes.remove(&update.prefix) {
                                self.notify_withdrawal(rc, &update.peer_ip, &update.prefix, &old_path, family);
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn dump(&mut self, ts: DateTime<Utc>, metadata: Option<&str>) -> Result<()> {
        for observer in &self.observers {
            observer.borrow_mut().dump(ts, metadata)?;
        }
        Ok(())
    }

    /// Compare this store's reconstructed RIB, and its observers, against a
    /// ground-truth store built from the end-of-window RIB dump.
    pub fn compare(&self, other: &RibStore) {
        for (rc, peer_rib) in &self.data {
            let Some(other_peer_rib) = other.data.get(rc) else {
                continue;
            };
            for (peer_ip, prefixes) in peer_rib {
                let Some(other_prefixes) = other_peer_rib.get(peer_ip) else {
                    log::error!("peer {peer_ip} at {rc} not present in ground truth");
                    continue;
                };
                if other_prefixes.is_empty() {
                    continue;
                }
                log::info!("Performing RIB check for peer {peer_ip} at {rc}");
                let (added, removed, modified) = diff_prefixes(prefixes, other_prefixes);
                if added == 0 && removed == 0 && modified == 0 {
                    log::info!("No RIB reconstruction error");
                } else {
                    let total = other_prefixes.len() as f64;
                    log::info!("{added} ({:.2} %) pfx present only in ground truth", 100.0 * added as f64 / total);
                    log::info!("{removed} ({:.2} %) pfx present only in my processed version", 100.0 * removed as f64 / total);
                    log::info!("{modified} ({:.2} %) pfx present in both but with different as-paths", 100.0 * modified as f64 / total);
                }
            }
        }

        for other_observer in &other.observers {
            let other_observer = other_observer.borrow();
            for own_observer in &self.observers {
                let own_observer = own_observer.borrow();
                if own_observer.name() == other_observer.name() {
                    own_observer.compare(other_observer.as_any());
                }
            }
        }
    }
}

fn diff_prefixes(mine: &HashMap<String, Vec<u32>>, theirs: &HashMap<String, Vec<u32>>) -> (usize, usize, usize) {
    let mut added = 0;
    let mut removed = 0;
    let mut modified = 0;

    for (prefix, their_path) in theirs {
        match mine.get(prefix) {
            None => added += 1,
            Some(my_path) if my_path != their_path => modified += 1,
            Some(_) => {}
        }
    }
    for prefix in mine.keys() {
        if !theirs.contains_key(prefix) {
            removed += 1;
        }
    }

    (added, removed, modified)
}
