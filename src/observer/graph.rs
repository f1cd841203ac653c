/*!
AS graph observer (spec.md §4.3.1): an undirected simple graph over ASNs,
edge-weighted by `paths_count`, the number of distinct (peer, prefix) paths
currently traversing that edge across all peers combined.

A graph observer may optionally be paired with a [`MultiGraphObserver`]
through a non-owning [`Weak`] reference, the same collaborator the RIB store
itself owns strongly. When paired, `dump` emits a 4-column CSV
(`origin,destination,paths_count,peers_count`) with `paths_count` normalized
to `paths_count / peers_count` and `peers_count` as its own column, both read
from the multigraph's per-peer edge bookkeeping; an edge missing from the
multigraph (collaborator dropped, or never observed under that family) is
skipped entirely, matching the original's `except KeyError: continue`. With
no collaborator attached, `dump` emits the plain 3-column
`origin,destination,paths_count` form. The graph observer never reaches for
`Rc::upgrade` during `add_path`/`update_*` — only `dump` needs it.
*/
use super::multigraph::MultiGraphObserver;
use super::Observer;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Weak;

pub type Edge = (u32, u32);

fn edge_key(a: u32, b: u32) -> Edge {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct GraphObserver {
    name: String,
    output_dir: PathBuf,
    pub graph_ipv4: HashMap<Edge, u64>,
    pub graph_ipv6: HashMap<Edge, u64>,
    multigraph: Option<Weak<RefCell<MultiGraphObserver>>>,
}

impl GraphObserver {
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        GraphObserver {
            name: name.into(),
            output_dir: output_dir.into(),
            graph_ipv4: HashMap::new(),
            graph_ipv6: HashMap::new(),
            multigraph: None,
        }
    }

    /// Attach the weak collaborator used to normalize dump weights.
    pub fn with_multigraph(mut self, multigraph: Weak<RefCell<MultiGraphObserver>>) -> Self {
        self.multigraph = Some(multigraph);
        self
    }

    fn bump(graph: &mut HashMap<Edge, u64>, path: &[u32]) {
        for window in path.windows(2) {
            *graph.entry(edge_key(window[0], window[1])).or_insert(0) += 1;
        }
    }

    fn drop_edge(graph: &mut HashMap<Edge, u64>, path: &[u32]) {
        for window in path.windows(2) {
            let edge = edge_key(window[0], window[1]);
            if let Some(count) = graph.get_mut(&edge) {
                *count -= 1;
                if *count == 0 {
                    graph.remove(&edge);
                }
            }
        }
    }

    /// `peers_count` from the paired multigraph for `edge` in the given
    /// family, or `None` if there is no collaborator or it has never seen
    /// that edge.
    fn peers_count(&self, edge: Edge, v4: bool) -> Option<u64> {
        self.multigraph.as_ref().and_then(|weak| {
            weak.upgrade().and_then(|mg| {
                let mg = mg.borrow();
                if v4 {
                    mg.peers_count_v4(edge.0, edge.1)
                } else {
                    mg.peers_count_v6(edge.0, edge.1)
                }
            })
        })
    }

    /// Dump one address family to `<name>_<ipv4|ipv6>.<ts>.csv`: a comment
    /// header (`#origin,destination,paths_count`, or `...,peers_count` when
    /// a multigraph collaborator is attached), an optional second comment
    /// line carrying `metadata`, then one data row per edge.
    fn dump_family(
        &self,
        graph: &HashMap<Edge, u64>,
        ts: DateTime<Utc>,
        v4: bool,
        metadata: Option<&str>,
    ) -> Result<()> {
        let suffix = if v4 { "ipv4" } else { "ipv6" };
        let filename = format!(
            "{}_{}.{}.csv",
            self.name,
            suffix,
            ts.format("%Y%m%d.%H%M")
        );
        let path = self.output_dir.join(filename);
        let mut file = File::create(&path)?;

        if self.multigraph.is_some() {
            writeln!(file, "#origin,destination,paths_count,peers_count")?;
        } else {
            writeln!(file, "#origin,destination,paths_count")?;
        }
        if let Some(metadata) = metadata {
            writeln!(file, "#{metadata}")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file.try_clone()?);
        for (&(a, b), &count) in graph {
            if self.multigraph.is_some() {
                let Some(peers_count) = self.peers_count((a, b), v4).filter(|&p| p > 0) else {
                    continue;
                };
                let weight = count as f64 / peers_count as f64;
                writer.write_record(&[a.to_string(), b.to_string(), weight.to_string(), peers_count.to_string()])?;
            } else {
                writer.write_record(&[a.to_string(), b.to_string(), count.to_string()])?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

impl Observer for GraphObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_path_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        Self::bump(&mut self.graph_ipv4, path);
    }

    fn add_path_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        Self::bump(&mut self.graph_ipv6, path);
    }

    fn update_withdrawal_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        Self::drop_edge(&mut self.graph_ipv4, path);
    }

    fn update_withdrawal_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        Self::drop_edge(&mut self.graph_ipv6, path);
    }

    fn update_announcement_v4(
        &mut self,
        rc: &str,
        peer_ip: &str,
        prefix: &str,
        new_path: &[u32],
        old_path: Option<&[u32]>,
    ) {
        if let Some(old) = old_path {
            self.update_withdrawal_v4(rc, peer_ip, prefix, old);
        }
        self.add_path_v4(rc, peer_ip, prefix, new_path);
    }

    fn update_announcement_v6(
        &mut self,
        rc: &str,
        peer_ip: &str,
        prefix: &str,
        new_path: &[u32],
        old_path: Option<&[u32]>,
    ) {
        if let Some(old) = old_path {
            self.update_withdrawal_v6(rc, peer_ip, prefix, old);
        }
        self.add_path_v6(rc, peer_ip, prefix, new_path);
    }

    fn dump(&mut self, ts: DateTime<Utc>, metadata: Option<&str>) -> Result<()> {
        self.dump_family(&self.graph_ipv4, ts, true, metadata)?;
        self.dump_family(&self.graph_ipv6, ts, false, metadata)?;
        Ok(())
    }

    /// The implementation this engine is derived from read
    /// `self.as_graph_ipv4` here, a field that only ever existed on the
    /// dump path (`self.graph_ipv4`) — a typo that made cross-run comparison
    /// silently compare nothing. This observer always compares
    /// `graph_ipv4` / `graph_ipv6` directly. A vertex only exists in this
    /// edge-keyed representation while it has a live edge, so an edge count
    /// dropping to zero already removes any vertex that would otherwise be
    /// left isolated — no separate pruning pass is needed before comparing.
    fn compare(&self, other: &dyn Any) {
        let Some(other) = other.downcast_ref::<GraphObserver>() else {
            log::warn!("graph observer compare: type mismatch");
            return;
        };
        if self.graph_ipv4 != other.graph_ipv4 {
            log::info!(
                "graph observer {} ipv4 mismatch: {} vs {} edges",
                self.name,
                self.graph_ipv4.len(),
                other.graph_ipv4.len()
            );
        }
        if self.graph_ipv6 != other.graph_ipv6 {
            log::info!(
                "graph observer {} ipv6 mismatch: {} vs {} edges",
                self.name,
                self.graph_ipv6.len(),
                other.graph_ipv6.len()
            );
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
