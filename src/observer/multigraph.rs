/*!
AS multigraph observer (spec.md §4.3.2): same shape as the graph observer, but
each peer contributes its own parallel edge keyed by `"{rc}_{peer_ip}"`. This
observer never dumps anything to disk; its sole purpose is to let the paired
[`super::graph::GraphObserver`] compute a `paths_count / peers_count` weight.
*/
use super::Observer;
use std::any::Any;
use std::collections::HashMap;

/// Undirected edge, always stored with the smaller ASN first so `(u, v)` and
/// `(v, u)` hash to the same key.
pub type Edge = (u32, u32);

fn edge_key(a: u32, b: u32) -> Edge {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Default)]
pub struct MultiGraphObserver {
    name: String,
    pub graph_ipv4: HashMap<Edge, HashMap<String, u64>>,
    pub graph_ipv6: HashMap<Edge, HashMap<String, u64>>,
}

impl MultiGraphObserver {
    pub fn new(name: impl Into<String>) -> Self {
        MultiGraphObserver {
            name: name.into(),
            graph_ipv4: HashMap::new(),
            graph_ipv6: HashMap::new(),
        }
    }

    /// Number of distinct peers currently contributing to the edge `(u, v)`.
    pub fn peers_count_v4(&self, u: u32, v: u32) -> Option<usize> {
        self.graph_ipv4.get(&edge_key(u, v)).map(|m| m.len())
    }

    pub fn peers_count_v6(&self, u: u32, v: u32) -> Option<usize> {
        self.graph_ipv6.get(&edge_key(u, v)).map(|m| m.len())
    }

    fn add_path(graph: &mut HashMap<Edge, HashMap<String, u64>>, key: &str, path: &[u32]) {
        for window in path.windows(2) {
            let (u, v) = (window[0], window[1]);
            *graph
                .entry(edge_key(u, v))
                .or_default()
                .entry(key.to_string())
                .or_insert(0) += 1;
        }
    }

    fn remove_path(graph: &mut HashMap<Edge, HashMap<String, u64>>, key: &str, path: &[u32]) {
        for window in path.windows(2) {
            let (u, v) = (window[0], window[1]);
            let edge = edge_key(u, v);
            let Some(peers) = graph.get_mut(&edge) else {
                continue;
            };
            let Some(count) = peers.get_mut(key) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                peers.remove(key);
            }
            if peers.is_empty() {
                graph.remove(&edge);
            }
        }
    }
}

fn peer_key(rc: &str, peer_ip: &str) -> String {
    format!("{rc}_{peer_ip}")
}

impl Observer for MultiGraphObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_path_v4(&mut self, rc: &str, peer_ip: &str, _prefix: &str, path: &[u32]) {
        let key = peer_key(rc, peer_ip);
        Self::add_path(&mut self.graph_ipv4, &key, path);
    }

    fn add_path_v6(&mut self, rc: &str, peer_ip: &str, _prefix: &str, path: &[u32]) {
        let key = peer_key(rc, peer_ip);
        Self::add_path(&mut self.graph_ipv6, &key, path);
    }

    fn update_withdrawal_v4(&mut self, rc: &str, peer_ip: &str, _prefix: &str, path: &[u32]) {
        let key = peer_key(rc, peer_ip);
        Self::remove_path(&mut self.graph_ipv4, &key, path);
    }

    fn update_withdrawal_v6(&mut self, rc: &str, peer_ip: &str, _prefix: &str, path: &[u32]) {
        let key = peer_key(rc, peer_ip);
        Self::remove_path(&mut self.graph_ipv6, &key, path);
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

    // dump is a no-op: this observer only backs the graph observer's weights.

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_edges_keyed_by_peer() {
        let mut obs = MultiGraphObserver::new("multigraph");
        obs.add_path_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200, 300]);
        obs.add_path_v4("rrc00", "5.6.7.8", "10.0.0.0/24", &[400, 200, 300]);
        assert_eq!(obs.peers_count_v4(200, 300), Some(2));
        assert_eq!(obs.peers_count_v4(100, 200), Some(1));
    }

    #[test]
    fn withdrawal_removes_empty_edge() {
        let mut obs = MultiGraphObserver::new("multigraph");
        obs.add_path_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200]);
        obs.update_withdrawal_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200]);
        assert_eq!(obs.peers_count_v4(100, 200), None);
    }
}
