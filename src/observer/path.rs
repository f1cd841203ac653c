/*!
Path-count observer (spec.md §4.3.3): tracks how many live (peer, prefix)
routes currently use each distinct canonical AS-path, and how many distinct
paths exist of each length. Dumped as JSON rather than CSV since its output
is a handful of scalars and maps, not an edge list.
*/
use super::Observer;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

#[derive(Serialize)]
struct PathDump<'a> {
    timestamp: String,
    n_unique_paths: usize,
    paths_count: &'a HashMap<String, u64>,
    paths_length_count: &'a HashMap<usize, u64>,
}

#[derive(Default)]
pub struct PathObserver {
    name: String,
    output_dir: PathBuf,
    pub paths_count: HashMap<String, u64>,
    pub paths_length_count: HashMap<usize, u64>,
}

fn path_key(path: &[u32]) -> String {
    path.iter().map(|asn| asn.to_string()).collect::<Vec<_>>().join(" ")
}

impl PathObserver {
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        PathObserver {
            name: name.into(),
            output_dir: output_dir.into(),
            paths_count: HashMap::new(),
            paths_length_count: HashMap::new(),
        }
    }

    fn add(&mut self, path: &[u32]) {
        let key = path_key(path);
        let is_new = !self.paths_count.contains_key(&key);
        *self.paths_count.entry(key).or_insert(0) += 1;
        if is_new {
            *self.paths_length_count.entry(path.len()).or_insert(0) += 1;
        }
    }

    fn remove(&mut self, path: &[u32]) {
        let key = path_key(path);
        let Some(count) = self.paths_count.get_mut(&key) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.paths_count.remove(&key);
            if let Some(len_count) = self.paths_length_count.get_mut(&path.len()) {
                *len_count -= 1;
                if *len_count == 0 {
                    self.paths_length_count.remove(&path.len());
                }
            }
        }
    }
}

impl Observer for PathObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_path_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        self.add(path);
    }

    fn add_path_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        self.add(path);
    }

    fn update_withdrawal_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        self.remove(path);
    }

    fn update_withdrawal_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, path: &[u32]) {
        self.remove(path);
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
            self.remove(old);
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
            self.remove(old);
        }
        self.add_path_v6(rc, peer_ip, prefix, new_path);
    }

    fn dump(&mut self, ts: DateTime<Utc>, _metadata: Option<&str>) -> Result<()> {
        let dump = PathDump {
            timestamp: ts.to_rfc3339(),
            n_unique_paths: self.paths_count.len(),
            paths_count: &self.paths_count,
            paths_length_count: &self.paths_length_count,
        };
        let filename = format!("{}.{}.json", self.name, ts.format("%Y%m%d.%H%M"));
        let file = File::create(self.output_dir.join(filename))?;
        serde_json::to_writer_pretty(file, &dump)
            .map_err(|e| crate::error::Error::config(e.to_string()))?;
        Ok(())
    }

    fn compare(&self, other: &dyn Any) {
        let Some(other) = other.downcast_ref::<PathObserver>() else {
            log::warn!("path observer compare: type mismatch");
            return;
        };
        if self.paths_count != other.paths_count {
            log::info!(
                "path observer {} mismatch: {} vs {} unique paths",
                self.name,
                self.paths_count.len(),
                other.paths_count.len()
            );
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_unique_paths_and_lengths() {
        let mut obs = PathObserver::new("paths", ".");
        obs.add_path_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200, 300]);
        obs.add_path_v4("rrc00", "5.6.7.8", "10.0.0.0/24", &[100, 200, 300]);
        assert_eq!(obs.paths_count.get("100 200 300"), Some(&2));
        assert_eq!(obs.paths_length_count.get(&3), Some(&1));
    }

    #[test]
    fn withdrawal_removes_path_when_last_user_gone() {
        let mut obs = PathObserver::new("paths", ".");
        obs.add_path_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200]);
        obs.update_withdrawal_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200]);
        assert!(obs.paths_count.is_empty());
        assert!(obs.paths_length_count.is_empty());
    }
}
