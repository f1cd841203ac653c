/*!
Update-counter observer (spec.md §4.3.4): per-collector and per-collector-
per-peer tallies of updates seen, split by address family for withdrawals
and announcements. Exists purely for descriptive statistics; `compare` is a
no-op since counters are inherently run-dependent (a replay restarted
partway through a window will never match a from-scratch run's counts) and
comparing them would only ever produce noise, matching the original observer
this is grounded on, which never overrides `compare` at all.
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
struct CounterDump<'a> {
    n_updates: &'a HashMap<String, u64>,
    n_withdrawals_ipv4: &'a HashMap<String, u64>,
    n_withdrawals_ipv6: &'a HashMap<String, u64>,
    n_announcements_ipv4: &'a HashMap<String, u64>,
    n_announcements_ipv6: &'a HashMap<String, u64>,
    n_updates_per_peer: &'a HashMap<String, HashMap<String, u64>>,
}

enum FamilyCounter {
    WithdrawalV4,
    WithdrawalV6,
    AnnouncementV4,
    AnnouncementV6,
}

#[derive(Default)]
pub struct UpdateCounterObserver {
    name: String,
    output_dir: PathBuf,
    pub n_updates: HashMap<String, u64>,
    pub n_withdrawals_ipv4: HashMap<String, u64>,
    pub n_withdrawals_ipv6: HashMap<String, u64>,
    pub n_announcements_ipv4: HashMap<String, u64>,
    pub n_announcements_ipv6: HashMap<String, u64>,
    /// rc -> peer_ip -> count
    pub n_updates_per_peer: HashMap<String, HashMap<String, u64>>,
}

impl UpdateCounterObserver {
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        UpdateCounterObserver {
            name: name.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    fn bump(&mut self, rc: &str, peer_ip: &str, family: FamilyCounter) {
        *self.n_updates.entry(rc.to_string()).or_insert(0) += 1;
        let family_map = match family {
            FamilyCounter::WithdrawalV4 => &mut self.n_withdrawals_ipv4,
            FamilyCounter::WithdrawalV6 => &mut self.n_withdrawals_ipv6,
            FamilyCounter::AnnouncementV4 => &mut self.n_announcements_ipv4,
            FamilyCounter::AnnouncementV6 => &mut self.n_announcements_ipv6,
        };
        *family_map.entry(rc.to_string()).or_insert(0) += 1;
        *self
            .n_updates_per_peer
            .entry(rc.to_string())
            .or_default()
            .entry(peer_ip.to_string())
            .or_insert(0) += 1;
    }
}

impl Observer for UpdateCounterObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_withdrawal_v4(&mut self, rc: &str, peer_ip: &str, _prefix: &str, _path: &[u32]) {
        self.bump(rc, peer_ip, FamilyCounter::WithdrawalV4);
    }

    fn update_withdrawal_v6(&mut self, rc: &str, peer_ip: &str, _prefix: &str, _path: &[u32]) {
        self.bump(rc, peer_ip, FamilyCounter::WithdrawalV6);
    }

    fn update_announcement_v4(
        &mut self,
        rc: &str,
        peer_ip: &str,
        _prefix: &str,
        _new_path: &[u32],
        _old_path: Option<&[u32]>,
    ) {
        self.bump(rc, peer_ip, FamilyCounter::AnnouncementV4);
    }

    fn update_announcement_v6(
        &mut self,
        rc: &str,
        peer_ip: &str,
        _prefix: &str,
        _new_path: &[u32],
        _old_path: Option<&[u32]>,
    ) {
        self.bump(rc, peer_ip, FamilyCounter::AnnouncementV6);
    }

    fn dump(&mut self, ts: DateTime<Utc>, _metadata: Option<&str>) -> Result<()> {
        let dump = CounterDump {
            n_updates: &self.n_updates,
            n_withdrawals_ipv4: &self.n_withdrawals_ipv4,
            n_withdrawals_ipv6: &self.n_withdrawals_ipv6,
            n_announcements_ipv4: &self.n_announcements_ipv4,
            n_announcements_ipv6: &self.n_announcements_ipv6,
            n_updates_per_peer: &self.n_updates_per_peer,
        };
        let filename = format!("{}.{}.json", self.name, ts.format("%Y%m%d.%H%M"));
        let file = File::create(self.output_dir.join(filename))?;
        serde_json::to_writer_pretty(file, &dump)
            .map_err(|e| crate::error::Error::config(e.to_string()))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_per_collector_family_and_peer() {
        let mut obs = UpdateCounterObserver::new("updates", ".");
        obs.update_announcement_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200], None);
        obs.update_withdrawal_v6("rrc00", "1.2.3.4", "2001:db8::/32", &[100, 200]);

        assert_eq!(obs.n_updates["rrc00"], 2);
        assert_eq!(obs.n_announcements_ipv4["rrc00"], 1);
        assert_eq!(obs.n_withdrawals_ipv6["rrc00"], 1);
        assert!(!obs.n_withdrawals_ipv4.contains_key("rrc00"));
        assert_eq!(obs.n_updates_per_peer["rrc00"]["1.2.3.4"], 2);
    }

    #[test]
    fn keeps_collectors_partitioned() {
        let mut obs = UpdateCounterObserver::new("updates", ".");
        obs.update_announcement_v4("rrc00", "1.2.3.4", "10.0.0.0/24", &[100, 200], None);
        obs.update_announcement_v4("route-views2", "1.2.3.4", "10.0.0.0/24", &[100, 200], None);

        assert_eq!(obs.n_updates_per_peer["rrc00"]["1.2.3.4"], 1);
        assert_eq!(obs.n_updates_per_peer["route-views2"]["1.2.3.4"], 1);
    }
}
