/*!
Observer framework: the polymorphic interface that the RIB store notifies of
every mutation (spec.md §4.3). Each method is default-inert so a concrete
observer only needs to override the events it cares about.

`compare` takes `&dyn Any` rather than `&dyn Observer` so concrete observers
can downcast to their own type — two observers of unrelated concrete types
are never meaningfully comparable, and the RIB store only ever pairs
same-name observers (see [`crate::rib::RibStore::compare`]).
*/
pub mod graph;
pub mod multigraph;
pub mod path;
pub mod update_counter;

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::any::Any;

pub trait Observer {
    fn name(&self) -> &str;

    fn add_path_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, _path: &[u32]) {}
    fn add_path_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, _path: &[u32]) {}

    fn update_withdrawal_v4(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, _path: &[u32]) {}
    fn update_withdrawal_v6(&mut self, _rc: &str, _peer_ip: &str, _prefix: &str, _path: &[u32]) {}

    #[allow(clippy::too_many_arguments)]
    fn update_announcement_v4(
        &mut self,
        _rc: &str,
        _peer_ip: &str,
        _prefix: &str,
        _new_path: &[u32],
        _old_path: Option<&[u32]>,
    ) {
    }
    #[allow(clippy::too_many_arguments)]
    fn update_announcement_v6(
        &mut self,
        _rc: &str,
        _peer_ip: &str,
        _prefix: &str,
        _new_path: &[u32],
        _old_path: Option<&[u32]>,
    ) {
    }

    fn dump(&mut self, _ts: DateTime<Utc>, _metadata: Option<&str>) -> Result<()> {
        Ok(())
    }

    /// Diagnostic-only comparison against another observer of the same name
    /// and (expected) concrete type. Never mutates state, never fails.
    fn compare(&self, _other: &dyn Any) {}

    fn as_any(&self) -> &dyn Any;
}
