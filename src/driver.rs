/*!
Reconstruction driver (spec.md §4.4): orchestrates the full build/update/dump
cycle across collectors and the time window, the Rust counterpart of the
`BGPDownloader` class this engine is derived from.
*/
use crate::collector::{self, FileKind, Project};
use crate::config::Config;
use crate::decoder;
use crate::download::Downloader;
use crate::error::Result;
use crate::observer::graph::GraphObserver;
use crate::observer::multigraph::MultiGraphObserver;
use crate::observer::path::PathObserver;
use crate::observer::update_counter::UpdateCounterObserver;
use crate::observer::Observer;
use crate::rib::RibStore;
use crate::time::{is_rib_instant, snap_to_rib_instant, snap_to_update_instant};
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::rc::Rc;
use std::thread;

/// Size of the bounded pool of OS threads downloads/decodes fan out across
/// per timestamp (spec.md §5's "bounded worker pool"). Collectors beyond
/// this count within one call wait for a slot to free up rather than all
/// spawning at once.
const FETCH_POOL_SIZE: usize = 4;

pub struct ReconstructionDriver {
    config: Config,
    downloader: Downloader,
    ts_start: DateTime<Utc>,
    ts_end: DateTime<Utc>,
    projects: HashSet<Project>,
    /// Whether `ts_end` lands on a RIB-publication instant for at least one
    /// active project, in which case a ground-truth compare runs at the end.
    should_compare: bool,
}

impl ReconstructionDriver {
    pub fn new(config: Config) -> Result<Self> {
        let (raw_start, raw_end) = config.parse_date_range()?;

        let mut projects = HashSet::new();
        for rc in &config.collectors {
            projects.insert(collector::classify_collector(rc)?);
        }

        let ts_start = snap_to_rib_instant(raw_start, &projects);
        log::info!("Setting start of time interval to {}", ts_start.format("%Y%m%d.%H%M"));
        let ts_end = snap_to_update_instant(raw_end);
        log::info!("Setting end of time interval to {}", ts_end.format("%Y%m%d.%H%M"));

        let should_compare = projects
            .iter()
            .any(|&project| is_rib_instant(ts_end, project, &projects));
        if should_compare {
            log::info!("ts_end is a RIB time. Reconstruction error will be assessed.");
        } else {
            log::info!("ts_end is not a RIB time. Reconstruction error will not be assessed.");
        }

        let cache_dir = config.output_dir.join(".cache");
        let downloader = Downloader::new(cache_dir)?;

        Ok(ReconstructionDriver {
            config,
            downloader,
            ts_start,
            ts_end,
            projects,
            should_compare,
        })
    }

    fn update_instants(&self) -> Vec<DateTime<Utc>> {
        let res = if self.projects.contains(&Project::Ris) {
            collector::RIS_UPDATE_RES_SECS
        } else {
            collector::RV_UPDATE_RES_SECS
        };
        let span = (self.ts_end - self.ts_start).num_seconds();
        let count = span / res + 1;
        (-1..=count + 1).map(|i| self.ts_start + Duration::seconds(res * i)).collect()
    }

    fn dump_instants(&self) -> Vec<DateTime<Utc>> {
        let n = (self.ts_end - self.ts_start).num_seconds() / self.config.interval;
        (1..=n).map(|i| self.ts_start + Duration::seconds(self.config.interval * i)).collect()
    }

    fn build_observed_store(&self) -> (RibStore, Vec<Rc<RefCell<dyn Observer>>>) {
        let mut store = RibStore::new(self.config.peer_ip_filter(), self.ts_start, self.ts_end);
        let output_dir = self.config.output_dir.join("processed").join(&self.config.output_filename);
        let _ = fs::create_dir_all(&output_dir);

        // Build the multigraph as its concrete type first so a `Weak` to the
        // concrete `MultiGraphObserver` can be handed to the graph observer;
        // only the strong `Rc` is ever coerced to `dyn Observer`, so the two
        // observers share one allocation without the RIB store needing to
        // know about the pairing.
        let multigraph_concrete = Rc::new(RefCell::new(MultiGraphObserver::new("multigraph")));
        let multigraph_weak = Rc::downgrade(&multigraph_concrete);
        let multigraph: Rc<RefCell<dyn Observer>> = multigraph_concrete;
        let graph: Rc<RefCell<dyn Observer>> =
            Rc::new(RefCell::new(GraphObserver::new("graph", output_dir.clone()).with_multigraph(multigraph_weak)));
        let update_counter: Rc<RefCell<dyn Observer>> =
            Rc::new(RefCell::new(UpdateCounterObserver::new("update_count", output_dir.clone())));
        let path: Rc<RefCell<dyn Observer>> = Rc::new(RefCell::new(PathObserver::new("path", output_dir)));

        store.attach_observer(graph.clone());
        store.attach_observer(multigraph.clone());
        store.attach_observer(update_counter.clone());
        store.attach_observer(path.clone());

        (store, vec![graph, multigraph, update_counter, path])
    }

    /// Download and decode one collector's RIB dump at `ts`.
    fn fetch_rib(&self, rc: &str, ts: DateTime<Utc>) -> Result<Vec<crate::record::RibRecord>> {
        let url = collector::url_for(rc, ts, FileKind::Rib)?;
        let ext = crate::download::file_extension_for(&url);
        let path = self.downloader.fetch_to_tempfile(&url, ext)?;
        decoder::decode_rib(&self.config.decoder_bin, &path)
    }

    fn fetch_updates(&self, rc: &str, ts: DateTime<Utc>) -> Result<Vec<crate::record::UpdateRecord>> {
        let url = collector::url_for(rc, ts, FileKind::Update)?;
        let ext = crate::download::file_extension_for(&url);
        let path = self.downloader.fetch_to_tempfile(&url, ext)?;
        decoder::decode_updates(&self.config.decoder_bin, &path)
    }

    /// Fetch one RIB dump per collector in `rcs` at `ts`, fanned out across a
    /// bounded pool of `FETCH_POOL_SIZE` OS threads, joined before returning
    /// (spec.md §5). Only the download/decode step runs off the main thread;
    /// every result is applied to the (single-threaded) `RibStore` back on
    /// the caller's thread, in the order returned.
    fn fetch_many_ribs(
        &self,
        ts: DateTime<Utc>,
        rcs: &[String],
    ) -> Vec<(String, Result<Vec<crate::record::RibRecord>>)> {
        let mut results = Vec::with_capacity(rcs.len());
        for chunk in rcs.chunks(FETCH_POOL_SIZE) {
            let chunk_results = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|rc| scope.spawn(move || (rc.clone(), self.fetch_rib(rc, ts))))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().expect("rib fetch thread panicked"))
                    .collect::<Vec<_>>()
            });
            results.extend(chunk_results);
        }
        results
    }

    /// Same pooling as [`Self::fetch_many_ribs`], for the update stream.
    fn fetch_many_updates(
        &self,
        ts: DateTime<Utc>,
        rcs: &[String],
    ) -> Vec<(String, Result<Vec<crate::record::UpdateRecord>>)> {
        let mut results = Vec::with_capacity(rcs.len());
        for chunk in rcs.chunks(FETCH_POOL_SIZE) {
            let chunk_results = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|rc| scope.spawn(move || (rc.clone(), self.fetch_updates(rc, ts))))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().expect("update fetch thread panicked"))
                    .collect::<Vec<_>>()
            });
            results.extend(chunk_results);
        }
        results
    }

    pub fn run(&self) -> Result<()> {
        let (mut store, _observers) = self.build_observed_store();

        for (rc, result) in self.fetch_many_ribs(self.ts_start, &self.config.collectors) {
            store.build_rc(&rc, result?.into_iter());
        }

        store.dump(self.ts_start, None)?;
        log::info!("Dump observers at {}", self.ts_start);

        let dump_instants: HashSet<DateTime<Utc>> = self.dump_instants().into_iter().collect();

        for ts in self.update_instants() {
            log::info!("Processing updates at timestamp {ts}");
            let active: Vec<String> = self
                .config
                .collectors
                .iter()
                .filter(|rc| !*store.stop_updating.get(rc.as_str()).unwrap_or(&false))
                .cloned()
                .collect();

            for (rc, result) in self.fetch_many_updates(ts, &active) {
                match result {
                    Ok(records) => store.update_rc(&rc, records.into_iter()),
                    Err(e) => log::warn!("skipping update fetch for {rc} at {ts}: {e}"),
                }
            }

            if dump_instants.contains(&ts) {
                store.dump(ts, None)?;
                log::info!("Dump observers at {ts}");
            }

            if self.config.collectors.iter().all(|rc| *store.stop_updating.get(rc).unwrap_or(&false)) {
                break;
            }
        }

        if !self.should_compare {
            return Ok(());
        }

        let mut ground_truth = RibStore::new(self.config.peer_ip_filter(), self.ts_start, self.ts_end);
        let ground_truth_graph: Rc<RefCell<dyn Observer>> = Rc::new(RefCell::new(GraphObserver::new("graph", &self.config.output_dir)));
        ground_truth.attach_observer(ground_truth_graph);

        for (rc, result) in self.fetch_many_ribs(self.ts_end, &self.config.collectors) {
            ground_truth.build_rc(&rc, result?.into_iter());
        }

        store.compare(&ground_truth);
        Ok(())
    }
}
