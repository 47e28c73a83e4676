/// Scan orchestrator: drives full and incremental scans into the catalog.
///
/// Full scans run as a [`FullScan`] state machine on one logical thread:
/// either a background thread named `texhub-scanner` (see
/// [`Orchestrator::start_full_scan`]) or the caller's own thread
/// ([`Orchestrator::run_full_scan`]). Only one full scan runs at a time.
///
/// The incremental path, [`Orchestrator::scan_specific_materials`], is not
/// excluded by a running full scan. Both may merge into the catalog
/// interleaved; the later write to a record wins.
pub mod full_scan;
pub mod progress;

pub use full_scan::{FullScan, ScanContext, Step};
pub use progress::{ScanPhase, ScanProgress, ScanState, ScanStatus, ScanSummary};

use crate::catalog::{self, CatalogStore, Indexer, MergeOutcome, SharedCatalog};
use crate::config::TexHubConfig;
use crate::error::ScanError;
use crate::features::{FeatureExtractor, PooledExtractor};
use crate::hashing::HashCache;
use crate::host::{AssetHost, FsHost};
use crate::scanner::{self, MaterialScanner};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Maximum number of progress messages that may queue up in the channel.
///
/// A scan yields at least once per material, so large projects produce
/// many updates. If the receiver falls behind, the scanner blocks briefly
/// rather than consuming unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// How a full scan ended.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    Cancelled(ScanSummary),
    Failed(String),
}

/// Handle to a running or completed background scan. Allows cancellation
/// and receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle for the scan thread.
    thread: Option<thread::JoinHandle<ScanOutcome>>,
}

impl ScanHandle {
    /// Request the scan to stop at its next yield point.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Block until the scan thread exits.
    ///
    /// Progress messages still queued stay readable on `progress_rx`.
    pub fn wait(mut self) -> ScanOutcome {
        match self.thread.take().map(|t| t.join()) {
            Some(Ok(outcome)) => outcome,
            Some(Err(payload)) => ScanOutcome::Failed(panic_message(payload.as_ref())),
            None => ScanOutcome::Failed("scan thread already joined".into()),
        }
    }
}

/// Owns the scan pipeline for one project.
#[derive(Clone)]
pub struct Orchestrator {
    host: Arc<dyn AssetHost>,
    catalog: SharedCatalog,
    extractor: Arc<dyn FeatureExtractor>,
    hashes: Arc<Mutex<HashCache>>,
    scanners: Arc<Vec<Box<dyn MaterialScanner>>>,
    hub_dir: PathBuf,
    frame_budget: Duration,
    status: Arc<ScanStatus>,
}

impl Orchestrator {
    /// Assemble an orchestrator from explicit parts with the built-in
    /// scanner set. `hub_dir` holds the per-category folders.
    pub fn new(
        host: Arc<dyn AssetHost>,
        catalog: SharedCatalog,
        extractor: Arc<dyn FeatureExtractor>,
        hub_dir: impl Into<PathBuf>,
        frame_budget: Duration,
    ) -> Self {
        Self {
            host,
            catalog,
            extractor,
            hashes: Arc::new(Mutex::new(HashCache::new())),
            scanners: Arc::new(scanner::default_scanners()),
            hub_dir: hub_dir.into(),
            frame_budget,
            status: Arc::new(ScanStatus::default()),
        }
    }

    /// Open the project at `root`: filesystem host, catalog loaded or
    /// created at the configured path, pooled extractor.
    pub fn open(root: &Path, config: &TexHubConfig) -> Result<Self, ScanError> {
        let host: Arc<dyn AssetHost> = Arc::new(FsHost::new(root, config));
        let store =
            CatalogStore::open_or_create(config.catalog_path(root), config.scan.spread_metric)?;
        let extractor = Arc::new(PooledExtractor::new(Arc::clone(&host), &config.scan)?);
        Ok(Self::new(
            host,
            catalog::shared(store),
            extractor,
            root.join(&config.paths.hub_dir),
            config.scan.frame_budget(),
        ))
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn host(&self) -> &Arc<dyn AssetHost> {
        &self.host
    }

    pub fn hub_dir(&self) -> &Path {
        &self.hub_dir
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Progress of the current (or last) full scan in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.status.progress()
    }

    pub fn state(&self) -> ScanState {
        self.status.state()
    }

    pub fn last_finished(&self) -> Option<ScanState> {
        self.status.last_finished()
    }

    /// Start a full scan on a background thread.
    ///
    /// Returns [`ScanError::AlreadyRunning`] without side effects when a
    /// full scan is in progress.
    pub fn start_full_scan(&self, force_rebuild: bool) -> Result<ScanHandle, ScanError> {
        let guard = ScanStatus::try_begin(&self.status).ok_or(ScanError::AlreadyRunning)?;

        let (progress_tx, progress_rx) =
            crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let cancel_clone = Arc::clone(&cancel_flag);
        let this = self.clone();

        let thread = thread::Builder::new()
            .name("texhub-scanner".into())
            .spawn(move || {
                let mut guard = guard;
                this.drive(&mut guard, force_rebuild, &cancel_clone, &mut |p| {
                    let _ = progress_tx.send(p);
                })
            })
            .map_err(ScanError::Spawn)?;

        Ok(ScanHandle {
            progress_rx,
            cancel_flag,
            thread: Some(thread),
        })
    }

    /// Run a full scan on the calling thread.
    ///
    /// `cancel` is checked at every yield point; `on_progress` sees every
    /// message a [`ScanHandle`] would receive.
    pub fn run_full_scan(
        &self,
        force_rebuild: bool,
        cancel: &AtomicBool,
        mut on_progress: impl FnMut(&ScanProgress),
    ) -> Result<ScanOutcome, ScanError> {
        let mut guard = ScanStatus::try_begin(&self.status).ok_or(ScanError::AlreadyRunning)?;
        Ok(self.drive(&mut guard, force_rebuild, cancel, &mut |p| on_progress(&p)))
    }

    fn drive(
        &self,
        guard: &mut progress::RunningGuard,
        force_rebuild: bool,
        cancel: &AtomicBool,
        report: &mut dyn FnMut(ScanProgress),
    ) -> ScanOutcome {
        let started = Instant::now();
        info!(
            "Starting full scan{}",
            if force_rebuild { " (force rebuild)" } else { "" }
        );

        let indexer = Indexer::new(&self.hashes, self.extractor.as_ref());
        let ctx = ScanContext {
            host: self.host.as_ref(),
            catalog: &self.catalog,
            hashes: &self.hashes,
            indexer,
            scanners: &self.scanners,
            hub_dir: self.hub_dir.clone(),
            frame_budget: self.frame_budget,
        };
        let mut scan = FullScan::new(ctx, force_rebuild);

        let outcome = loop {
            if cancel.load(Ordering::Relaxed) {
                break ScanOutcome::Cancelled(scan.summary().clone());
            }
            match panic::catch_unwind(AssertUnwindSafe(|| scan.step())) {
                Ok(Ok(Step::Yield(fraction))) => {
                    self.status.set_progress(fraction);
                    report(ScanProgress::Update {
                        fraction,
                        phase: scan.phase(),
                    });
                }
                Ok(Ok(Step::Done(summary))) => break ScanOutcome::Completed(summary),
                Ok(Err(err)) => break ScanOutcome::Failed(err.to_string()),
                Err(payload) => {
                    break ScanOutcome::Failed(
                        ScanError::Panicked(panic_message(payload.as_ref())).to_string(),
                    )
                }
            }
        };

        let duration = started.elapsed();
        match &outcome {
            ScanOutcome::Completed(summary) => {
                self.status.set_progress(1.0);
                info!(
                    "Full scan complete in {:.2?}: {} merged ({} new, {} updated), {} skipped, {} pruned",
                    duration,
                    summary.merged(),
                    summary.inserted,
                    summary.updated,
                    summary.skipped,
                    summary.pruned
                );
                guard.finish(ScanState::Completed);
                report(ScanProgress::Complete {
                    duration,
                    summary: summary.clone(),
                });
            }
            ScanOutcome::Cancelled(summary) => {
                info!(
                    "Full scan cancelled after {:.2?}; {} merged, nothing pruned",
                    duration,
                    summary.merged()
                );
                guard.finish(ScanState::Cancelled);
                report(ScanProgress::Cancelled {
                    summary: summary.clone(),
                });
            }
            ScanOutcome::Failed(message) => {
                error!("Full scan failed after {:.2?}: {message}", duration);
                guard.finish(ScanState::Failed);
                report(ScanProgress::Failed {
                    message: message.clone(),
                });
            }
        }
        outcome
    }

    /// Incremental scan of the given materials.
    ///
    /// Runs only the material scanners, merges, and persists. Never prunes:
    /// a partial input cannot decide deletions.
    pub fn scan_specific_materials(&self, paths: &[PathBuf]) -> Result<ScanSummary, ScanError> {
        // An import may have added or moved the textures these materials use.
        self.host.refresh();
        let indexer = Indexer::new(&self.hashes, self.extractor.as_ref());
        let mut summary = ScanSummary::default();

        for path in paths {
            let Some(material) = self.host.load_material(path) else {
                warn!("Skipping unreadable material {}", path.display());
                continue;
            };
            summary.materials += 1;
            for candidate in scanner::scan_material(&self.scanners, &material, self.host.as_ref()) {
                match indexer.merge(&self.catalog, candidate) {
                    MergeOutcome::Skipped => summary.skipped += 1,
                    MergeOutcome::Unchanged => summary.unchanged += 1,
                    MergeOutcome::Inserted => summary.inserted += 1,
                    MergeOutcome::Updated => summary.updated += 1,
                }
            }
        }

        self.catalog.write().persist()?;
        info!(
            "Incremental scan of {} materials: {} merged ({} new)",
            summary.materials,
            summary.merged(),
            summary.inserted
        );
        Ok(summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
