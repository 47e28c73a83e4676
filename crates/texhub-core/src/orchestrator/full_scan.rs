/// A full scan as a resumable state machine.
///
/// Each [`FullScan::step`] call does a bounded slice of work and returns
/// either [`Step::Yield`] with the progress so far or [`Step::Done`]. The
/// driver checks for cancellation between steps, so a scan stops only at
/// these yield points.
///
/// Stages, in order:
///
/// ```text
/// Init → Folders (one per category) → Discover → Materials (one per step) → Finalize
/// ```
///
/// A step ends after one material at the latest, or earlier once the frame
/// budget is spent. Candidates still waiting to be merged carry over to the
/// next step.
use super::progress::{ScanPhase, ScanSummary};
use crate::catalog::{Indexer, MergeOutcome, SharedCatalog};
use crate::error::ScanError;
use crate::hashing::HashCache;
use crate::host::AssetHost;
use crate::model::{Candidate, Category, RecordKey};
use crate::scanner::{self, MaterialScanner};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one [`FullScan::step`].
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Yield(f32),
    Done(ScanSummary),
}

#[derive(Debug)]
enum Stage {
    Init,
    /// `next` is the index into [`Category::ALL`] of the next folder to list;
    /// `batch` is the size of the folder being merged.
    Folders { next: usize, batch: usize },
    Discover,
    Materials {
        queue: VecDeque<PathBuf>,
        total: usize,
        taken: usize,
    },
    Finalize,
    Done,
}

/// Everything a full scan reads or mutates.
pub struct ScanContext<'a> {
    pub host: &'a dyn AssetHost,
    pub catalog: &'a SharedCatalog,
    pub hashes: &'a Mutex<HashCache>,
    pub indexer: Indexer<'a>,
    pub scanners: &'a [Box<dyn MaterialScanner>],
    pub hub_dir: PathBuf,
    pub frame_budget: Duration,
}

pub struct FullScan<'a> {
    ctx: ScanContext<'a>,
    force_rebuild: bool,
    stage: Stage,
    pending: VecDeque<Candidate>,
    observed: HashSet<RecordKey>,
    summary: ScanSummary,
    progress: f32,
}

impl<'a> FullScan<'a> {
    pub fn new(ctx: ScanContext<'a>, force_rebuild: bool) -> Self {
        Self {
            ctx,
            force_rebuild,
            stage: Stage::Init,
            pending: VecDeque::new(),
            observed: HashSet::new(),
            summary: ScanSummary::default(),
            progress: 0.0,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        match self.stage {
            Stage::Init => ScanPhase::Preparing,
            Stage::Folders { .. } => ScanPhase::Folders,
            Stage::Discover | Stage::Materials { .. } => ScanPhase::Materials,
            Stage::Finalize | Stage::Done => ScanPhase::Finalizing,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Counters so far. Final once `step` has returned `Done`.
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    /// Run one slice of work.
    pub fn step(&mut self) -> Result<Step, ScanError> {
        let started = Instant::now();

        if !self.pending.is_empty() {
            self.drain(started);
            return Ok(self.yield_progress());
        }

        match &mut self.stage {
            Stage::Init => {
                self.init()?;
                self.stage = Stage::Folders { next: 0, batch: 0 };
            }

            Stage::Folders { next, batch } => {
                if *next == Category::ALL.len() {
                    self.stage = Stage::Discover;
                } else {
                    let category = Category::ALL[*next];
                    *next += 1;
                    let found = scanner::scan_folder(self.ctx.host, &self.ctx.hub_dir, category)?;
                    debug!("{} candidates in the {category} folder", found.len());
                    *batch = found.len();
                    self.pending.extend(found);
                    self.drain(started);
                }
            }

            Stage::Discover => {
                let materials = self.ctx.host.materials()?;
                info!("Found {} materials", materials.len());
                self.stage = Stage::Materials {
                    total: materials.len(),
                    taken: 0,
                    queue: materials.into(),
                };
            }

            Stage::Materials { queue, taken, .. } => match queue.pop_front() {
                Some(path) => {
                    *taken += 1;
                    match self.ctx.host.load_material(&path) {
                        Some(material) => {
                            self.summary.materials += 1;
                            let found =
                                scanner::scan_material(self.ctx.scanners, &material, self.ctx.host);
                            self.pending.extend(found);
                            self.drain(started);
                        }
                        None => warn!("Skipping unreadable material {}", path.display()),
                    }
                }
                None => self.stage = Stage::Finalize,
            },

            Stage::Finalize => {
                let pruned = self.ctx.catalog.write().prune_survivors(&self.observed);
                self.summary.pruned = pruned;
                self.ctx.catalog.write().persist()?;
                self.stage = Stage::Done;
                self.progress = 1.0;
                return Ok(Step::Done(self.summary.clone()));
            }

            Stage::Done => return Ok(Step::Done(self.summary.clone())),
        }

        Ok(self.yield_progress())
    }

    fn init(&mut self) -> Result<(), ScanError> {
        if self.force_rebuild {
            info!("Force rebuild: clearing catalog");
            let mut catalog = self.ctx.catalog.write();
            catalog.clear();
            catalog.persist()?;
        }
        self.ctx.hashes.lock().clear();
        self.ctx.host.refresh();
        Ok(())
    }

    /// Merge pending candidates until none are left or the budget is spent.
    /// Always merges at least one.
    fn drain(&mut self, started: Instant) {
        while let Some(candidate) = self.pending.pop_front() {
            let key = candidate.key();
            let outcome = self.ctx.indexer.merge(self.ctx.catalog, candidate);
            match outcome {
                MergeOutcome::Skipped => self.summary.skipped += 1,
                MergeOutcome::Unchanged => self.summary.unchanged += 1,
                MergeOutcome::Inserted => self.summary.inserted += 1,
                MergeOutcome::Updated => self.summary.updated += 1,
            }
            if outcome.is_observed() {
                self.observed.insert(key);
            }
            if started.elapsed() >= self.ctx.frame_budget {
                break;
            }
        }
    }

    fn yield_progress(&mut self) -> Step {
        self.progress = self.progress.max(self.estimate());
        Step::Yield(self.progress)
    }

    /// 0.05 after setup, folders up to 0.1, materials fill the rest.
    fn estimate(&self) -> f32 {
        match &self.stage {
            Stage::Init => 0.0,
            Stage::Folders { next: 0, .. } => 0.05,
            Stage::Folders { next, batch } => {
                let within = if *batch == 0 {
                    1.0
                } else {
                    (*batch - self.pending.len()) as f32 / *batch as f32
                };
                let folders = (*next - 1) as f32 + within;
                0.05 + 0.05 * folders / Category::ALL.len() as f32
            }
            Stage::Discover => 0.1,
            Stage::Materials { total: 0, .. } => 1.0,
            Stage::Materials { total, taken, .. } => {
                let done = if self.pending.is_empty() {
                    *taken
                } else {
                    taken.saturating_sub(1)
                };
                0.1 + 0.9 * done as f32 / *total as f32
            }
            Stage::Finalize | Stage::Done => 1.0,
        }
    }
}
