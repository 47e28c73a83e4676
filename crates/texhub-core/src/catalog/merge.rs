/// Merging candidates into the catalog without holding the write lock
/// across expensive work.
///
/// A merge runs in three steps:
/// 1. **Plan** under a read lock: insert, recompute, or refresh location only.
/// 2. **Compute** with no lock held: content hash and colour features, only
///    when the plan needs them.
/// 3. **Commit** under a write lock.
use super::SharedCatalog;
use crate::features::FeatureExtractor;
use crate::hashing::{self, HashCache};
use crate::model::{Candidate, ColorFeatures};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// What a merge needs to do for one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePlan {
    /// No record for this key yet.
    Insert,
    /// Record exists but its file changed since the features were computed.
    Recompute,
    /// Record exists and is current; only the location may have moved.
    Refresh,
}

/// Results of the expensive step.
#[derive(Clone, Debug, Default)]
pub struct MergeWork {
    pub hash: Option<String>,
    /// `None` when extraction failed or was not needed.
    pub features: Option<ColorFeatures>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Location did not resolve to a file; nothing changed.
    Skipped,
    /// Existing record, unchanged file.
    Unchanged,
    Inserted,
    Updated,
}

impl MergeOutcome {
    /// Whether the candidate counts as re-observed for survivorship.
    pub fn is_observed(self) -> bool {
        self != MergeOutcome::Skipped
    }
}

/// The hash cache and extractor a merge computes with.
#[derive(Clone, Copy)]
pub struct Indexer<'a> {
    hashes: &'a Mutex<HashCache>,
    extractor: &'a dyn FeatureExtractor,
}

impl<'a> Indexer<'a> {
    pub fn new(hashes: &'a Mutex<HashCache>, extractor: &'a dyn FeatureExtractor) -> Self {
        Self { hashes, extractor }
    }

    /// Current modification stamp of the candidate's file, or `None` if the
    /// location no longer resolves.
    pub fn stamp(&self, candidate: &Candidate) -> Option<DateTime<Utc>> {
        let stamp = hashing::file_stamp(&candidate.location);
        if stamp.is_none() {
            debug!(
                "Skipping {} ({}): file not found",
                candidate.identity,
                candidate.location.display()
            );
        }
        stamp
    }

    /// Hash and analyse the candidate if `plan` calls for it.
    pub fn compute(&self, candidate: &Candidate, plan: MergePlan) -> MergeWork {
        if plan == MergePlan::Refresh {
            return MergeWork::default();
        }

        let hash = hashing::digest_shared(self.hashes, &candidate.location);
        let features = match self.extractor.extract(&candidate.location, candidate.category) {
            Ok(features) => Some(features),
            Err(err) => {
                warn!("Colour analysis failed for {}: {err}", candidate.identity);
                None
            }
        };
        MergeWork { hash, features }
    }

    /// Merge `candidate` into a shared catalog.
    ///
    /// Neither lock is held while hashing or extracting. Between plan and
    /// commit another writer may touch the same key; the commit re-checks
    /// the table and the later write wins.
    pub fn merge(&self, catalog: &SharedCatalog, candidate: Candidate) -> MergeOutcome {
        let Some(stamp) = self.stamp(&candidate) else {
            return MergeOutcome::Skipped;
        };
        let plan = catalog.read().plan_merge(&candidate, stamp);
        let work = self.compute(&candidate, plan);
        catalog.write().commit_merge(candidate, stamp, plan, work)
    }
}
