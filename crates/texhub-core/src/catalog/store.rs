/// The in-memory catalog table, its ignore list, and persistence.
use super::merge::{Indexer, MergeOutcome, MergePlan, MergeWork};
use super::storage::{self, CatalogSnapshot, FORMAT_VERSION};
use super::{CatalogEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::CatalogError;
use crate::features::SpreadMetric;
use crate::model::{AssetId, AssetRecord, Candidate, Category, RecordKey};
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One record per (identity, category), plus the persisted ignore list.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    metric: SpreadMetric,
    records: BTreeMap<RecordKey, AssetRecord>,
    ignored: BTreeSet<AssetId>,
    subscribers: Vec<Sender<CatalogEvent>>,
}

impl CatalogStore {
    /// An empty store that will persist to `path`. Nothing is written yet.
    pub fn new(path: impl Into<PathBuf>, metric: SpreadMetric) -> Self {
        Self {
            path: path.into(),
            metric,
            records: BTreeMap::new(),
            ignored: BTreeSet::new(),
            subscribers: Vec::new(),
        }
    }

    /// Load the catalog at `path`, or create and persist an empty one.
    ///
    /// A catalog recorded under a different spread metric keeps its records
    /// but loses their modification stamps, so the next scan recomputes
    /// every colour feature on `metric`.
    pub fn open_or_create(path: impl Into<PathBuf>, metric: SpreadMetric) -> Result<Self, CatalogError> {
        let mut store = Self::new(path, metric);
        let Some(file) = storage::load(&store.path)? else {
            info!("Creating catalog at {}", store.path.display());
            store.persist()?;
            return Ok(store);
        };

        store.ignored = file.ignored;
        store.records = file
            .records
            .into_iter()
            .map(|record| (record.key(), record))
            .collect();

        if file.spread_metric != metric {
            info!(
                "Catalog spread metric is {}, configured {metric}; features will be recomputed",
                file.spread_metric
            );
            for record in store.records.values_mut() {
                record.last_modified = None;
            }
        }

        info!(
            "Loaded catalog {} ({} records, {} ignored)",
            store.path.display(),
            store.records.len(),
            store.ignored.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metric(&self) -> SpreadMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    /// All records in key order.
    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Records of one category, in identity order.
    pub fn records_in(&self, category: Category) -> impl Iterator<Item = &AssetRecord> {
        self.records.values().filter(move |r| r.category == category)
    }

    /// Drop every record. The ignore list is kept.
    pub fn clear(&mut self) {
        debug!("Clearing {} catalog records", self.records.len());
        self.records.clear();
    }

    /// Decide what merging `candidate` requires, given its file's current
    /// modification stamp. Read-only, so callers can hold a shared lock.
    pub fn plan_merge(&self, candidate: &Candidate, stamp: DateTime<Utc>) -> MergePlan {
        match self.records.get(&candidate.key()) {
            None => MergePlan::Insert,
            Some(existing) if existing.last_modified == Some(stamp) => MergePlan::Refresh,
            Some(_) => MergePlan::Recompute,
        }
    }

    /// Apply a planned merge.
    ///
    /// Re-checks the table, so a record that appeared or vanished between
    /// planning and committing is still handled without duplicating keys.
    pub fn commit_merge(
        &mut self,
        candidate: Candidate,
        stamp: DateTime<Utc>,
        plan: MergePlan,
        work: MergeWork,
    ) -> MergeOutcome {
        let key = candidate.key();
        match plan {
            MergePlan::Refresh => match self.records.get_mut(&key) {
                Some(record) => {
                    record.location = candidate.location;
                    MergeOutcome::Unchanged
                }
                None => MergeOutcome::Skipped,
            },
            MergePlan::Insert | MergePlan::Recompute => {
                let existed = self.records.contains_key(&key);
                let record = self
                    .records
                    .entry(key)
                    .or_insert_with(|| AssetRecord::new(candidate.clone()));
                record.location = candidate.location;
                // A failed re-hash keeps the last known digest.
                if let Some(hash) = work.hash {
                    record.content_hash = Some(hash);
                }
                match work.features {
                    Some(features) => {
                        record.apply_features(features);
                        record.last_modified = Some(stamp);
                    }
                    // Colour fields stay as they were; no stamp means the
                    // next merge retries the analysis.
                    None => record.last_modified = None,
                }
                if existed {
                    MergeOutcome::Updated
                } else {
                    MergeOutcome::Inserted
                }
            }
        }
    }

    /// Merge `candidate` with this store exclusively borrowed.
    ///
    /// Skips silently when the candidate's location is not an existing file.
    pub fn merge_or_update(&mut self, candidate: Candidate, indexer: &Indexer<'_>) -> MergeOutcome {
        let Some(stamp) = indexer.stamp(&candidate) else {
            return MergeOutcome::Skipped;
        };
        let plan = self.plan_merge(&candidate, stamp);
        let work = indexer.compute(&candidate, plan);
        self.commit_merge(candidate, stamp, plan, work)
    }

    /// Remove every record whose key is not in `observed`. Returns the
    /// number removed.
    pub fn prune_survivors(&mut self, observed: &HashSet<RecordKey>) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| observed.contains(key));
        let removed = before - self.records.len();
        if removed > 0 {
            info!("Pruned {removed} records not seen in this scan");
        }
        removed
    }

    /// Write the catalog and notify subscribers.
    pub fn persist(&mut self) -> Result<(), CatalogError> {
        let snapshot = CatalogSnapshot {
            format_version: FORMAT_VERSION,
            spread_metric: self.metric,
            records: self.records.values().collect(),
            ignored: &self.ignored,
        };
        storage::save(&self.path, &snapshot)?;
        debug!(
            "Persisted {} records to {}",
            self.records.len(),
            self.path.display()
        );

        self.notify(CatalogEvent::Updated {
            records: self.records.len(),
            ignored: self.ignored.len(),
        });
        Ok(())
    }

    /// Receive an event after every successful [`persist`](Self::persist).
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<CatalogEvent> {
        let (tx, rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self, event: CatalogEvent) {
        // A full queue only drops this event; a dropped receiver unsubscribes.
        self.subscribers.retain(|tx| {
            !matches!(
                tx.try_send(event.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
    }

    // ── Ignore list ─────────────────────────────────────────────

    /// Add `identity` to the ignore list and persist. Returns `false` if it
    /// was already present (nothing is written).
    pub fn add_ignore(&mut self, identity: AssetId) -> Result<bool, CatalogError> {
        if !self.ignored.insert(identity) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Remove `identity` from the ignore list and persist. Returns `false`
    /// if it was not present.
    pub fn remove_ignore(&mut self, identity: &AssetId) -> Result<bool, CatalogError> {
        if !self.ignored.remove(identity) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn is_ignored(&self, identity: &AssetId) -> bool {
        self.ignored.contains(identity)
    }

    pub fn ignored(&self) -> impl Iterator<Item = &AssetId> {
        self.ignored.iter()
    }
}
