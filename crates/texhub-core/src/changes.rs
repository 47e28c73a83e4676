/// Import notifications from the host, turned into incremental scans.
///
/// Only imported materials trigger work. Deleted and moved assets are left
/// to the next full scan: removal happens through survivorship pruning
/// alone, and a moved texture keeps its identity and is re-located on its
/// next merge.
use crate::error::ScanError;
use crate::host::fs::is_material_path;
use crate::orchestrator::{Orchestrator, ScanSummary};
use std::path::PathBuf;
use tracing::debug;

/// One batch of asset changes reported after an import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub imported: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub moved: Vec<PathBuf>,
    pub moved_from: Vec<PathBuf>,
}

impl ImportBatch {
    pub fn imported(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            imported: paths.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Imported paths that are materials.
pub fn material_paths(batch: &ImportBatch) -> Vec<PathBuf> {
    batch
        .imported
        .iter()
        .filter(|p| is_material_path(p))
        .cloned()
        .collect()
}

/// Rescan the materials in `batch`. `Ok(None)` when it has none.
pub fn apply_import_batch(
    orchestrator: &Orchestrator,
    batch: &ImportBatch,
) -> Result<Option<ScanSummary>, ScanError> {
    let materials = material_paths(batch);
    if materials.is_empty() {
        debug!(
            "Import of {} assets touched no materials",
            batch.imported.len()
        );
        return Ok(None);
    }
    orchestrator.scan_specific_materials(&materials).map(Some)
}
