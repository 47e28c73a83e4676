/// Folder scanner: category folders curated by hand.
///
/// Each category owns `<hub_dir>/<Category>`. Everything image-typed below
/// it (recursively) is indexed under that category.
use crate::error::HostError;
use crate::host::AssetHost;
use crate::model::{Candidate, Category};
use std::path::{Path, PathBuf};

/// Folder holding hand-curated textures for `category`.
pub fn category_folder(hub_dir: &Path, category: Category) -> PathBuf {
    hub_dir.join(category.label())
}

/// Candidates for every texture in `category`'s folder.
///
/// A missing folder is a no-op; it is never created here.
pub fn scan_folder(
    host: &dyn AssetHost,
    hub_dir: &Path,
    category: Category,
) -> Result<Vec<Candidate>, HostError> {
    let dir = category_folder(hub_dir, category);
    Ok(host
        .textures_under(&dir)?
        .into_iter()
        .map(|asset| Candidate::new(asset.identity, asset.location, category))
        .collect())
}
