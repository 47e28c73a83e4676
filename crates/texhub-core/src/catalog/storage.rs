/// On-disk catalog format.
///
/// A single pretty-printed JSON document:
///
/// ```text
/// { "format_version": 1, "spread_metric": "hue", "records": [...], "ignored": [...] }
/// ```
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write never leaves a truncated catalog behind.
use crate::error::CatalogError;
use crate::features::SpreadMetric;
use crate::model::{AssetId, AssetRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

/// Borrowed view written by [`save`].
#[derive(Serialize)]
pub struct CatalogSnapshot<'a> {
    pub format_version: u32,
    pub spread_metric: SpreadMetric,
    pub records: Vec<&'a AssetRecord>,
    pub ignored: &'a BTreeSet<AssetId>,
}

/// Owned document returned by [`load`].
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub format_version: u32,
    #[serde(default)]
    pub spread_metric: SpreadMetric,
    #[serde(default)]
    pub records: Vec<AssetRecord>,
    #[serde(default)]
    pub ignored: BTreeSet<AssetId>,
}

/// Read the catalog at `path`. `Ok(None)` when no file exists yet.
pub fn load(path: &Path) -> Result<Option<CatalogFile>, CatalogError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file: CatalogFile =
        serde_json::from_str(&content).map_err(|source| CatalogError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    if file.format_version != FORMAT_VERSION {
        return Err(CatalogError::Version {
            found: file.format_version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(Some(file))
}

/// Atomically replace the catalog at `path`.
pub fn save(path: &Path, snapshot: &CatalogSnapshot<'_>) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(json.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(io_err)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load(&tmp.path().join("catalog.json")).unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(CatalogError::Corrupt { .. })));
    }

    #[test]
    fn test_future_version_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        fs::write(&path, r#"{ "format_version": 9, "records": [], "ignored": [] }"#).unwrap();
        assert!(matches!(
            load(&path),
            Err(CatalogError::Version { found: 9, expected: 1 })
        ));
    }

    #[test]
    fn test_save_creates_parents_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Library/TexHub/catalog.json");
        let ignored = BTreeSet::from([AssetId::new("abc")]);
        let snapshot = CatalogSnapshot {
            format_version: FORMAT_VERSION,
            spread_metric: SpreadMetric::Rgb,
            records: Vec::new(),
            ignored: &ignored,
        };
        save(&path, &snapshot).unwrap();

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.spread_metric, SpreadMetric::Rgb);
        assert_eq!(loaded.ignored, ignored);
    }
}
