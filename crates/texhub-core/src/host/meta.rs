/// `.meta` sidecar files carrying asset identities.
///
/// A sidecar sits next to its asset (`foo.png` → `foo.png.meta`) and holds
/// YAML-ish `key: value` lines. Only the `guid:` line is read.
use crate::model::AssetId;
use std::path::{Path, PathBuf};

/// Extension appended to an asset path to locate its sidecar.
pub const META_EXTENSION: &str = "meta";

/// Path of the sidecar for `asset`.
pub fn meta_path(asset: &Path) -> PathBuf {
    let mut os = asset.as_os_str().to_owned();
    os.push(".");
    os.push(META_EXTENSION);
    PathBuf::from(os)
}

/// Read the guid from `asset`'s sidecar, if there is one.
pub fn read_guid(asset: &Path) -> Option<AssetId> {
    let content = std::fs::read_to_string(meta_path(asset)).ok()?;
    parse_guid(&content)
}

/// Extract the value of the first `guid:` line.
pub fn parse_guid(content: &str) -> Option<AssetId> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("guid:")?.trim();
        (!value.is_empty()).then(|| AssetId::new(value))
    })
}

/// Generate a fresh random identity in the 32-hex-digit form.
pub fn new_guid() -> AssetId {
    AssetId::new(uuid::Uuid::new_v4().simple().to_string())
}

/// Write a minimal sidecar for `asset` declaring `guid`.
pub fn write_meta(asset: &Path, guid: &AssetId) -> std::io::Result<()> {
    std::fs::write(
        meta_path(asset),
        format!("fileFormatVersion: 2\nguid: {guid}\n"),
    )
}

/// Identity used when an asset has no sidecar: derived from its
/// project-relative path, so it is only stable while the file stays put.
pub fn path_identity(relative: &Path) -> AssetId {
    let normalised = relative.to_string_lossy().replace('\\', "/");
    let hash = blake3::hash(normalised.as_bytes()).to_hex();
    AssetId::new(format!("path-{}", &hash.as_str()[..32]))
}
