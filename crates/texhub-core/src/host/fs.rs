/// Project host over a directory tree on disk.
///
/// Layout:
///
/// ```text
/// <root>/
///   texhub.toml              optional config
///   Assets/                  everything scanned lives here
///     Textures/a.png
///     Textures/a.png.meta    guid sidecar (identity)
///     Materials/body.mat     JSON property bag
///   Library/TexHub/catalog.json
/// ```
///
/// Directory walks use `jwalk`, sorted so results are deterministic.
use super::{meta, AssetHost, AssetRef};
use crate::config::TexHubConfig;
use crate::error::{FeatureError, HostError};
use crate::features::PixelBuffer;
use crate::model::AssetId;
use crate::scanner::Material;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// File extensions treated as image assets (lowercase).
pub const TEXTURE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tga", "bmp", "gif", "tif", "tiff", "webp", "exr", "hdr", "psd",
];

/// File extension of material assets.
pub const MATERIAL_EXTENSION: &str = "mat";

/// `true` if `path` has one of the [`TEXTURE_EXTENSIONS`].
pub fn is_texture_path(path: &Path) -> bool {
    has_extension(path, TEXTURE_EXTENSIONS)
}

/// `true` if `path` ends in `.mat`.
pub fn is_material_path(path: &Path) -> bool {
    has_extension(path, &[MATERIAL_EXTENSION])
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Filesystem-backed [`AssetHost`].
pub struct FsHost {
    root: PathBuf,
    assets_dir: PathBuf,
    preview_size: u32,
    /// guid → current path. Built lazily at most once between two
    /// `refresh()` calls; misses inside that window stay misses.
    index: RwLock<Option<HashMap<AssetId, PathBuf>>>,
    index_builds: AtomicUsize,
}

impl FsHost {
    pub fn new(root: impl Into<PathBuf>, config: &TexHubConfig) -> Self {
        let root = root.into();
        let assets_dir = root.join(&config.paths.assets_dir);
        Self {
            root,
            assets_dir,
            preview_size: config.scan.preview_size,
            index: RwLock::new(None),
            index_builds: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// How many times the identity index has been walked.
    pub fn index_builds(&self) -> usize {
        self.index_builds.load(Ordering::Relaxed)
    }

    /// Identity of the asset at `path`: its sidecar guid, or a path-derived
    /// fallback when it has none.
    pub fn identity_of(&self, path: &Path) -> AssetId {
        meta::read_guid(path).unwrap_or_else(|| {
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            meta::path_identity(relative)
        })
    }

    fn absolute(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        }
    }

    /// Recursively collect files under `dir` accepted by `keep`.
    ///
    /// Unreadable subdirectories are logged and skipped; only a failure to
    /// read `dir` itself is an error.
    fn walk(&self, dir: &Path, keep: fn(&Path) -> bool) -> Result<Vec<PathBuf>, HostError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let walker = jwalk::WalkDir::new(dir)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()));

        let mut found = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(HostError::Walk {
                            path: dir.to_path_buf(),
                            message: err.to_string(),
                        });
                    }
                    warn!("Skipping unreadable entry under {}: {err}", dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if keep(&path) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    fn build_index(&self) -> HashMap<AssetId, PathBuf> {
        let textures = match self.walk(&self.assets_dir, is_texture_path) {
            Ok(t) => t,
            Err(err) => {
                warn!("Failed to index textures: {err}");
                return HashMap::new();
            }
        };

        let mut index = HashMap::with_capacity(textures.len());
        for path in textures {
            let id = self.identity_of(&path);
            if let Some(previous) = index.insert(id.clone(), path) {
                debug!(
                    "Identity {id} claimed by more than one file; dropping {}",
                    previous.display()
                );
            }
        }
        self.index_builds.fetch_add(1, Ordering::Relaxed);
        debug!("Indexed {} texture identities", index.len());
        index
    }

}

impl AssetHost for FsHost {
    fn textures_under(&self, dir: &Path) -> Result<Vec<AssetRef>, HostError> {
        let dir = self.absolute(dir);
        Ok(self
            .walk(&dir, is_texture_path)?
            .into_iter()
            .map(|location| AssetRef {
                identity: self.identity_of(&location),
                location,
            })
            .collect())
    }

    fn materials(&self) -> Result<Vec<PathBuf>, HostError> {
        self.walk(&self.assets_dir, is_material_path)
    }

    fn load_material(&self, path: &Path) -> Option<Material> {
        let path = self.absolute(path);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) => {
                debug!("Material {} unavailable: {err}", path.display());
                return None;
            }
        };
        match Material::from_json(&content) {
            Ok(material) => Some(material),
            Err(err) => {
                warn!("Material {} is not valid: {err}", path.display());
                None
            }
        }
    }

    fn resolve(&self, identity: &AssetId) -> Option<PathBuf> {
        let cached = self
            .index
            .read()
            .as_ref()
            .map(|index| index.get(identity).cloned());
        let found = match cached {
            Some(hit) => hit,
            None => {
                let mut slot = self.index.write();
                // Another caller may have built it while we waited.
                slot.get_or_insert_with(|| self.build_index())
                    .get(identity)
                    .cloned()
            }
        };
        found.filter(|path| path.exists())
    }

    fn refresh(&self) {
        *self.index.write() = None;
    }

    fn acquire_pixels(&self, location: &Path) -> Result<PixelBuffer, FeatureError> {
        let location = self.absolute(location);
        let mut img = image::open(&location).map_err(|source| FeatureError::Decode {
            path: location.clone(),
            source,
        })?;

        if img.width() > self.preview_size || img.height() > self.preview_size {
            img = img.thumbnail(self.preview_size, self.preview_size);
        }

        let is_float = matches!(
            img.color(),
            image::ColorType::Rgb32F | image::ColorType::Rgba32F
        );
        let (width, height) = (img.width(), img.height());
        Ok(if is_float {
            PixelBuffer::rgba_f32(width, height, img.to_rgba32f().into_raw())
        } else {
            PixelBuffer::rgba8(width, height, img.to_rgba8().into_raw())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
            .save(path)
            .unwrap();
    }

    fn host(tmp: &TempDir) -> FsHost {
        FsHost::new(tmp.path(), &TexHubConfig::default())
    }

    #[test]
    fn test_extension_checks() {
        assert!(is_texture_path(Path::new("a/B.PNG")));
        assert!(is_texture_path(Path::new("a/b.tga")));
        assert!(!is_texture_path(Path::new("a/b.png.meta")));
        assert!(is_material_path(Path::new("x/Body.mat")));
        assert!(!is_material_path(Path::new("x/Body.material")));
    }

    #[test]
    fn test_missing_folder_is_empty_and_not_created() {
        let tmp = TempDir::new().unwrap();
        let host = host(&tmp);
        let dir = tmp.path().join("Assets/TexHub/MatCap");
        assert!(host.textures_under(&dir).unwrap().is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_textures_under_is_recursive_and_uses_sidecars() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Assets/Tex");
        write_png(&dir.join("a.png"), 2, 2, [255, 0, 0, 255]);
        write_png(&dir.join("nested/b.png"), 2, 2, [0, 255, 0, 255]);
        fs::write(dir.join("notes.txt"), "hi").unwrap();
        let guid = AssetId::new("aaaabbbbccccddddeeeeffff00001111");
        meta::write_meta(&dir.join("a.png"), &guid).unwrap();

        let found = host(&tmp).textures_under(&dir).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].identity, guid);
        assert!(found[1].identity.as_str().starts_with("path-"));
    }

    #[test]
    fn test_resolve_follows_moves() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("Assets/a.png");
        write_png(&old, 2, 2, [0, 0, 255, 255]);
        let guid = AssetId::new("0000111122223333444455556666aaaa");
        meta::write_meta(&old, &guid).unwrap();

        let host = host(&tmp);
        assert_eq!(host.resolve(&guid), Some(old.clone()));

        let new = tmp.path().join("Assets/moved/a.png");
        fs::create_dir_all(new.parent().unwrap()).unwrap();
        fs::rename(&old, &new).unwrap();
        fs::rename(meta::meta_path(&old), meta::meta_path(&new)).unwrap();

        // The index is only rewalked after a refresh.
        assert_eq!(host.resolve(&guid), None);
        host.refresh();
        assert_eq!(host.resolve(&guid), Some(new));
        assert_eq!(host.resolve(&AssetId::new("missing")), None);
    }

    #[test]
    fn test_misses_walk_the_tree_once_per_refresh() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("Assets/a.png"), 2, 2, [0, 0, 0, 255]);
        let host = host(&tmp);

        assert_eq!(host.resolve(&AssetId::new("builtin-default")), None);
        assert_eq!(host.resolve(&AssetId::new("deleted-texture")), None);
        assert_eq!(host.resolve(&AssetId::new("builtin-default")), None);
        assert_eq!(host.index_builds(), 1);

        host.refresh();
        assert_eq!(host.resolve(&AssetId::new("deleted-texture")), None);
        assert_eq!(host.index_builds(), 2);
    }

    #[test]
    fn test_acquire_pixels_downsamples_to_preview() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Assets/big.png");
        write_png(&path, 512, 256, [10, 20, 30, 255]);

        let buf = host(&tmp).acquire_pixels(&path).unwrap();
        assert_eq!(buf.width, 128);
        assert_eq!(buf.height, 64);
    }

    #[test]
    fn test_acquire_pixels_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Assets/broken.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(
            host(&tmp).acquire_pixels(&path),
            Err(FeatureError::Decode { .. })
        ));
    }
}
