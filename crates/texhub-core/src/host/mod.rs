/// The project host: everything the scan needs from the environment the
/// assets live in.
///
/// The catalog never touches the project layout directly. It asks an
/// [`AssetHost`] to enumerate textures and materials, resolve identities to
/// paths, and decode pixels. [`FsHost`] implements this over a project tree
/// on disk; tests substitute their own hosts.
pub mod fs;
pub mod meta;

pub use fs::FsHost;

use crate::error::{FeatureError, HostError};
use crate::features::PixelBuffer;
use crate::model::AssetId;
use crate::scanner::Material;
use std::path::{Path, PathBuf};

/// A texture asset found by enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRef {
    pub identity: AssetId,
    pub location: PathBuf,
}

/// Access to the managed asset tree.
pub trait AssetHost: Send + Sync {
    /// All image assets under `dir`, recursively. A missing directory yields
    /// an empty list and is never created.
    fn textures_under(&self, dir: &Path) -> Result<Vec<AssetRef>, HostError>;

    /// Every material asset in the project.
    fn materials(&self) -> Result<Vec<PathBuf>, HostError>;

    /// Load a material's property bag. `None` when the file is gone or
    /// cannot be parsed.
    fn load_material(&self, path: &Path) -> Option<Material>;

    /// Current location of the asset with this identity.
    ///
    /// Implementations may cache lookups until the next [`refresh`](Self::refresh).
    fn resolve(&self, identity: &AssetId) -> Option<PathBuf>;

    /// Drop any cached identity index so the next lookup sees the current tree.
    fn refresh(&self) {}

    /// Decode the image at `location` into a preview-sized pixel buffer.
    ///
    /// Only called from the orchestrating thread.
    fn acquire_pixels(&self, location: &Path) -> Result<PixelBuffer, FeatureError>;
}
