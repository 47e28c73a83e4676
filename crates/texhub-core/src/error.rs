/// Error types for the TexHub core.
///
/// Only failures that stop an operation are errors. Per-asset problems met
/// while scanning (a texture that vanished, an image that will not decode)
/// are logged and skipped by the caller instead of being propagated.
use std::path::PathBuf;

/// Problems loading or validating `texhub.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Failures enumerating the project tree.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Failures turning an image file into colour features.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("analysis worker pool unavailable: {0}")]
    Pool(String),
}

/// Failures loading or writing the durable catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialise catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unsupported catalog format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Failures copying assets into category folders or the library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("{0} is already in the library")]
    AlreadyInLibrary(PathBuf),

    #[error("{0} does not exist")]
    Missing(PathBuf),

    #[error("copy to {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal failures of a scan. Aggregates subsystem errors via `From`.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("a full scan is already running")]
    AlreadyRunning,

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("feature extraction unavailable: {0}")]
    Feature(#[from] FeatureError),

    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("scan panicked: {0}")]
    Panicked(String),
}
