/// Catalog records and the scan candidates they are built from.
use super::category::Category;
use super::color::{Hsv, Rgb};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stable asset identifier, independent of the file's current location.
///
/// Usually the 32-hex-digit guid from the asset's `.meta` sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub CompactString);

impl AssetId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(CompactString::new(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Uniqueness key of the catalog: one record per (identity, category).
///
/// The same texture may legitimately appear once per category, e.g. as both
/// a tiled colour map and a mask.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub identity: AssetId,
    pub category: Category,
}

impl RecordKey {
    pub fn new(identity: AssetId, category: Category) -> Self {
        Self { identity, category }
    }
}

/// An asset observed by a scanner but not yet merged into the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub identity: AssetId,
    pub location: PathBuf,
    pub category: Category,
}

impl Candidate {
    pub fn new(identity: AssetId, location: PathBuf, category: Category) -> Self {
        Self {
            identity,
            location,
            category,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.identity.clone(), self.category)
    }
}

/// Output of colour analysis for one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorFeatures {
    /// Hue/saturation/value of the (optionally masked) mean colour.
    pub signature: Hsv,
    /// Mean distance between grid samples and the mean colour.
    pub spread: f32,
    /// Grid cell samples that survived masking, row-major.
    pub samples: Vec<Rgb>,
}

/// One entry of the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub identity: AssetId,
    /// Current resolvable path. Refreshed on every merge so moves are tracked.
    pub location: PathBuf,
    pub category: Category,
    /// Lowercase hex content digest. `None` when the file could not be read.
    #[serde(default)]
    pub content_hash: Option<String>,
    /// `None` until an analysis succeeds.
    #[serde(default)]
    pub color_signature: Option<Hsv>,
    #[serde(default)]
    pub color_spread: f32,
    #[serde(default)]
    pub color_samples: Vec<Rgb>,
    /// Modification time of the backing file when features were last computed.
    /// `None` forces recomputation on the next merge.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl AssetRecord {
    /// Create a record with zeroed colour fields.
    pub fn new(candidate: Candidate) -> Self {
        Self {
            identity: candidate.identity,
            location: candidate.location,
            category: candidate.category,
            content_hash: None,
            color_signature: None,
            color_spread: 0.0,
            color_samples: Vec::new(),
            last_modified: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.identity.clone(), self.category)
    }

    /// Overwrite the colour fields with a fresh analysis.
    pub fn apply_features(&mut self, features: ColorFeatures) {
        self.color_signature = Some(features.signature);
        self.color_spread = features.spread;
        self.color_samples = features.samples;
    }

    /// The file name portion of `location`, for display.
    pub fn file_name(&self) -> String {
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
