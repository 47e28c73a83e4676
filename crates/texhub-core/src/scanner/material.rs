/// Material property bags.
///
/// A material is a named bag of float, integer and texture properties. An
/// absent property means "this feature does not exist in this material
/// variant" and is never an error.
use crate::model::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default texture tiling. Slots at exactly this scale are untiled.
pub const DEFAULT_SCALE: [f32; 2] = [1.0, 1.0];

fn default_scale() -> [f32; 2] {
    DEFAULT_SCALE
}

/// One texture property: the referenced asset plus its placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureSlot {
    /// Referenced texture identity. `None` means the slot is unset.
    #[serde(default)]
    pub guid: Option<AssetId>,
    #[serde(default = "default_scale")]
    pub scale: [f32; 2],
    #[serde(default)]
    pub offset: [f32; 2],
}

impl TextureSlot {
    pub fn new(guid: impl Into<AssetId>, scale: [f32; 2]) -> Self {
        Self {
            guid: Some(guid.into()),
            scale,
            offset: [0.0, 0.0],
        }
    }

    pub fn unset() -> Self {
        Self {
            guid: None,
            scale: DEFAULT_SCALE,
            offset: [0.0, 0.0],
        }
    }

    pub fn is_tiled(&self) -> bool {
        self.scale != DEFAULT_SCALE
    }
}

/// A material's property bag as stored in a `.mat` file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    pub floats: BTreeMap<String, f32>,
    pub ints: BTreeMap<String, i64>,
    pub textures: BTreeMap<String, TextureSlot>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Float value, falling back to an integer property of the same name.
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats
            .get(name)
            .copied()
            .or_else(|| self.ints.get(name).map(|&i| i as f32))
    }

    /// Integer value, falling back to a float property of the same name
    /// (truncated). Engines often store integer properties as floats.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.ints
            .get(name)
            .copied()
            .or_else(|| self.floats.get(name).map(|&f| f as i64))
    }

    /// `true` when the toggle exists and is non-zero.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.float(name).is_some_and(|v| v != 0.0)
    }

    /// The texture slot, if the property exists (set or not).
    pub fn texture_slot(&self, name: &str) -> Option<&TextureSlot> {
        self.textures.get(name)
    }

    // ── Builders (used by tests and tooling) ─────────────────────────────────

    pub fn with_float(mut self, name: &str, value: f32) -> Self {
        self.floats.insert(name.to_string(), value);
        self
    }

    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.ints.insert(name.to_string(), value);
        self
    }

    pub fn with_texture(mut self, name: &str, slot: TextureSlot) -> Self {
        self.textures.insert(name.to_string(), slot);
        self
    }
}
