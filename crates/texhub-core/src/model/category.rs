/// The five semantic roles a texture can play in a material.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of texture categories.
///
/// Declaration order is the scan order of the folder phase and the display
/// order of tabs. It carries no meaning for catalog state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Spherical lighting lookups. The only "radial" category: colour
    /// analysis applies a circular mask.
    MatCap,
    /// Colour textures assigned with non-default tiling.
    Tiling,
    /// Normal maps assigned with non-default tiling.
    Normal,
    /// Blend, dissolve and alpha masks with their own tiling.
    Mask,
    /// Secondary layers flagged as decals.
    Decal,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::MatCap,
        Category::Tiling,
        Category::Normal,
        Category::Mask,
        Category::Decal,
    ];

    /// Human-readable label; also the category's folder name.
    pub fn label(self) -> &'static str {
        match self {
            Self::MatCap => "MatCap",
            Self::Tiling => "Tiling",
            Self::Normal => "Normal",
            Self::Mask => "Mask",
            Self::Decal => "Decal",
        }
    }

    /// `true` for the category whose colour signature is taken inside a
    /// centred circle rather than over the whole image.
    pub fn is_radial(self) -> bool {
        matches!(self, Self::MatCap)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category '{}' (expected matcap, tiling, normal, mask or decal)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
