/// Browsing a category: filtering, duplicate collapsing and sorting.
///
/// The colour sort groups records into three tiers before ordering by hue,
/// so greys do not scatter through the spectrum:
///
/// - tier 0: greyscale, black and white (`v < 0.2 || s < 0.15`), darkest last
/// - tier 1: muted colours (`s < 0.4`)
/// - tier 2: vivid colours
///
/// Within tiers 1 and 2, hue is quantised to 24 steps so near-identical
/// hues sort by saturation and then value instead of by noise.
use crate::catalog::CatalogStore;
use crate::model::{AssetRecord, Category, Hsv};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const HUE_STEPS: f32 = 24.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// By location.
    #[default]
    Name,
    /// By colour tier, quantised hue, saturation, value.
    Color,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Color => "color",
        })
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "color" | "colour" => Ok(Self::Color),
            other => Err(format!("unknown sort order '{other}' (expected name or color)")),
        }
    }
}

/// What to list from one category.
#[derive(Clone, Debug, PartialEq)]
pub struct BrowseQuery {
    pub category: Category,
    /// Case-insensitive substring matched against the location.
    pub search: Option<String>,
    pub include_ignored: bool,
    /// Keep only the first record of each content hash.
    pub collapse_duplicates: bool,
    pub sort: SortOrder,
}

impl BrowseQuery {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            search: None,
            include_ignored: false,
            collapse_duplicates: true,
            sort: SortOrder::Name,
        }
    }
}

/// Colour tier of a signature: 0 grey, 1 muted, 2 vivid.
pub fn color_tier(hsv: Hsv) -> u8 {
    if hsv.v < 0.2 || hsv.s < 0.15 {
        0
    } else if hsv.s < 0.4 {
        1
    } else {
        2
    }
}

fn quantise_hue(h: f32) -> f32 {
    (h * HUE_STEPS).floor() / HUE_STEPS
}

fn compare_color(a: &AssetRecord, b: &AssetRecord) -> Ordering {
    let ha = a.color_signature.unwrap_or_default();
    let hb = b.color_signature.unwrap_or_default();
    let (ta, tb) = (color_tier(ha), color_tier(hb));
    let primary = |tier: u8, hsv: Hsv| {
        if tier == 0 {
            1.0 - hsv.v
        } else {
            quantise_hue(hsv.h)
        }
    };

    ta.cmp(&tb)
        .then_with(|| primary(ta, ha).total_cmp(&primary(tb, hb)))
        .then_with(|| hb.s.total_cmp(&ha.s))
        .then_with(|| hb.v.total_cmp(&ha.v))
}

/// Run `query` against `store`.
///
/// Duplicate collapsing happens in key order before sorting, so which
/// member of a hash group survives does not depend on the sort.
pub fn browse<'s>(store: &'s CatalogStore, query: &BrowseQuery) -> Vec<&'s AssetRecord> {
    let needle = query.search.as_ref().map(|s| s.to_lowercase());
    let mut seen_hashes = HashSet::new();

    let mut records: Vec<&AssetRecord> = store
        .records_in(query.category)
        .filter(|r| query.include_ignored || !store.is_ignored(&r.identity))
        .filter(|r| match &needle {
            Some(n) => r.location.to_string_lossy().to_lowercase().contains(n.as_str()),
            None => true,
        })
        .filter(|&r| {
            if !query.collapse_duplicates {
                return true;
            }
            match r.content_hash.as_deref() {
                Some(hash) if !hash.is_empty() => seen_hashes.insert(hash),
                _ => true,
            }
        })
        .collect();

    match query.sort {
        SortOrder::Name => records.sort_by(|a, b| a.location.cmp(&b.location)),
        SortOrder::Color => records.sort_by(|a, b| compare_color(a, b)),
    }
    records
}
