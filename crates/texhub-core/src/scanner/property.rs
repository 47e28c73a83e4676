/// Material-property scanners: one rule table per category.
///
/// Each rule names a texture property, an optional toggle that must be on,
/// and an optional extra gate. Categories defined by "has non-default
/// tiling" additionally drop slots whose scale is exactly (1, 1): an
/// assigned but untiled texture does not belong to them.
use super::material::Material;
use super::MaterialScanner;
use crate::model::{AssetId, Category};

/// Extra condition evaluated before a slot is considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    None,
    /// The named float must be present and non-zero.
    Enabled(&'static str),
    /// The named float must be absent or zero.
    Disabled(&'static str),
    /// The named integer mode must be present and non-zero.
    IntNonZero(&'static str),
}

impl Gate {
    fn passes(self, material: &Material) -> bool {
        match self {
            Gate::None => true,
            Gate::Enabled(name) => material.is_enabled(name),
            Gate::Disabled(name) => !material.is_enabled(name),
            Gate::IntNonZero(name) => material.int(name).is_some_and(|v| v != 0),
        }
    }
}

/// One (texture, toggle, gate) entry of a rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRule {
    pub texture: &'static str,
    pub toggle: Option<&'static str>,
    pub gate: Gate,
}

const fn slot(texture: &'static str, toggle: Option<&'static str>) -> SlotRule {
    SlotRule {
        texture,
        toggle,
        gate: Gate::None,
    }
}

const fn gated(texture: &'static str, toggle: Option<&'static str>, gate: Gate) -> SlotRule {
    SlotRule {
        texture,
        toggle,
        gate,
    }
}

/// A category's scanner: its rule table and whether tiling is required.
#[derive(Clone, Copy, Debug)]
pub struct RuleScanner {
    pub category: Category,
    pub requires_tiling: bool,
    pub rules: &'static [SlotRule],
}

impl RuleScanner {
    /// Apply one rule. Returns the referenced identity if the slot qualifies.
    fn evaluate<'m>(&self, rule: &SlotRule, material: &'m Material) -> Option<&'m AssetId> {
        if let Some(toggle) = rule.toggle {
            if !material.is_enabled(toggle) {
                return None;
            }
        }
        if !rule.gate.passes(material) {
            return None;
        }
        let slot = material.texture_slot(rule.texture)?;
        let guid = slot.guid.as_ref()?;
        if self.requires_tiling && !slot.is_tiled() {
            return None;
        }
        Some(guid)
    }
}

impl MaterialScanner for RuleScanner {
    fn category(&self) -> Category {
        self.category
    }

    fn qualifying_textures<'m>(&self, material: &'m Material) -> Vec<&'m AssetId> {
        self.rules
            .iter()
            .filter_map(|rule| self.evaluate(rule, material))
            .collect()
    }
}

pub const MATCAP: RuleScanner = RuleScanner {
    category: Category::MatCap,
    requires_tiling: false,
    rules: &[
        slot("_MatCapTex", Some("_UseMatCap")),
        slot("_MatCap2ndTex", Some("_UseMatCap2nd")),
    ],
};

pub const TILING: RuleScanner = RuleScanner {
    category: Category::Tiling,
    requires_tiling: true,
    rules: &[
        slot("_MainTex", None),
        gated(
            "_Main2ndTex",
            Some("_UseMain2ndTex"),
            Gate::Disabled("_Main2ndTexIsDecal"),
        ),
        gated(
            "_Main3rdTex",
            Some("_UseMain3rdTex"),
            Gate::Disabled("_Main3rdTexIsDecal"),
        ),
        slot("_EmissionMap", Some("_UseEmission")),
        slot("_Emission2ndMap", Some("_UseEmission2nd")),
        slot("_GlitterColorTex", Some("_UseGlitter")),
        // The shape only matters when glitter itself is on.
        gated(
            "_GlitterShapeTex",
            Some("_UseGlitter"),
            Gate::Enabled("_GlitterApplyShape"),
        ),
        slot("_OutlineTex", Some("_UseOutline")),
        slot("_RimColorTex", Some("_UseRim")),
    ],
};

pub const NORMAL: RuleScanner = RuleScanner {
    category: Category::Normal,
    requires_tiling: true,
    rules: &[
        slot("_BumpMap", Some("_UseBumpMap")),
        slot("_Bump2ndMap", Some("_UseBump2ndMap")),
    ],
};

pub const MASK: RuleScanner = RuleScanner {
    category: Category::Mask,
    requires_tiling: true,
    rules: &[
        slot("_EmissionBlendMask", Some("_UseEmission")),
        slot("_Emission2ndBlendMask", Some("_UseEmission2nd")),
        slot("_AudioLinkMask", Some("_UseAudioLink")),
        slot("_DissolveMask", None),
        slot("_DissolveNoiseMask", None),
        slot("_Main2ndDissolveMask", Some("_UseMain2ndTex")),
        slot("_Main2ndDissolveNoiseMask", Some("_UseMain2ndTex")),
        slot("_Main3rdDissolveMask", Some("_UseMain3rdTex")),
        slot("_Main3rdDissolveNoiseMask", Some("_UseMain3rdTex")),
        slot("_MatCapBlendMask", Some("_UseMatCap")),
        slot("_MatCap2ndBlendMask", Some("_UseMatCap2nd")),
        gated("_AlphaMask", None, Gate::IntNonZero("_AlphaMaskMode")),
    ],
};

pub const DECAL: RuleScanner = RuleScanner {
    category: Category::Decal,
    requires_tiling: false,
    rules: &[
        gated(
            "_Main2ndTex",
            Some("_UseMain2ndTex"),
            Gate::Enabled("_Main2ndTexIsDecal"),
        ),
        gated(
            "_Main3rdTex",
            Some("_UseMain3rdTex"),
            Gate::Enabled("_Main3rdTexIsDecal"),
        ),
    ],
};

/// The five built-in scanners, one per category.
pub const ALL: [RuleScanner; 5] = [MATCAP, TILING, NORMAL, MASK, DECAL];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::material::TextureSlot;

    const TILED: [f32; 2] = [2.0, 2.0];
    const UNTILED: [f32; 2] = [1.0, 1.0];

    fn ids(scanner: &RuleScanner, material: &Material) -> Vec<String> {
        scanner
            .qualifying_textures(material)
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_each_category_has_one_scanner() {
        let categories: Vec<_> = ALL.iter().map(|s| s.category).collect();
        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[test]
    fn test_matcap_requires_toggle() {
        let mat = Material::new("m")
            .with_texture("_MatCapTex", TextureSlot::new("mc1", UNTILED))
            .with_texture("_MatCap2ndTex", TextureSlot::new("mc2", UNTILED))
            .with_float("_UseMatCap", 1.0);
        // Untiled is fine for matcaps; the second slot has no toggle.
        assert_eq!(ids(&MATCAP, &mat), vec!["mc1"]);
    }

    #[test]
    fn test_toggle_set_to_zero_yields_nothing() {
        let mat = Material::new("m")
            .with_float("_UseBumpMap", 0.0)
            .with_texture("_BumpMap", TextureSlot::new("n1", TILED));
        assert!(ids(&NORMAL, &mat).is_empty());
    }

    #[test]
    fn test_untiled_slot_excluded_from_tiling_categories() {
        let mat = Material::new("m")
            .with_texture("_MainTex", TextureSlot::new("main", UNTILED))
            .with_float("_UseBumpMap", 1.0)
            .with_texture("_BumpMap", TextureSlot::new("n1", UNTILED))
            .with_texture("_DissolveMask", TextureSlot::new("d1", UNTILED));
        assert!(ids(&TILING, &mat).is_empty());
        assert!(ids(&NORMAL, &mat).is_empty());
        assert!(ids(&MASK, &mat).is_empty());

        let tiled = mat.with_texture("_MainTex", TextureSlot::new("main", [1.0, 3.0]));
        assert_eq!(ids(&TILING, &tiled), vec!["main"]);
    }

    #[test]
    fn test_unset_or_missing_texture_is_skipped() {
        let mat = Material::new("m")
            .with_float("_UseEmission", 1.0)
            .with_texture("_EmissionMap", TextureSlot::unset());
        assert!(ids(&TILING, &mat).is_empty());
        assert!(ids(&MASK, &mat).is_empty());
    }

    #[test]
    fn test_decal_flag_routes_second_layer() {
        let base = Material::new("m")
            .with_float("_UseMain2ndTex", 1.0)
            .with_texture("_Main2ndTex", TextureSlot::new("layer", TILED));

        assert_eq!(ids(&TILING, &base), vec!["layer"]);
        assert!(ids(&DECAL, &base).is_empty());

        let decal = base.with_float("_Main2ndTexIsDecal", 1.0);
        assert!(ids(&TILING, &decal).is_empty());
        assert_eq!(ids(&DECAL, &decal), vec!["layer"]);
    }

    #[test]
    fn test_glitter_shape_needs_both_toggles() {
        let mat = Material::new("m")
            .with_texture("_GlitterShapeTex", TextureSlot::new("shape", TILED))
            .with_float("_GlitterApplyShape", 1.0);
        assert!(ids(&TILING, &mat).is_empty());

        let on = mat.clone().with_float("_UseGlitter", 1.0);
        assert_eq!(ids(&TILING, &on), vec!["shape"]);

        let no_shape = on.with_float("_GlitterApplyShape", 0.0);
        assert!(ids(&TILING, &no_shape).is_empty());
    }

    #[test]
    fn test_alpha_mask_mode_sentinel() {
        let mat = Material::new("m").with_texture("_AlphaMask", TextureSlot::new("alpha", TILED));
        assert!(ids(&MASK, &mat).is_empty());
        assert!(ids(&MASK, &mat.clone().with_int("_AlphaMaskMode", 0)).is_empty());
        assert_eq!(ids(&MASK, &mat.with_int("_AlphaMaskMode", 2)), vec!["alpha"]);
    }
}
