/// Property tests for the catalog invariants and colour analysis.
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use texhub_core::catalog::{CatalogStore, MergePlan, MergeWork};
use texhub_core::features::{analyze, PixelBuffer, SpreadMetric};
use texhub_core::model::{AssetId, Candidate, Category, ColorFeatures, Hsv, RecordKey};

fn category(i: usize) -> Category {
    Category::ALL[i % Category::ALL.len()]
}

fn metric(rgb: bool) -> SpreadMetric {
    if rgb {
        SpreadMetric::Rgb
    } else {
        SpreadMetric::Hue
    }
}

/// Commit a series of (identity, category, plan, stamp) merges.
fn build_store(ops: &[(u8, usize, u8, i64)]) -> CatalogStore {
    let mut store = CatalogStore::new("unused.json", SpreadMetric::Hue);
    for &(id, cat, plan, secs) in ops {
        let candidate = Candidate::new(
            AssetId::new(format!("id{id}")),
            PathBuf::from(format!("t{id}.png")),
            category(cat),
        );
        let plan = match plan % 3 {
            0 => MergePlan::Insert,
            1 => MergePlan::Recompute,
            _ => MergePlan::Refresh,
        };
        let work = MergeWork {
            hash: Some(format!("h{id}")),
            features: Some(ColorFeatures {
                signature: Hsv { h: 0.1, s: 0.2, v: 0.3 },
                ..ColorFeatures::default()
            }),
        };
        let stamp = Utc.timestamp_opt(secs, 0).unwrap();
        store.commit_merge(candidate, stamp, plan, work);
    }
    store
}

/// Float channels including NaN, infinities and values outside `[0, 1]`.
fn float_channel() -> impl Strategy<Value = f32> {
    prop_oneof![
        Just(f32::NAN),
        Just(f32::INFINITY),
        Just(f32::NEG_INFINITY),
        -4.0f32..4.0,
        0.0f32..=1.0,
        any::<f32>(),
    ]
}

fn assert_features_bounded(features: &ColorFeatures, metric: SpreadMetric) -> Result<(), TestCaseError> {
    let Hsv { h: hue, s, v } = features.signature;
    prop_assert!((0.0..1.0).contains(&hue), "hue {}", hue);
    prop_assert!((0.0..=1.0).contains(&s), "saturation {}", s);
    prop_assert!((0.0..=1.0).contains(&v), "value {}", v);
    let max_spread = match metric {
        SpreadMetric::Hue => 0.5 + 1e-4,
        SpreadMetric::Rgb => 3.0f32.sqrt() + 1e-4,
    };
    prop_assert!((0.0..=max_spread).contains(&features.spread), "spread {}", features.spread);
    for sample in &features.samples {
        for c in [sample.r, sample.g, sample.b] {
            prop_assert!((0.0..=1.0).contains(&c), "sample channel {}", c);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn analyze_is_deterministic(
        w in 0u32..24,
        h in 0u32..24,
        seed in proptest::collection::vec(any::<u8>(), 0..2400),
        cat in 0usize..5,
        rgb in any::<bool>(),
    ) {
        let pixels = PixelBuffer::rgba8(w, h, seed);
        let a = analyze(&pixels, category(cat), metric(rgb));
        let b = analyze(&pixels, category(cat), metric(rgb));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn analyze_output_is_in_range(
        w in 0u32..24,
        h in 0u32..24,
        data in proptest::collection::vec(any::<u8>(), 0..2400),
        cat in 0usize..5,
        rgb in any::<bool>(),
    ) {
        let features = analyze(&PixelBuffer::rgba8(w, h, data), category(cat), metric(rgb));
        let Hsv { h: hue, s, v } = features.signature;
        prop_assert!((0.0..1.0).contains(&hue), "hue {}", hue);
        prop_assert!((0.0..=1.0).contains(&s));
        prop_assert!((0.0..=1.0).contains(&v));
        prop_assert!(features.spread >= 0.0);
        prop_assert!(features.samples.len() <= 16);
        if features.samples.is_empty() {
            prop_assert_eq!(features.spread, 0.0);
        }
    }

    #[test]
    fn analyze_float_output_is_finite_and_in_range(
        w in 0u32..16,
        h in 0u32..16,
        data in proptest::collection::vec(float_channel(), 0..1024),
        cat in 0usize..5,
        rgb in any::<bool>(),
    ) {
        let features = analyze(&PixelBuffer::rgba_f32(w, h, data), category(cat), metric(rgb));
        assert_features_bounded(&features, metric(rgb))?;

        // Anything analysis produces must survive the catalog's JSON form.
        let json = serde_json::to_string(&features.samples).unwrap();
        let back: Vec<texhub_core::model::Rgb> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.len(), features.samples.len());
    }

    #[test]
    fn merge_never_duplicates_keys(
        ops in proptest::collection::vec((0u8..6, 0usize..5, any::<u8>(), 0i64..4), 0..60),
    ) {
        let store = build_store(&ops);
        let keys: HashSet<RecordKey> = store.records().map(|r| r.key()).collect();
        prop_assert_eq!(keys.len(), store.len());
        // Refresh-only merges of unknown keys never create records.
        let inserted: HashSet<(u8, usize)> = ops
            .iter()
            .filter(|op| op.2 % 3 != 2)
            .map(|op| (op.0, op.1 % 5))
            .collect();
        prop_assert_eq!(store.len(), inserted.len());
    }

    #[test]
    fn merge_order_does_not_matter_for_keys(
        mut ops in proptest::collection::vec((0u8..6, 0usize..5, Just(0u8), Just(1i64)), 0..40),
    ) {
        let forward: Vec<RecordKey> = build_store(&ops).records().map(|r| r.key()).collect();
        ops.reverse();
        let backward: Vec<RecordKey> = build_store(&ops).records().map(|r| r.key()).collect();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prune_survivors_is_idempotent(
        ops in proptest::collection::vec((0u8..6, 0usize..5, Just(0u8), Just(1i64)), 0..40),
        keep in proptest::collection::vec((0u8..6, 0usize..5), 0..20),
    ) {
        let mut store = build_store(&ops);
        let observed: HashSet<RecordKey> = keep
            .iter()
            .map(|&(id, cat)| RecordKey::new(AssetId::new(format!("id{id}")), category(cat)))
            .collect();

        let before = store.len();
        let removed = store.prune_survivors(&observed);
        prop_assert_eq!(before - removed, store.len());
        prop_assert!(store.records().all(|r| observed.contains(&r.key())));
        prop_assert_eq!(store.prune_survivors(&observed), 0);
    }

    #[test]
    fn hue_distance_is_symmetric_and_bounded(a in 0.0f32..1.0, b in 0.0f32..1.0) {
        let x = Hsv { h: a, s: 1.0, v: 1.0 };
        let y = Hsv { h: b, s: 1.0, v: 1.0 };
        prop_assert_eq!(x.hue_distance(y), y.hue_distance(x));
        prop_assert!(x.hue_distance(y) <= 0.5 + f32::EPSILON);
    }
}
