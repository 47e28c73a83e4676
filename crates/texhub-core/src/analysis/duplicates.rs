/// Duplicate detection by content hash.
///
/// Records sharing a digest are reported together. Nothing is removed from
/// the catalog; the same file referenced as two categories also shows up
/// here.
use crate::catalog::CatalogStore;
use crate::model::AssetRecord;
use std::collections::BTreeMap;

/// A group of records whose files have identical content.
#[derive(Debug)]
pub struct DuplicateGroup<'s> {
    pub hash: &'s str,
    /// Members sorted by location.
    pub records: Vec<&'s AssetRecord>,
}

/// Every hash shared by at least two records, in hash order. Records
/// without a hash are never grouped.
pub fn find_duplicates(store: &CatalogStore) -> Vec<DuplicateGroup<'_>> {
    let mut by_hash: BTreeMap<&str, Vec<&AssetRecord>> = BTreeMap::new();
    for record in store.records() {
        if let Some(hash) = record.content_hash.as_deref().filter(|h| !h.is_empty()) {
            by_hash.entry(hash).or_default().push(record);
        }
    }

    by_hash
        .into_iter()
        .filter(|(_, records)| records.len() >= 2)
        .map(|(hash, mut records)| {
            records.sort_by(|a, b| a.location.cmp(&b.location));
            DuplicateGroup { hash, records }
        })
        .collect()
}
