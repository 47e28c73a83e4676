/// CSV export of catalog records.
use crate::model::AssetRecord;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Column order of the export.
pub const CSV_HEADER: [&str; 9] = [
    "identity",
    "category",
    "location",
    "hash",
    "hue",
    "saturation",
    "value",
    "spread",
    "last_modified",
];

#[derive(Serialize)]
struct Row<'a> {
    identity: &'a str,
    category: &'static str,
    location: String,
    hash: &'a str,
    hue: Option<f32>,
    saturation: Option<f32>,
    value: Option<f32>,
    spread: f32,
    last_modified: Option<String>,
}

impl<'a> From<&'a AssetRecord> for Row<'a> {
    fn from(r: &'a AssetRecord) -> Self {
        let hsv = r.color_signature;
        Row {
            identity: r.identity.as_str(),
            category: r.category.label(),
            location: r.location.to_string_lossy().into_owned(),
            hash: r.content_hash.as_deref().unwrap_or(""),
            hue: hsv.map(|c| c.h),
            saturation: hsv.map(|c| c.s),
            value: hsv.map(|c| c.v),
            spread: r.color_spread,
            last_modified: r.last_modified.map(|t| t.to_rfc3339()),
        }
    }
}

/// Write `records` as CSV to `out`. Returns the number of rows written.
pub fn write_csv<'a, W: Write>(
    out: W,
    records: impl IntoIterator<Item = &'a AssetRecord>,
) -> Result<usize, csv::Error> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(CSV_HEADER)?;
    let mut rows = 0;
    for record in records {
        writer.serialize(Row::from(record))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Write `records` to a CSV file at `path`.
pub fn export_csv<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a AssetRecord>,
) -> Result<usize, csv::Error> {
    let file = File::create(path).map_err(csv::Error::from)?;
    write_csv(io::BufWriter::new(file), records)
}
