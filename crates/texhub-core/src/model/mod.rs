/// Data model for the texture catalog.
///
/// Re-exports the category enum, colour types, asset identities and
/// catalog records.
pub mod category;
pub mod color;
pub mod record;

pub use category::Category;
pub use color::{Hsv, Rgb};
pub use record::{AssetId, AssetRecord, Candidate, ColorFeatures, RecordKey};
