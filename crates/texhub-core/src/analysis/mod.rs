/// Analysis modules: read-only queries over a loaded catalog.

pub mod browse;
pub mod duplicates;
pub mod export;

pub use browse::{browse, color_tier, BrowseQuery, SortOrder};
pub use duplicates::{find_duplicates, DuplicateGroup};
pub use export::{export_csv, write_csv};
