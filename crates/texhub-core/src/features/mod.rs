/// Colour feature extraction.
///
/// - [`analyze`]: pure numeric analysis over an already-decoded pixel buffer.
/// - [`extractor`]: the [`FeatureExtractor`] seam the catalog calls, with a
///   production implementation that acquires pixels on the calling thread
///   and runs the analysis on a worker pool.
pub mod analyze;
pub mod extractor;

pub use analyze::{analyze, PixelBuffer, PixelData, SpreadMetric, GRID_SPLIT};
pub use extractor::{FeatureExtractor, PooledExtractor};
