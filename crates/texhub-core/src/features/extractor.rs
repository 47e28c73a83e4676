/// The feature-extraction seam the catalog merge calls into.
///
/// [`PooledExtractor`] splits the work the way the host requires: pixel
/// acquisition happens on the calling (orchestrating) thread, the numeric
/// analysis runs on a dedicated rayon pool, and the caller blocks on
/// `install` until the result is back. Nothing shared is mutated from a
/// pool worker.
use super::analyze::{analyze, SpreadMetric};
use crate::config::ScanConfig;
use crate::error::FeatureError;
use crate::host::AssetHost;
use crate::model::{Category, ColorFeatures};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Produce colour features for the image at `location`.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, location: &Path, category: Category) -> Result<ColorFeatures, FeatureError>;

    /// The dispersion metric this extractor measures spread with.
    fn metric(&self) -> SpreadMetric;
}

/// Production extractor: host-decoded pixels, pooled analysis.
pub struct PooledExtractor {
    host: Arc<dyn AssetHost>,
    pool: rayon::ThreadPool,
    metric: SpreadMetric,
}

impl PooledExtractor {
    pub fn new(host: Arc<dyn AssetHost>, config: &ScanConfig) -> Result<Self, FeatureError> {
        let threads = config.resolved_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("texhub-analysis-{i}"))
            .build()
            .map_err(|e| FeatureError::Pool(e.to_string()))?;
        debug!("Analysis pool started with {threads} workers");
        Ok(Self {
            host,
            pool,
            metric: config.spread_metric,
        })
    }
}

impl FeatureExtractor for PooledExtractor {
    fn extract(&self, location: &Path, category: Category) -> Result<ColorFeatures, FeatureError> {
        let pixels = self.host.acquire_pixels(location)?;
        let metric = self.metric;
        Ok(self.pool.install(move || analyze(&pixels, category, metric)))
    }

    fn metric(&self) -> SpreadMetric {
        self.metric
    }
}
