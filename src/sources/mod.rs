//! Raw input sources
//!
//! The pipeline never talks to object storage directly. A `RawSource` hands
//! back the raw bytes of one named dataset; parsing and validation happen in
//! the loader so every source behaves identically once the bytes arrive.

use crate::error::AppResult;

pub mod http;
pub mod local;

pub use http::HttpSource;
pub use local::LocalDirSource;

/// The three inputs of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Registry of active advertisers
    Advertisers,
    /// Product page view log
    ProductViews,
    /// Ad impression and click log
    AdViews,
}

impl Dataset {
    /// Object name of the dataset in the raw storage area
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Advertisers => "advertiser_ids.csv",
            Dataset::ProductViews => "product_views.csv",
            Dataset::AdViews => "ads_views.csv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Advertisers => "advertisers",
            Dataset::ProductViews => "product_views",
            Dataset::AdViews => "ad_views",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for raw dataset sources
///
/// Implementations must either return the complete content of the dataset or
/// fail with `AppError::SourceUnavailable`. Retrying is left to whoever
/// schedules the run.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RawSource: Send + Sync {
    /// Fetch the full content of one dataset
    async fn fetch(&self, dataset: Dataset) -> AppResult<Vec<u8>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}
