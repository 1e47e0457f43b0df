use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    sources::{Dataset, RawSource},
};

/// Reads datasets from files in a local directory
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    dir: PathBuf,
}

impl LocalDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl RawSource for LocalDirSource {
    async fn fetch(&self, dataset: Dataset) -> AppResult<Vec<u8>> {
        let path = self.dir.join(dataset.file_name());
        tracing::debug!(dataset = %dataset, path = %path.display(), "Reading raw dataset");

        tokio::fs::read(&path).await.map_err(|e| {
            AppError::source_unavailable(dataset.as_str(), format!("{}: {}", path.display(), e))
        })
    }

    fn name(&self) -> &'static str {
        "local_dir"
    }
}
