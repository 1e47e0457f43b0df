/// Fetches datasets over HTTP(S)
///
/// Works against any endpoint that serves the raw files under a common base
/// URL, such as a public S3/MinIO bucket or a presigned prefix.
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    sources::{Dataset, RawSource},
};

#[derive(Debug, Clone)]
pub struct HttpSource {
    http_client: HttpClient,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, dataset: Dataset) -> String {
        format!("{}/{}", self.base_url, dataset.file_name())
    }
}

#[async_trait::async_trait]
impl RawSource for HttpSource {
    async fn fetch(&self, dataset: Dataset) -> AppResult<Vec<u8>> {
        let url = self.url_for(dataset);
        tracing::debug!(dataset = %dataset, url = %url, "Downloading raw dataset");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(dataset.as_str(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(dataset = %dataset, status = %status, "Raw dataset download failed");
            return Err(AppError::source_unavailable(
                dataset.as_str(),
                format!("GET {} returned status {}", url, status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::source_unavailable(dataset.as_str(), e))?;

        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
