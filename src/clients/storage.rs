use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::errors::ServiceError;

/// Blob storage for reply attachments (cost breakups, marked-up drawings).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a buffered file and returns its public download URL.
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError>;
}

/// `reqwest`-backed object store client.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1/objects/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("storage: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "storage: upload failed with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("storage: {e}")))?;

        Ok(body.url)
    }
}
