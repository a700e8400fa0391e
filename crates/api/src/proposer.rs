//! Mask-proposal collaborator.
//!
//! The pre-segmentation model is an external service consumed as an
//! opaque "propose a mask for this image" call. No retries or caching
//! here; a failed proposal surfaces to the caller.

use async_trait::async_trait;

use segflow_core::error::CoreError;

/// Proposes an initial segmentation mask for an image.
#[async_trait]
pub trait MaskProposer: Send + Sync {
    /// Returns the proposed mask as PNG bytes.
    async fn propose(&self, image_bytes: &[u8]) -> Result<Vec<u8>, CoreError>;
}

/// HTTP client for a remote mask-proposal service.
pub struct HttpMaskProposer {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMaskProposer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpMaskProposer {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MaskProposer for HttpMaskProposer {
    async fn propose(&self, image_bytes: &[u8]) -> Result<Vec<u8>, CoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("Mask proposal request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Internal(format!(
                "Mask proposal service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Internal(format!("Mask proposal response unreadable: {e}")))?;
        Ok(bytes.to_vec())
    }
}
