//! Post-payment artifact fetcher adapter
//!
//! Retrieves the deliverables a paid invoice unlocks (visit tickets,
//! receipts) from the backend. The call is idempotent on the wire; the
//! session guarantees it is issued at most once per successful payment.

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::config::{ArtifactsConfig, GatewayConfig};
use crate::domain::Artifact;
use crate::shared::error::{AppError, AppResult, FetchError};

/// Artifact retrieval operations the payment session depends on
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, invoice_id: &str) -> Result<Vec<Artifact>, FetchError>;
}

/// HTTP client for the artifact endpoint of the backend
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArtifactFetcher {
    pub fn new(gateway: &GatewayConfig, artifacts: &ArtifactsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(artifacts.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: gateway.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactFetcher {
    async fn fetch(&self, invoice_id: &str) -> Result<Vec<Artifact>, FetchError> {
        let response = self
            .client
            .get(format!("{}/invoice/{}/tickets", self.base_url, invoice_id))
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let artifacts: Vec<Artifact> = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        info!(
            invoice_id = %invoice_id,
            count = artifacts.len(),
            "fetched post-payment artifacts"
        );
        Ok(artifacts)
    }
}
