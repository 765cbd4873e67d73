//! In-memory registry of live payment sessions
//!
//! Sessions for different invoices are independent and run in parallel; the
//! registry keys them by invoice so at most one session per invoice is ever
//! polling. Re-opening an invoice disposes the previous session before the
//! new one is stored.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::application::services::payment_session::{PaymentSession, SessionParams};
use crate::config::AppConfig;
use crate::domain::PaymentProvider;
use crate::infrastructure::adapters::{ArtifactSource, GatewayApi};
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::MetricsUtils;

/// Caller request to open a payment session for an invoice
#[derive(Debug, Clone)]
pub struct OpenSessionRequest {
    pub invoice_id: String,
    pub amount: f64,
    pub currency: String,
    pub provider: Option<PaymentProvider>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Owner of all live payment sessions
pub struct SessionRegistry {
    config: Arc<AppConfig>,
    gateway: Arc<dyn GatewayApi>,
    artifacts: Arc<dyn ArtifactSource>,
    metrics: Arc<MetricsUtils>,
    sessions: RwLock<HashMap<String, Arc<PaymentSession>>>,
}

impl SessionRegistry {
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<dyn GatewayApi>,
        artifacts: Arc<dyn ArtifactSource>,
        metrics: Arc<MetricsUtils>,
    ) -> Self {
        Self {
            config,
            gateway,
            artifacts,
            metrics,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session for an invoice, replacing and disposing any live
    /// session the invoice already had.
    pub async fn open(&self, request: OpenSessionRequest) -> AppResult<Arc<PaymentSession>> {
        if request.invoice_id.trim().is_empty() {
            return Err(AppError::Validation("invoice id must not be empty".into()));
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(AppError::Validation("amount must be positive".into()));
        }
        if request.currency.trim().is_empty() {
            return Err(AppError::Validation("currency must not be empty".into()));
        }

        let gateway_config = &self.config.gateway;
        let params = SessionParams {
            invoice_id: request.invoice_id.clone(),
            amount: request.amount,
            currency: request.currency,
            provider: request
                .provider
                .unwrap_or(gateway_config.default_provider),
            return_url: request
                .return_url
                .unwrap_or_else(|| gateway_config.return_url.clone()),
            cancel_url: request
                .cancel_url
                .unwrap_or_else(|| gateway_config.cancel_url.clone()),
            max_attempts: self.config.polling.max_attempts,
            poll_interval: self.config.polling.poll_interval(),
            fetch_artifacts: self.config.artifacts.enabled,
        };
        let session = PaymentSession::new(
            params,
            self.gateway.clone(),
            self.artifacts.clone(),
            self.metrics.clone(),
        );

        let mut sessions = self.sessions.write().await;
        if let Some(previous) = sessions.insert(request.invoice_id.clone(), session.clone()) {
            debug!(
                invoice_id = %request.invoice_id,
                "replacing live payment session for invoice"
            );
            previous.dispose();
        }
        self.metrics.record_session_opened();
        Ok(session)
    }

    /// Look up the live session for an invoice
    pub async fn get(&self, invoice_id: &str) -> AppResult<Arc<PaymentSession>> {
        self.sessions
            .read()
            .await
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| AppError::UnknownInvoice {
                invoice_id: invoice_id.to_string(),
            })
    }

    /// Dispose and drop the session for an invoice (dialog-closed path)
    pub async fn remove(&self, invoice_id: &str) -> AppResult<()> {
        let session = self.sessions.write().await.remove(invoice_id).ok_or_else(|| {
            AppError::UnknownInvoice {
                invoice_id: invoice_id.to_string(),
            }
        })?;
        session.dispose();
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
