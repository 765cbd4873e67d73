//! HTTP wire models for the service surface

use serde::{Deserialize, Serialize};

use crate::domain::PaymentProvider;

/// Body of `POST /payments`: open a session for an invoice and create the
/// payment intent. Provider and redirect URLs fall back to configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StartPaymentRequest {
    pub invoice_id: String,
    pub amount: f64,
    pub currency: String,
    pub provider: Option<PaymentProvider>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Error body rendered for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}
