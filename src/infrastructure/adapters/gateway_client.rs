//! Payment gateway client adapter
//!
//! The only component aware of the gateway-facing wire details. Translates
//! session-level requests into the two backend calls (create intent, check
//! status) and maps wire failures onto the typed error taxonomy. Holds no
//! state between calls and performs no retries; the attempt budget belongs
//! to the poll controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::domain::{CreatePaymentRequest, GatewayStatus, PaymentIntent};
use crate::shared::error::{AppError, AppResult, CheckError, InitiationError};

/// Gateway operations the payment session depends on
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Create a payment intent for an invoice.
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentIntent, InitiationError>;

    /// Ask the gateway for the current status of an invoice's payment.
    ///
    /// `Pending` is a normal result, never an error.
    async fn check_status(&self, invoice_id: &str) -> Result<GatewayStatus, CheckError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitPaymentBody<'a> {
    invoice_id: &'a str,
    provider: &'a str,
    return_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitPaymentReply {
    success: bool,
    payment_url: Option<String>,
    provider_payment_id: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: GatewayStatus,
}

/// HTTP client for the gateway-facing backend
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    /// Create a new gateway client with the configured timeout
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GatewayApi for HttpGatewayClient {
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentIntent, InitiationError> {
        if request.invoice_id.trim().is_empty() {
            return Err(InitiationError::Rejected(
                "invoice id must not be empty".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        info!(
            request_id = %request_id,
            invoice_id = %request.invoice_id,
            provider = request.provider.as_str(),
            "creating payment intent"
        );

        let body = InitPaymentBody {
            invoice_id: &request.invoice_id,
            provider: request.provider.as_str(),
            return_url: &request.return_url,
            cancel_url: &request.cancel_url,
        };

        let response = self
            .client
            .post(format!("{}/invoice/init-payment", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| InitiationError::Network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(InitiationError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let reply: InitPaymentReply = response
            .json()
            .await
            .map_err(|e| InitiationError::Network(format!("Failed to parse response: {}", e)))?;

        if !reply.success {
            return Err(InitiationError::Rejected(
                reply
                    .error_message
                    .unwrap_or_else(|| "unspecified gateway error".to_string()),
            ));
        }

        match (reply.payment_url, reply.provider_payment_id) {
            (Some(payment_url), Some(provider_payment_id)) => {
                debug!(
                    request_id = %request_id,
                    provider_payment_id = %provider_payment_id,
                    "payment intent created"
                );
                Ok(PaymentIntent {
                    payment_url,
                    provider_payment_id,
                })
            }
            _ => Err(InitiationError::Network(
                "gateway reply missing payment url or payment id".to_string(),
            )),
        }
    }

    async fn check_status(&self, invoice_id: &str) -> Result<GatewayStatus, CheckError> {
        let response = self
            .client
            .get(format!("{}/invoice/{}/status", self.base_url, invoice_id))
            .send()
            .await
            .map_err(|e| CheckError::Network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CheckError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let reply: StatusReply = response
            .json()
            .await
            .map_err(|e| CheckError::Network(format!("Failed to parse response: {}", e)))?;

        Ok(reply.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::PaymentProvider;

    #[test]
    fn init_body_serializes_camel_case() {
        let body = InitPaymentBody {
            invoice_id: "inv-1",
            provider: "click",
            return_url: "https://clinic.example/return",
            cancel_url: "https://clinic.example/cancel",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["invoiceId"], "inv-1");
        assert_eq!(json["returnUrl"], "https://clinic.example/return");
        assert_eq!(json["cancelUrl"], "https://clinic.example/cancel");
        assert_eq!(json["provider"], "click");
    }

    #[test]
    fn successful_init_reply_parses() {
        let reply: InitPaymentReply = serde_json::from_str(
            r#"{"success":true,"paymentUrl":"https://gw/pay/1","providerPaymentId":"p1"}"#,
        )
        .unwrap();
        assert!(reply.success);
        assert_eq!(reply.payment_url.as_deref(), Some("https://gw/pay/1"));
        assert_eq!(reply.provider_payment_id.as_deref(), Some("p1"));
    }

    #[test]
    fn rejected_init_reply_parses() {
        let reply: InitPaymentReply = serde_json::from_str(
            r#"{"success":false,"errorMessage":"insufficient_invoice_amount"}"#,
        )
        .unwrap();
        assert!(!reply.success);
        assert_eq!(
            reply.error_message.as_deref(),
            Some("insufficient_invoice_amount")
        );
    }

    #[test]
    fn status_reply_parses_all_wire_statuses() {
        for (wire, expected) in [
            ("pending", GatewayStatus::Pending),
            ("paid", GatewayStatus::Paid),
            ("failed", GatewayStatus::Failed),
            ("cancelled", GatewayStatus::Cancelled),
        ] {
            let reply: StatusReply =
                serde_json::from_str(&format!(r#"{{"status":"{}"}}"#, wire)).unwrap();
            assert_eq!(reply.status, expected);
        }
        assert!(serde_json::from_str::<StatusReply>(r#"{"status":"refunded"}"#).is_err());
    }

    #[tokio::test]
    async fn empty_invoice_id_is_rejected_before_any_network_call() {
        let client = HttpGatewayClient::new(&AppConfig::default().gateway).unwrap();
        let result = client
            .create_payment(CreatePaymentRequest {
                invoice_id: "  ".to_string(),
                provider: PaymentProvider::Click,
                return_url: "https://clinic.example/return".to_string(),
                cancel_url: "https://clinic.example/cancel".to_string(),
            })
            .await;
        assert!(matches!(result, Err(InitiationError::Rejected(_))));
    }
}
