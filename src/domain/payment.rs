//! Payments domain models and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::InitiationError;

/// Supported payment gateways
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Click,
    Payme,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Click => "click",
            PaymentProvider::Payme => "payme",
        }
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "click" => Ok(PaymentProvider::Click),
            "payme" => Ok(PaymentProvider::Payme),
            _ => Err(format!("unsupported payment provider: {}", s)),
        }
    }
}

/// Status reported by the gateway for an invoice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl GatewayStatus {
    /// Whether the gateway considers the payment settled, one way or the other
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GatewayStatus::Pending)
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayStatus::Pending => "pending",
            GatewayStatus::Paid => "paid",
            GatewayStatus::Failed => "failed",
            GatewayStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Gateway-side payment object created by `create_payment`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntent {
    /// URL the user must be redirected to in order to pay
    pub payment_url: String,
    /// Gateway-side identifier of the intent
    pub provider_payment_id: String,
}

/// Session-level request to create a payment intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub invoice_id: String,
    pub provider: PaymentProvider,
    pub return_url: String,
    pub cancel_url: String,
}

/// Kind of post-payment deliverable
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    VisitTicket,
    Receipt,
}

/// A post-payment deliverable fetched after success.
///
/// The payload is opaque to this service; rendering and printing belong to
/// the display sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: String,
    pub kind: ArtifactKind,
    pub title: String,
    pub payload: serde_json::Value,
}

/// Recorded reason a session ended up in `Failed`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The gateway could not be reached while creating the intent
    InitiationNetwork { message: String },
    /// The gateway declined to create the intent
    InitiationRejected { message: String },
    /// The gateway itself reported the payment failed or cancelled
    GatewayDeclined { status: GatewayStatus },
    /// The attempt budget ran out with no terminal status observed
    PollingTimeout { attempts: u32 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::InitiationNetwork { message } => {
                write!(f, "payment initiation failed: {}", message)
            }
            FailureReason::InitiationRejected { message } => {
                write!(f, "payment rejected by gateway: {}", message)
            }
            FailureReason::GatewayDeclined { status } => {
                write!(f, "gateway reported payment {}", status)
            }
            FailureReason::PollingTimeout { attempts } => {
                write!(f, "no payment confirmation after {} checks", attempts)
            }
        }
    }
}

impl From<InitiationError> for FailureReason {
    fn from(err: InitiationError) -> Self {
        match err {
            InitiationError::Network(message) => FailureReason::InitiationNetwork { message },
            InitiationError::Rejected(message) => FailureReason::InitiationRejected { message },
        }
    }
}

/// Discriminant of the session state, used in snapshots and error messages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Init,
    AwaitingRedirect,
    Polling,
    Succeeded,
    Failed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Init => "init",
            SessionPhase::AwaitingRedirect => "awaiting_redirect",
            SessionPhase::Polling => "polling",
            SessionPhase::Succeeded => "succeeded",
            SessionPhase::Failed => "failed",
        }
    }
}

/// State of a payment session.
///
/// A tagged union: the intent exists only once the gateway has created it,
/// artifacts exist only on a succeeded session, and a failure always carries
/// its reason. Exactly one variant holds at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Init,
    AwaitingRedirect {
        intent: PaymentIntent,
    },
    Polling {
        intent: PaymentIntent,
    },
    Succeeded {
        intent: PaymentIntent,
        artifacts: Vec<Artifact>,
    },
    Failed {
        intent: Option<PaymentIntent>,
        reason: FailureReason,
    },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Init => SessionPhase::Init,
            SessionState::AwaitingRedirect { .. } => SessionPhase::AwaitingRedirect,
            SessionState::Polling { .. } => SessionPhase::Polling,
            SessionState::Succeeded { .. } => SessionPhase::Succeeded,
            SessionState::Failed { .. } => SessionPhase::Failed,
        }
    }

    pub fn intent(&self) -> Option<&PaymentIntent> {
        match self {
            SessionState::Init => None,
            SessionState::AwaitingRedirect { intent }
            | SessionState::Polling { intent }
            | SessionState::Succeeded { intent, .. } => Some(intent),
            SessionState::Failed { intent, .. } => intent.as_ref(),
        }
    }

    pub fn artifacts(&self) -> &[Artifact] {
        match self {
            SessionState::Succeeded { artifacts, .. } => artifacts,
            _ => &[],
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            SessionState::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded { .. } | SessionState::Failed { .. }
        )
    }
}

/// Point-in-time projection of a payment session, served to callers and
/// broadcast to observers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub invoice_id: String,
    pub provider: PaymentProvider,
    pub amount: f64,
    pub currency: String,
    pub state: SessionPhase,
    pub payment_url: Option<String>,
    pub provider_payment_id: Option<String>,
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub last_error: Option<FailureReason>,
    pub artifacts: Vec<Artifact>,
    pub artifact_warning: Option<String>,
    pub disposed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
