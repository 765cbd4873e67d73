//! Error handling module
//!
//! Centralized error types for the payment confirmation service. The typed
//! gateway/artifact errors are the retry-policy inputs consumed by the
//! session state machine; `AppError` is the surface the HTTP layer renders.

use thiserror::Error;

/// Failure to create a payment intent at the gateway.
///
/// Terminal for the current attempt: the session moves to `Failed` and an
/// explicit `restart()` is required before trying again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitiationError {
    #[error("gateway unreachable: {0}")]
    Network(String),

    #[error("gateway rejected payment intent: {0}")]
    Rejected(String),
}

/// Failure of a single status check.
///
/// Transient: polling treats it as `Pending` up to the attempt budget. A
/// legitimate `pending` status is a normal result, never a `CheckError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("status check failed: {0}")]
    Network(String),
}

/// Failure to retrieve post-payment artifacts.
///
/// Non-fatal: the payment stands as succeeded and the failure surfaces as a
/// dismissible warning on the session snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("artifact fetch failed: {0}")]
    Network(String),

    #[error("artifact payload malformed: {0}")]
    Malformed(String),
}

/// Application error types
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Initiation(#[from] InitiationError),

    #[error("No payment session for invoice {invoice_id}")]
    UnknownInvoice { invoice_id: String },

    #[error("Operation {operation} is not valid in state {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Payment session has been disposed")]
    SessionDisposed,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> warp::http::StatusCode {
        match self {
            AppError::Validation(_) => warp::http::StatusCode::BAD_REQUEST,
            AppError::Initiation(InitiationError::Network(_)) => warp::http::StatusCode::BAD_GATEWAY,
            AppError::Initiation(InitiationError::Rejected(_)) => {
                warp::http::StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::UnknownInvoice { .. } => warp::http::StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => warp::http::StatusCode::CONFLICT,
            AppError::SessionDisposed => warp::http::StatusCode::GONE,
            AppError::RateLimit => warp::http::StatusCode::TOO_MANY_REQUESTS,
            _ => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

// Implement warp::reject::Reject for AppError
impl warp::reject::Reject for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
