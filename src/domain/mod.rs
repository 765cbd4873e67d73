//! Domain layer - Core business logic and domain models
//!
//! This module contains the payment domain models and business rules,
//! independent of infrastructure concerns like HTTP or timers.

pub mod health;
pub mod payment;

pub use health::{HealthResponse, HealthStatus};
pub use payment::{
    Artifact, ArtifactKind, CreatePaymentRequest, FailureReason, GatewayStatus, PaymentIntent,
    PaymentProvider, SessionPhase, SessionSnapshot, SessionState,
};
