//! Application services - Orchestration of the payment confirmation flow

pub mod payment_session;
pub mod poll_controller;
pub mod session_registry;

pub use payment_session::{PaymentSession, SessionParams};
pub use poll_controller::{AttemptRecord, PollController};
pub use session_registry::{OpenSessionRequest, SessionRegistry};
