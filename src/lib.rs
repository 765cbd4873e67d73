//! Clinic payment confirmation service
//!
//! After an invoice payment is handed off to an external gateway, nothing
//! tells us synchronously when it completes. This crate creates the payment
//! intent, exposes the redirect URL to the caller, and reconciles completion
//! by polling the gateway's status endpoint under a bounded attempt budget,
//! with cancellation-safe timers, stale-response rejection, and exactly-once
//! post-payment artifact retrieval.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod middleware;
pub mod shared;

#[cfg(test)]
mod tests;

pub use application::services::{PaymentSession, PollController, SessionRegistry};
pub use config::AppConfig;
pub use infrastructure::http::HttpServer;
pub use shared::error::{AppError, AppResult};
