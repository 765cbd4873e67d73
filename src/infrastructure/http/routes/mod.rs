//! HTTP routes module
//!
//! This module contains all HTTP route configurations.

pub mod health;
pub mod metrics;
pub mod payments;

pub use health::HealthRoutes;
pub use metrics::MetricsRoutes;
pub use payments::PaymentsRoutes;
