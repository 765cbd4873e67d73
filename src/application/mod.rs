//! Application layer - Services orchestrating the payment domain

pub mod services;

pub use services::*;
