//! HTTP infrastructure module
//!
//! This module contains the service's HTTP surface: wire models, the warp
//! server, routes, and handlers.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use models::{ErrorReply, StartPaymentRequest};
pub use server::HttpServer;
