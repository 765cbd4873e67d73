//! Infrastructure layer - External concerns and adapters
//!
//! This module contains infrastructure concerns including the gateway
//! adapters and the HTTP surface.

pub mod adapters;
pub mod http;

pub use adapters::{ArtifactSource, GatewayApi, HttpArtifactFetcher, HttpGatewayClient};
pub use http::HttpServer;
