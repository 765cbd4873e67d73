//! Infrastructure adapters module
//!
//! Adapters for the external collaborators: the payment gateway backend and
//! the post-payment artifact endpoint.

pub mod artifact_fetcher;
pub mod gateway_client;

pub use artifact_fetcher::{ArtifactSource, HttpArtifactFetcher};
pub use gateway_client::{GatewayApi, HttpGatewayClient};
