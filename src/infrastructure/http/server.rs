//! HTTP server for the payment confirmation service
//!
//! Wires the adapters, the session registry, and the route tree, and runs
//! the warp server. Intended for deployment behind a reverse proxy that
//! handles TLS and CORS.

use std::sync::Arc;

use tracing::info;
use warp::{Filter, Reply};

use crate::application::services::session_registry::SessionRegistry;
use crate::config::AppConfig;
use crate::infrastructure::adapters::{
    ArtifactSource, GatewayApi, HttpArtifactFetcher, HttpGatewayClient,
};
use crate::infrastructure::http::handlers::handle_rejection;
use crate::infrastructure::http::routes::{HealthRoutes, MetricsRoutes, PaymentsRoutes};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::MetricsUtils;

/// HTTP server owning the service's shared state
pub struct HttpServer {
    config: AppConfig,
    registry: Arc<SessionRegistry>,
    metrics: Arc<MetricsUtils>,
    rate_limit: Arc<RateLimitMiddleware>,
}

impl HttpServer {
    /// Create a server with the real gateway and artifact adapters
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let gateway: Arc<dyn GatewayApi> = Arc::new(HttpGatewayClient::new(&config.gateway)?);
        let artifacts: Arc<dyn ArtifactSource> =
            Arc::new(HttpArtifactFetcher::new(&config.gateway, &config.artifacts)?);
        Ok(Self::from_parts(config, gateway, artifacts))
    }

    /// Create a server around caller-provided adapters
    pub fn from_parts(
        config: AppConfig,
        gateway: Arc<dyn GatewayApi>,
        artifacts: Arc<dyn ArtifactSource>,
    ) -> Self {
        let metrics = Arc::new(MetricsUtils::new());
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(config.clone()),
            gateway,
            artifacts,
            metrics.clone(),
        ));
        let rate_limit = Arc::new(RateLimitMiddleware::new(&config.rate_limit));
        Self {
            config,
            registry,
            metrics,
            rate_limit,
        }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the HTTP server
    pub async fn run(self) -> AppResult<()> {
        let addr: std::net::SocketAddr = self
            .config
            .server_address()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        info!("Starting payment confirmation server on {}", addr);
        warp::serve(self.create_routes()).run(addr).await;

        Ok(())
    }

    /// Build the full route tree
    pub fn create_routes(
        self,
    ) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        let payments = PaymentsRoutes::create_routes(
            self.config.clone(),
            self.registry.clone(),
            self.rate_limit.clone(),
        );
        let health = HealthRoutes::create_routes(self.registry.clone(), self.metrics.clone());
        let metrics = MetricsRoutes::create_routes(self.metrics.clone());

        payments.or(health).or(metrics).recover(handle_rejection)
    }

    /// Registry accessor for integration tests and embedding callers
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }
}
