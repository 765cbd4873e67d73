//! Health route

use std::sync::Arc;
use warp::Filter;

use crate::application::services::session_registry::SessionRegistry;
use crate::infrastructure::http::handlers::handle_health;
use crate::shared::metrics::MetricsUtils;

pub struct HealthRoutes;

impl HealthRoutes {
    pub fn create_routes(
        registry: Arc<SessionRegistry>,
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::any().map(move || registry.clone()))
            .and(warp::any().map(move || metrics.clone()))
            .and_then(handle_health)
    }
}
