//! Metrics route

use std::sync::Arc;
use warp::Filter;

use crate::infrastructure::http::handlers::handle_metrics;
use crate::shared::metrics::MetricsUtils;

pub struct MetricsRoutes;

impl MetricsRoutes {
    pub fn create_routes(
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::any().map(move || metrics.clone()))
            .and_then(handle_metrics)
    }
}
