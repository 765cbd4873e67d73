//! Metrics HTTP handler

use std::sync::Arc;

use crate::infrastructure::http::handlers::json_reply;
use crate::shared::metrics::MetricsUtils;

pub async fn handle_metrics(
    metrics: Arc<MetricsUtils>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    Ok(json_reply(
        &metrics.get_metrics(),
        warp::http::StatusCode::OK,
    ))
}
