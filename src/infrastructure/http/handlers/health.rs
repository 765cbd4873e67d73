//! Health HTTP handler

use std::sync::Arc;

use crate::application::services::session_registry::SessionRegistry;
use crate::domain::{HealthResponse, HealthStatus};
use crate::infrastructure::http::handlers::json_reply;
use crate::shared::metrics::MetricsUtils;

/// Transport failures in a row before the gateway is reported degraded
const DEGRADED_AFTER_CONSECUTIVE_FAILURES: u64 = 3;

pub async fn handle_health(
    registry: Arc<SessionRegistry>,
    metrics: Arc<MetricsUtils>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    let consecutive_failures = metrics.consecutive_check_failures();
    let status = if consecutive_failures >= DEGRADED_AFTER_CONSECUTIVE_FAILURES {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse::new(
        status,
        serde_json::json!({
            "live_sessions": registry.session_count().await,
            "consecutive_check_failures": consecutive_failures,
        }),
    );
    Ok(json_reply(&response, warp::http::StatusCode::OK))
}
