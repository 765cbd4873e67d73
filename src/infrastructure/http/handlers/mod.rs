//! HTTP handlers
//!
//! Thin translation layer between warp requests and the application
//! services. Every error renders as `{"error": ...}` with the status from
//! `AppError::http_status_code`.

pub mod health;
pub mod metrics;
pub mod payments;

use warp::Reply;

use crate::infrastructure::http::models::ErrorReply;
use crate::shared::error::AppError;

pub use health::handle_health;
pub use metrics::handle_metrics;
pub use payments::{
    handle_check_now, handle_close, handle_payment_start, handle_payment_status, handle_restart,
    handle_start_polling,
};

pub(crate) fn json_reply<T: serde::Serialize>(
    value: &T,
    status: warp::http::StatusCode,
) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

pub(crate) fn error_reply(err: &AppError) -> warp::reply::Response {
    json_reply(
        &ErrorReply {
            error: err.to_string(),
        },
        err.http_status_code(),
    )
}

/// Render rejections raised by the filters themselves (bad bodies, unknown
/// paths, oversized payloads) in the same JSON error shape.
pub async fn handle_rejection(
    rejection: warp::Rejection,
) -> Result<warp::reply::Response, std::convert::Infallible> {
    use warp::http::StatusCode;

    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "resource not found".to_string())
    } else if let Some(err) = rejection.find::<AppError>() {
        (err.http_status_code(), err.to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request too large".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed".to_string(),
        )
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(json_reply(&ErrorReply { error: message }, status))
}
