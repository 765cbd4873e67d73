//! Payments HTTP handlers

use std::sync::Arc;

use tracing::debug;
use warp::Reply;

use crate::application::services::session_registry::{OpenSessionRequest, SessionRegistry};
use crate::application::services::PaymentSession;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{error_reply, json_reply};
use crate::infrastructure::http::models::StartPaymentRequest;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Open a session and create the payment intent. The caller is expected to
/// direct the user to the returned `payment_url`.
pub async fn handle_payment_start(
    body: StartPaymentRequest,
    client_ip: Option<String>,
    registry: Arc<SessionRegistry>,
    rate_limit: Arc<RateLimitMiddleware>,
    config: AppConfig,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    if let Err(err) = rate_limit.check(client_ip.as_deref().unwrap_or("unknown")) {
        return Ok(error_reply(&err));
    }

    let session = match registry
        .open(OpenSessionRequest {
            invoice_id: body.invoice_id,
            amount: body.amount,
            currency: body.currency,
            provider: body.provider,
            return_url: body.return_url,
            cancel_url: body.cancel_url,
        })
        .await
    {
        Ok(session) => session,
        Err(err) => return Ok(error_reply(&err)),
    };

    match session.initiate().await {
        Ok(_) => {
            if config.polling.auto_start {
                schedule_auto_start(session.clone(), config.polling.auto_start_delay());
            }
            Ok(json_reply(&session.snapshot(), warp::http::StatusCode::OK))
        }
        Err(err) => Ok(error_reply(&err)),
    }
}

/// Start polling after the configured grace period, unless the caller
/// already started it (or the session moved on) in the meantime.
fn schedule_auto_start(session: Arc<PaymentSession>, delay: std::time::Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = session.start_polling() {
            debug!(
                invoice_id = %session.invoice_id(),
                error = %err,
                "automatic polling start skipped"
            );
        }
    });
}

/// Current snapshot of an invoice's payment session
pub async fn handle_payment_status(
    invoice_id: String,
    registry: Arc<SessionRegistry>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    match registry.get(&invoice_id).await {
        Ok(session) => Ok(json_reply(&session.snapshot(), warp::http::StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

/// Explicit transition into polling
pub async fn handle_start_polling(
    invoice_id: String,
    client_ip: Option<String>,
    registry: Arc<SessionRegistry>,
    rate_limit: Arc<RateLimitMiddleware>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    if let Err(err) = rate_limit.check(client_ip.as_deref().unwrap_or("unknown")) {
        return Ok(error_reply(&err));
    }
    let result = match registry.get(&invoice_id).await {
        Ok(session) => session.start_polling().map(|_| session.snapshot()),
        Err(err) => Err(err),
    };
    match result {
        Ok(snapshot) => Ok(json_reply(&snapshot, warp::http::StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

/// Manual status check, without waiting for the next scheduled tick
pub async fn handle_check_now(
    invoice_id: String,
    client_ip: Option<String>,
    registry: Arc<SessionRegistry>,
    rate_limit: Arc<RateLimitMiddleware>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    if let Err(err) = rate_limit.check(client_ip.as_deref().unwrap_or("unknown")) {
        return Ok(error_reply(&err));
    }
    let result = match registry.get(&invoice_id).await {
        Ok(session) => session.check_now().await,
        Err(err) => Err(err),
    };
    match result {
        Ok(snapshot) => Ok(json_reply(&snapshot, warp::http::StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

/// Reset a failed session back to `Init`
pub async fn handle_restart(
    invoice_id: String,
    client_ip: Option<String>,
    registry: Arc<SessionRegistry>,
    rate_limit: Arc<RateLimitMiddleware>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    if let Err(err) = rate_limit.check(client_ip.as_deref().unwrap_or("unknown")) {
        return Ok(error_reply(&err));
    }
    let result = match registry.get(&invoice_id).await {
        Ok(session) => session.restart(),
        Err(err) => Err(err),
    };
    match result {
        Ok(snapshot) => Ok(json_reply(&snapshot, warp::http::StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

/// Dispose and drop the session (payment dialog closed)
pub async fn handle_close(
    invoice_id: String,
    registry: Arc<SessionRegistry>,
) -> Result<warp::reply::Response, warp::reject::Rejection> {
    match registry.remove(&invoice_id).await {
        Ok(()) => Ok(
            warp::reply::with_status(warp::reply(), warp::http::StatusCode::NO_CONTENT)
                .into_response(),
        ),
        Err(err) => Ok(error_reply(&err)),
    }
}
