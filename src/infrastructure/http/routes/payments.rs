//! Payments routes

use std::sync::Arc;
use warp::Filter;

use crate::application::services::session_registry::SessionRegistry;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{
    handle_check_now, handle_close, handle_payment_start, handle_payment_status, handle_restart,
    handle_start_polling,
};
use crate::middleware::rate_limit::RateLimitMiddleware;

pub struct PaymentsRoutes;

impl PaymentsRoutes {
    pub fn create_routes(
        config: AppConfig,
        registry: Arc<SessionRegistry>,
        rate_limit: Arc<RateLimitMiddleware>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let start = warp::path("payments")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(
                config.server.max_request_size as u64,
            ))
            .and(warp::body::json())
            .and(Self::client_ip())
            .and(Self::with_registry(registry.clone()))
            .and(Self::with_rate_limit(rate_limit.clone()))
            .and(Self::with_config(config))
            .and_then(handle_payment_start);

        let status = warp::path("payments")
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_registry(registry.clone()))
            .and_then(handle_payment_status);

        let poll = warp::path("payments")
            .and(warp::path::param::<String>())
            .and(warp::path("poll"))
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::client_ip())
            .and(Self::with_registry(registry.clone()))
            .and(Self::with_rate_limit(rate_limit.clone()))
            .and_then(handle_start_polling);

        let check = warp::path("payments")
            .and(warp::path::param::<String>())
            .and(warp::path("check"))
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::client_ip())
            .and(Self::with_registry(registry.clone()))
            .and(Self::with_rate_limit(rate_limit.clone()))
            .and_then(handle_check_now);

        let restart = warp::path("payments")
            .and(warp::path::param::<String>())
            .and(warp::path("restart"))
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::client_ip())
            .and(Self::with_registry(registry.clone()))
            .and(Self::with_rate_limit(rate_limit))
            .and_then(handle_restart);

        let close = warp::path("payments")
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::delete())
            .and(Self::with_registry(registry))
            .and_then(handle_close);

        start.or(status).or(poll).or(check).or(restart).or(close)
    }

    fn client_ip(
    ) -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
        warp::header::optional::<String>("x-forwarded-for")
    }

    fn with_registry(
        registry: Arc<SessionRegistry>,
    ) -> impl Filter<Extract = (Arc<SessionRegistry>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || registry.clone())
    }

    fn with_rate_limit(
        rate_limit: Arc<RateLimitMiddleware>,
    ) -> impl Filter<Extract = (Arc<RateLimitMiddleware>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || rate_limit.clone())
    }

    fn with_config(
        config: AppConfig,
    ) -> impl Filter<Extract = (AppConfig,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || config.clone())
    }
}
