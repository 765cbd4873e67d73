//! Request middleware
//!
//! Cross-cutting request concerns applied by the HTTP handlers.

pub mod rate_limit;

pub use rate_limit::RateLimitMiddleware;
