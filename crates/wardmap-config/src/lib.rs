//! # Wardmap Config
//!
//! Environment-driven configuration for the Wardmap API:
//!
//! - [`jwt`]: token secrets and lifetimes
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: governor buckets for general and auth routes
//! - [`upload`]: content root and upload limits
//!
//! Every `from_env` falls back to a development default when a variable is
//! missing or unparsable.

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod upload;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::{IpGovernorConfig, RateLimitConfig};
pub use upload::UploadConfig;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
