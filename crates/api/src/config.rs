use std::time::Duration;

use repairdesk_core::rate_limit::{
    RateLimitPolicy, DEFAULT_SEARCH_MAX_REQUESTS, DEFAULT_SEARCH_WINDOW,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Fixed-window limit applied to every search action, per user and route.
    pub search_rate_limit: RateLimitPolicy,
    /// How often expired rate-limit records and cache entries are swept (default: `60`).
    pub store_sweep_interval_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `SEARCH_RATE_LIMIT_MAX`         | `30`                    |
    /// | `SEARCH_RATE_LIMIT_WINDOW_SECS` | `60`                    |
    /// | `STORE_SWEEP_INTERVAL_SECS`     | `60`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_requests: u32 = std::env::var("SEARCH_RATE_LIMIT_MAX")
            .unwrap_or_else(|_| DEFAULT_SEARCH_MAX_REQUESTS.to_string())
            .parse()
            .expect("SEARCH_RATE_LIMIT_MAX must be a valid u32");

        let window_secs: u64 = std::env::var("SEARCH_RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| DEFAULT_SEARCH_WINDOW.as_secs().to_string())
            .parse()
            .expect("SEARCH_RATE_LIMIT_WINDOW_SECS must be a valid u64");

        let store_sweep_interval_secs: u64 = std::env::var("STORE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("STORE_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            store_sweep_interval_secs > 0,
            "STORE_SWEEP_INTERVAL_SECS must be positive"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            search_rate_limit: search_rate_limit(max_requests, window_secs),
            store_sweep_interval_secs,
            jwt,
        }
    }
}

/// Search rate-limit policy from its env values.
///
/// # Panics
///
/// Panics if either value is zero: a zero window opens a fresh window for
/// every request, and a zero maximum rejects every search.
fn search_rate_limit(max_requests: u32, window_secs: u64) -> RateLimitPolicy {
    assert!(max_requests > 0, "SEARCH_RATE_LIMIT_MAX must be positive");
    assert!(window_secs > 0, "SEARCH_RATE_LIMIT_WINDOW_SECS must be positive");
    RateLimitPolicy::new(max_requests, Duration::from_secs(window_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_rate_limit_from_env_values() {
        let policy = search_rate_limit(30, 60);
        assert_eq!(policy, RateLimitPolicy::new(30, Duration::from_secs(60)));
    }

    #[test]
    #[should_panic(expected = "SEARCH_RATE_LIMIT_WINDOW_SECS must be positive")]
    fn zero_window_is_rejected() {
        search_rate_limit(30, 0);
    }

    #[test]
    #[should_panic(expected = "SEARCH_RATE_LIMIT_MAX must be positive")]
    fn zero_max_is_rejected() {
        search_rate_limit(0, 60);
    }
}
