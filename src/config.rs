use std::{env, time::Duration};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the external booking backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the environment. `BOOKING_API_BASE_URL` is
    /// required; `BOOKING_API_TIMEOUT_SECS` falls back to 10 seconds.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        if cfg!(debug_assertions) {
            dotenv::dotenv().ok();
        }

        let base_url = env::var("BOOKING_API_BASE_URL")
            .map_err(|_| "BOOKING_API_BASE_URL environment variable not set")?;

        let timeout_secs = env::var("BOOKING_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = ApiConfig::new("http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_with_timeout_override() {
        let config =
            ApiConfig::new("http://localhost:8080").with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
