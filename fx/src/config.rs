//! Rate engine configuration.

use std::time::Duration;

use ratewise_common::constants;
use ratewise_common::DurationExt;

/// What the engine reports when fetching fails and nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFallback {
    /// Fail with `FxError::NoCacheAvailable`, carrying the fetch error.
    #[default]
    NoCacheAvailable,
    /// Fail with the fetch error itself.
    SurfaceFetchError,
}

/// Retry and backoff settings for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles on every further failure.
    pub base_delay: Duration,
    /// Upper bound for a single delay. `None` means uncapped.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: constants::default_backoff_base().as_std(),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (0-based):
    /// `min(base_delay * 2^attempt, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Settings for the conversion decision procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Cached rates younger than this are used without fetching.
    pub cache_ttl: Duration,
    /// Outcome when fetching fails with nothing cached.
    pub on_missing_fallback: MissingFallback,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: constants::default_cache_ttl().as_std(),
            on_missing_fallback: MissingFallback::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxConfig {
    /// Base URL of the remote pricing source.
    pub api_base_url: String,
    /// Timeout for a single HTTP request.
    pub network_timeout: Duration,
    /// Engine settings.
    pub engine: EngineConfig,
    /// Retry settings.
    pub retry: RetryPolicy,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.currencyapi.com".to_string(),
            network_timeout: constants::default_network_timeout().as_std(),
            engine: EngineConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RATEWISE_API_BASE_URL") {
            config.api_base_url = url;
        }

        if let Some(secs) = env_parse::<u64>("RATEWISE_CACHE_TTL_SECS") {
            config.engine.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("RATEWISE_NETWORK_TIMEOUT_SECS") {
            config.network_timeout = Duration::from_secs(secs);
        }

        if let Some(attempts) = env_parse::<u32>("RATEWISE_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts;
        }

        if let Some(ms) = env_parse::<u64>("RATEWISE_BACKOFF_BASE_MS") {
            config.retry.base_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = env_parse::<u64>("RATEWISE_BACKOFF_MAX_MS") {
            config.retry.max_delay = Some(Duration::from_millis(ms));
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.trim().is_empty() {
            return Err("API base URL cannot be empty".to_string());
        }

        if self.network_timeout.is_zero() {
            return Err("Network timeout cannot be zero".to_string());
        }

        if self.retry.max_attempts == 0 {
            return Err("At least one attempt is required".to_string());
        }

        if let Some(max) = self.retry.max_delay {
            if max < self.retry.base_delay {
                return Err("Maximum backoff delay cannot be below the base delay".to_string());
            }
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.network_timeout, Duration::from_secs(20));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.retry.max_delay, None);
        assert_eq!(
            config.engine.on_missing_fallback,
            MissingFallback::NoCacheAvailable
        );
    }

    #[test]
    fn test_invalid_config() {
        let mut config = FxConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = FxConfig::default();
        config.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = FxConfig::default();
        config.retry.max_delay = Some(Duration::from_millis(100));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_without_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_respects_cap() {
        let policy = RetryPolicy {
            max_delay: Some(Duration::from_millis(1500)),
            ..Default::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(1500));
    }

    #[test]
    fn test_backoff_saturates_on_huge_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for(64) >= policy.delay_for(10));
    }
}
