//! Time utilities and default timings.

use chrono::{DateTime, Duration, Utc};

/// Default timings used by the rate engine.
pub mod constants {
    use super::Duration;

    /// How long a cached rate is trusted without refetching (1 hour).
    pub fn default_cache_ttl() -> Duration {
        Duration::seconds(3600)
    }

    /// Per-request network timeout (20 seconds).
    pub fn default_network_timeout() -> Duration {
        Duration::seconds(20)
    }

    /// Delay before the first retry (500 milliseconds).
    pub fn default_backoff_base() -> Duration {
        Duration::milliseconds(500)
    }

    /// Total attempts made for one fetch.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
}

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(constants::default_cache_ttl().num_seconds(), 3600);
        assert_eq!(constants::default_network_timeout().num_seconds(), 20);
        assert_eq!(constants::default_backoff_base().num_milliseconds(), 500);
        assert_eq!(constants::DEFAULT_MAX_ATTEMPTS, 5);
    }

    #[test]
    fn test_negative_duration_as_std_is_zero() {
        assert_eq!(Duration::seconds(-5).as_std(), std::time::Duration::ZERO);
        assert_eq!(
            Duration::milliseconds(1500).as_std(),
            std::time::Duration::from_millis(1500)
        );
    }
}
