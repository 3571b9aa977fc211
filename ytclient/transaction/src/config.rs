use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval between heartbeats (5 seconds).
const DEFAULT_PING_PERIOD: Duration = Duration::from_secs(5);

/// Client-side settings of a transaction session.
///
/// Durations are written in humantime form (`"5s"`, `"500ms"`) when loaded
/// from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionConfig {
    /// Keep the transaction alive with periodic heartbeats.
    #[serde(default = "default_ping")]
    pub ping: bool,

    /// Ask the server to extend the leases of ancestor transactions too.
    #[serde(default)]
    pub ping_ancestors: bool,

    /// Pin every request of the transaction to the proxy that started it.
    #[serde(default)]
    pub sticky: bool,

    /// Delay between successful heartbeats. Zero disables the heartbeat loop.
    #[serde(with = "humantime_serde", default = "default_ping_period")]
    pub ping_period: Duration,

    /// Delay before retrying a failed heartbeat; falls back to `ping_period`.
    #[serde(with = "humantime_serde", default)]
    pub failed_ping_retry_period: Option<Duration>,

    /// Server-side lease of the transaction.
    #[serde(with = "humantime_serde", default)]
    pub timeout: Option<Duration>,
}

fn default_ping() -> bool {
    true
}

fn default_ping_period() -> Duration {
    DEFAULT_PING_PERIOD
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            ping: default_ping(),
            ping_ancestors: false,
            sticky: false,
            ping_period: DEFAULT_PING_PERIOD,
            failed_ping_retry_period: None,
            timeout: None,
        }
    }
}

impl TransactionConfig {
    pub fn with_ping(mut self, ping: bool) -> Self {
        self.ping = ping;
        self
    }

    pub fn with_ping_ancestors(mut self, ping_ancestors: bool) -> Self {
        self.ping_ancestors = ping_ancestors;
        self
    }

    pub fn with_sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    pub fn with_ping_period(mut self, ping_period: Duration) -> Self {
        self.ping_period = ping_period;
        self
    }

    pub fn with_failed_ping_retry_period(mut self, period: Duration) -> Self {
        self.failed_ping_retry_period = Some(period);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether a heartbeat loop runs for sessions built from this config.
    pub fn heartbeat_enabled(&self) -> bool {
        self.ping && !self.ping_period.is_zero()
    }

    /// Retry delay after a failed heartbeat.
    pub fn effective_failed_ping_retry_period(&self) -> Duration {
        match self.failed_ping_retry_period {
            Some(period) if !period.is_zero() => period,
            _ => self.ping_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransactionConfig::default();
        assert!(config.ping);
        assert!(!config.sticky);
        assert_eq!(config.ping_period, Duration::from_secs(5));
        assert!(config.heartbeat_enabled());
        assert_eq!(
            config.effective_failed_ping_retry_period(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_failed_ping_retry_period_fallback() {
        let config = TransactionConfig::default()
            .with_ping_period(Duration::from_secs(2))
            .with_failed_ping_retry_period(Duration::ZERO);
        assert_eq!(
            config.effective_failed_ping_retry_period(),
            Duration::from_secs(2)
        );

        let config = config.with_failed_ping_retry_period(Duration::from_millis(300));
        assert_eq!(
            config.effective_failed_ping_retry_period(),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_heartbeat_disabled() {
        assert!(!TransactionConfig::default().with_ping(false).heartbeat_enabled());
        assert!(
            !TransactionConfig::default()
                .with_ping_period(Duration::ZERO)
                .heartbeat_enabled()
        );
    }

    #[test]
    fn test_deserialize_humantime() {
        let config: TransactionConfig = serde_json::from_str(
            r#"{"sticky": true, "ping_period": "1s", "failed_ping_retry_period": "250ms"}"#,
        )
        .unwrap();
        assert!(config.ping);
        assert!(config.sticky);
        assert_eq!(config.ping_period, Duration::from_secs(1));
        assert_eq!(
            config.failed_ping_retry_period,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_str::<TransactionConfig>(r#"{"pingg": true}"#);
        assert!(result.is_err());
    }
}
