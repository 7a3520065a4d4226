//! Settings for [`HyperTransport`](crate::HyperTransport).
//!
//! `timeout` bounds the whole exchange: waiting for the response head and
//! then reading the body are each limited by it. A request carrying a
//! positive `timeout` option (in seconds) uses that value instead. The
//! connection pool and TLS connector are built once from the remaining
//! fields when the transport is created.

use std::time::Duration;

/// Transport-wide defaults shared by every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout, unless a request sets the `timeout` option.
    pub timeout: Duration,
    /// Limit on TCP connect plus TLS handshake, applied by the connector.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// How long a pooled connection may sit idle before it is closed.
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Timeout for one request: the request's own `timeout` option when it
    /// set a usable one, otherwise [`ClientConfig::timeout`].
    #[must_use]
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.timeout)
    }
}

/// Builder for [`ClientConfig`]; unset fields keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_suit_a_shared_transport() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn request_timeout_option_wins_over_config() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.effective_timeout(None), Duration::from_secs(5));
        assert_eq!(
            config.effective_timeout(Some(Duration::from_millis(250))),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn builder_overrides_only_what_is_set() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(1))
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
    }
}
