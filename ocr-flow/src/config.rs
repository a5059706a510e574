//! Feed and session configuration.
//!
//! Every value has a default matching Binance production endpoints and may be overridden
//! through the builder methods or the `OCR_*` environment variables read by `from_env`.

use crate::{depth::DEFAULT_DEPTH_LEVELS, feed::timeout::DEFAULT_WS_READ_TIMEOUT};
use smol_str::SmolStr;
use std::{str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_TRADE_STREAM_URL: &str = "wss://stream.binance.com:9443/ws";
pub const DEFAULT_REST_BASE_URL: &str = "https://fapi.binance.com";
pub const DEFAULT_PREFERRED_QUOTE: &str = "USDT";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Connection settings for the trade stream, depth and exchange info endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Base URL of the raw trade stream, `<symbol>@aggTrade` is appended
    pub trade_stream_url: String,
    /// Base URL of the REST API serving depth and exchange info
    pub rest_base_url: String,
    /// Trade stream is considered dead after this long without any frame
    pub read_timeout: Duration,
    /// Per-request timeout for REST calls
    pub request_timeout: Duration,
    /// Quote asset preferred when resolving a coin to a tradable symbol
    pub preferred_quote: SmolStr,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            trade_stream_url: DEFAULT_TRADE_STREAM_URL.to_string(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            read_timeout: DEFAULT_WS_READ_TIMEOUT,
            request_timeout: DEFAULT_HTTP_TIMEOUT,
            preferred_quote: SmolStr::new_static(DEFAULT_PREFERRED_QUOTE),
        }
    }
}

impl FeedConfig {
    /// Defaults overridden by `OCR_TRADE_STREAM_URL`, `OCR_REST_URL`,
    /// `OCR_WS_READ_TIMEOUT_SECS`, `OCR_HTTP_TIMEOUT_MS` and `OCR_PREFERRED_QUOTE`.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            trade_stream_url: std::env::var("OCR_TRADE_STREAM_URL")
                .unwrap_or(default.trade_stream_url),
            rest_base_url: std::env::var("OCR_REST_URL").unwrap_or(default.rest_base_url),
            read_timeout: env_parse_non_zero("OCR_WS_READ_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.read_timeout),
            request_timeout: env_parse_non_zero("OCR_HTTP_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.request_timeout),
            preferred_quote: std::env::var("OCR_PREFERRED_QUOTE")
                .map(|quote| SmolStr::new(quote.to_uppercase()))
                .unwrap_or(default.preferred_quote),
        }
    }

    pub fn with_trade_stream_url(mut self, url: impl Into<String>) -> Self {
        self.trade_stream_url = url.into();
        self
    }

    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_preferred_quote(mut self, quote: impl Into<SmolStr>) -> Self {
        self.preferred_quote = quote.into();
        self
    }
}

/// Settings for one analysis session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Cadence of order book depth polls
    pub poll_interval: Duration,
    /// Price levels aggregated on each side of the book
    pub depth_levels: usize,
    /// Capacity of the channel feeding updates to the session task
    pub update_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            depth_levels: DEFAULT_DEPTH_LEVELS,
            update_buffer_size: 10_000,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `OCR_POLL_INTERVAL_MS`, `OCR_DEPTH_LEVELS` and
    /// `OCR_UPDATE_BUFFER_SIZE`.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            poll_interval: env_parse_non_zero("OCR_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.poll_interval),
            depth_levels: env_parse_non_zero("OCR_DEPTH_LEVELS")
                .unwrap_or(default.depth_levels),
            update_buffer_size: env_parse_non_zero("OCR_UPDATE_BUFFER_SIZE")
                .unwrap_or(default.update_buffer_size),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_depth_levels(mut self, levels: usize) -> Self {
        self.depth_levels = levels;
        self
    }

    pub fn with_update_buffer_size(mut self, size: usize) -> Self {
        self.update_buffer_size = size;
        self
    }
}

/// Parse an environment variable, warning (and returning `None`) if it is set but invalid.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%name, value = %raw, "ignoring invalid environment value, using default");
            None
        }
    }
}

/// [`env_parse`] that also rejects zero, with the same warning.
fn env_parse_non_zero<T>(name: &str) -> Option<T>
where
    T: FromStr + Default + PartialEq,
{
    let value = env_parse::<T>(name)?;
    if value == T::default() {
        warn!(%name, "ignoring zero environment value, using default");
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_config_builder() {
        let config = FeedConfig::default()
            .with_trade_stream_url("ws://localhost:9001/ws")
            .with_rest_base_url("http://localhost:8080")
            .with_read_timeout(Duration::from_secs(15))
            .with_request_timeout(Duration::from_millis(250))
            .with_preferred_quote("USDC");

        assert_eq!(config.trade_stream_url, "ws://localhost:9001/ws");
        assert_eq!(config.rest_base_url, "http://localhost:8080");
        assert_eq!(config.read_timeout, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.preferred_quote, "USDC");
    }

    #[test]
    fn test_default_feed_config() {
        let config = FeedConfig::default();
        assert_eq!(config.trade_stream_url, "wss://stream.binance.com:9443/ws");
        assert_eq!(config.rest_base_url, "https://fapi.binance.com");
        assert_eq!(config.read_timeout, Duration::from_secs(120));
        assert_eq!(config.preferred_quote, "USDT");
    }

    #[test]
    fn test_default_session_config() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.depth_levels, 10);
        assert_eq!(config.update_buffer_size, 10_000);

        let config = config
            .with_poll_interval(Duration::from_millis(20))
            .with_depth_levels(5)
            .with_update_buffer_size(16);
        assert_eq!(config.poll_interval, Duration::from_millis(20));
        assert_eq!(config.depth_levels, 5);
        assert_eq!(config.update_buffer_size, 16);
    }

    #[test]
    fn test_env_parse_non_zero() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("OCR_TEST_NON_ZERO_ZERO", "0");
            std::env::set_var("OCR_TEST_NON_ZERO_VALID", " 250 ");
            std::env::set_var("OCR_TEST_NON_ZERO_INVALID", "soon");
        }

        assert_eq!(env_parse_non_zero::<u64>("OCR_TEST_NON_ZERO_ZERO"), None);
        assert_eq!(env_parse::<u64>("OCR_TEST_NON_ZERO_ZERO"), Some(0));
        assert_eq!(env_parse_non_zero::<u64>("OCR_TEST_NON_ZERO_VALID"), Some(250));
        assert_eq!(env_parse_non_zero::<usize>("OCR_TEST_NON_ZERO_INVALID"), None);
        assert_eq!(env_parse_non_zero::<u64>("OCR_TEST_VARIABLE_THAT_IS_NEVER_SET"), None);
    }

    #[test]
    fn test_env_parse_unset_is_none() {
        assert_eq!(env_parse::<u64>("OCR_TEST_VARIABLE_THAT_IS_NEVER_SET"), None);
    }
}
