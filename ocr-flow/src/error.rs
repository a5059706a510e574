use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Non-fatal failure of a single order book depth poll.
///
/// The previous [`DepthSnapshot`](crate::model::DepthSnapshot) is retained and the next poll
/// tick runs as normal.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum TransientFetchError {
    #[error("depth request failed: {0}")]
    Http(String),

    #[error("depth endpoint responded with status {0}")]
    Status(u16),

    #[error("failed to decode depth response: {0}")]
    Decode(String),
}

/// Fatal failure of the trade stream connection. Moves a running session to `Faulted`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum StreamConnectionError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("trade stream closed by remote: {0}")]
    Closed(String),

    #[error("trade stream ended unexpectedly")]
    Ended,
}

/// A single trade stream message that could not be turned into a
/// [`TradeEvent`](crate::model::TradeEvent). The message is dropped.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum MalformedMessageError {
    #[error("failed to deserialise trade message: {error}, payload: {payload}")]
    Decode { error: String, payload: String },

    #[error("trade quantity must not be negative: {0}")]
    NegativeQuantity(Decimal),

    #[error("trade timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

/// Error yielded by a [`TradeStream`](crate::feed::TradeStream).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum FeedError {
    #[error("malformed message: {0}")]
    Malformed(#[from] MalformedMessageError),

    #[error("connection: {0}")]
    Connection(#[from] StreamConnectionError),
}

impl FeedError {
    /// Determine if an error terminates the trade stream (and therefore the session).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedError::Connection(_))
    }
}

/// Failure to load the tradable instrument catalog.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum CatalogError {
    #[error("exchange info request failed: {0}")]
    Http(String),

    #[error("exchange info endpoint responded with status {0}")]
    Status(u16),

    #[error("failed to decode exchange info: {0}")]
    Decode(String),

    #[error("exchange info contains no tradable instruments")]
    Empty,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum ConfigError {
    #[error("invalid {name} url '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors returned by [`SessionController`](crate::session::SessionController) commands.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum SessionError {
    #[error("instrument symbol must not be empty")]
    EmptySymbol,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_feed_error_is_terminal() {
        struct TestCase {
            input: FeedError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: not terminal w/ undecodable payload
                input: FeedError::from(MalformedMessageError::Decode {
                    error: "missing field `p`".to_string(),
                    payload: "{}".to_string(),
                }),
                expected: false,
            },
            TestCase {
                // TC1: not terminal w/ negative quantity
                input: FeedError::from(MalformedMessageError::NegativeQuantity(dec!(-1))),
                expected: false,
            },
            TestCase {
                // TC2: terminal w/ socket error
                input: FeedError::from(StreamConnectionError::Socket(
                    "WebSocket protocol error: Connection reset without closing handshake"
                        .to_string(),
                )),
                expected: true,
            },
            TestCase {
                // TC3: terminal w/ remote close
                input: FeedError::from(StreamConnectionError::Closed("1000 normal".to_string())),
                expected: true,
            },
            TestCase {
                // TC4: terminal w/ stream end
                input: FeedError::from(StreamConnectionError::Ended),
                expected: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_terminal();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_connect_error_display_names_url() {
        let error = StreamConnectionError::Connect {
            url: "wss://stream.binance.com:9443/ws/btcusdt@aggTrade".to_string(),
            reason: "HTTP error: 451".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "failed to connect to wss://stream.binance.com:9443/ws/btcusdt@aggTrade: HTTP error: 451"
        );
    }
}
