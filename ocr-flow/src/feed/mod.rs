//! Market data sources consumed by a session: a push stream of trades and a request/response
//! order book depth endpoint.

use crate::{
    error::{FeedError, StreamConnectionError, TransientFetchError},
    model::{OrderBookDepth, TradeEvent},
};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Binance trade stream and REST integrations.
pub mod binance;

/// Idle read timeout wrapper for WebSocket streams.
pub mod timeout;

/// Stream of [`TradeEvent`]s for one instrument, in arrival order.
///
/// [`FeedError::Malformed`] items are recoverable, [`FeedError::Connection`] items are terminal.
/// The stream ending is treated as a terminal connection error by the session.
pub type TradeStream = BoxStream<'static, Result<TradeEvent, FeedError>>;

/// Subscribable source of live trades.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn connect(&self, symbol: &str) -> Result<TradeStream, StreamConnectionError>;
}

/// Request/response source of top-N order book levels.
#[async_trait]
pub trait DepthSource: Send + Sync {
    async fn fetch_depth(
        &self,
        symbol: &str,
        levels: usize,
    ) -> Result<OrderBookDepth, TransientFetchError>;
}
