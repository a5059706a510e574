use crate::{
    error::{FeedError, MalformedMessageError, StreamConnectionError},
    feed::{TradeSource, TradeStream, timeout::TimeoutStream},
    model::TradeEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, future};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info};

/// Binance aggregate trade stream over a raw WebSocket endpoint
/// (`<base>/<symbol>@aggTrade`).
#[derive(Debug, Clone)]
pub struct BinanceTradeSource {
    base_url: String,
    read_timeout: Duration,
}

impl BinanceTradeSource {
    pub fn new(base_url: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            read_timeout,
        }
    }

    /// Stream URL for `symbol`. Binance stream names are lowercase.
    pub fn stream_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}@aggTrade",
            self.base_url.trim_end_matches('/'),
            symbol.to_lowercase()
        )
    }
}

#[async_trait]
impl TradeSource for BinanceTradeSource {
    async fn connect(&self, symbol: &str) -> Result<TradeStream, StreamConnectionError> {
        let url = self.stream_url(symbol);

        let (websocket, _) =
            connect_async(url.as_str())
                .await
                .map_err(|error| StreamConnectionError::Connect {
                    url: url.clone(),
                    reason: error.to_string(),
                })?;

        info!(%url, "connected to Binance aggTrade stream");

        let stream = TimeoutStream::new(websocket, self.read_timeout)
            .filter_map(|message| future::ready(transform_message(message)))
            .boxed();

        Ok(stream)
    }
}

/// Map a raw WebSocket frame to a trade stream item. Control frames yield `None`.
fn transform_message(
    message: Result<Message, tungstenite::Error>,
) -> Option<Result<TradeEvent, FeedError>> {
    match message {
        Ok(Message::Text(text)) => Some(parse_agg_trade(text.as_str()).map_err(FeedError::from)),
        Ok(Message::Close(frame)) => {
            let reason = frame
                .map(|frame| format!("{} {}", frame.code, frame.reason))
                .unwrap_or_else(|| "no close frame".to_string());
            Some(Err(StreamConnectionError::Closed(reason).into()))
        }
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
            // Heartbeat - tungstenite replies to pings automatically
            None
        }
        Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => None,
        Err(error) => Some(Err(StreamConnectionError::Socket(error.to_string()).into())),
    }
}

/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#aggregate-trade-streams>
/// ```json
/// {
///     "e": "aggTrade",
///     "E": 1672515782136,
///     "s": "BNBBTC",
///     "a": 12345,
///     "p": "0.001",
///     "q": "100",
///     "f": 100,
///     "l": 105,
///     "T": 1672515782136,
///     "m": true,
///     "M": true
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BinanceAggTrade {
    #[serde(rename = "a")]
    pub id: u64,

    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,

    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quantity: Decimal,

    #[serde(rename = "T")]
    pub trade_time_ms: i64,

    /// Buyer was the maker, ie/ the seller was the aggressor.
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,
}

impl TryFrom<BinanceAggTrade> for TradeEvent {
    type Error = MalformedMessageError;

    fn try_from(trade: BinanceAggTrade) -> Result<Self, Self::Error> {
        if trade.quantity.is_sign_negative() && !trade.quantity.is_zero() {
            return Err(MalformedMessageError::NegativeQuantity(trade.quantity));
        }

        let time = DateTime::<Utc>::from_timestamp_millis(trade.trade_time_ms)
            .ok_or(MalformedMessageError::InvalidTimestamp(trade.trade_time_ms))?;

        Ok(TradeEvent::new(
            trade.price,
            trade.quantity,
            trade.buyer_is_maker,
            trade.id,
            time,
        ))
    }
}

/// Parse a Binance `aggTrade` text payload into a [`TradeEvent`].
pub fn parse_agg_trade(payload: &str) -> Result<TradeEvent, MalformedMessageError> {
    let trade = serde_json::from_str::<BinanceAggTrade>(payload).map_err(|error| {
        debug!(%error, %payload, "failed to deserialise aggTrade message");
        MalformedMessageError::Decode {
            error: error.to_string(),
            payload: payload.chars().take(256).collect(),
        }
    })?;

    TradeEvent::try_from(trade)
}
