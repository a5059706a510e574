//! Normalised market data consumed by the flow engine.

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single aggressor trade execution.
///
/// `is_seller_aggressor` is true when the buyer was the resting (maker) order, ie/ the
/// incoming sell order crossed the book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct TradeEvent {
    pub price: Decimal,
    pub quantity: Decimal,
    pub is_seller_aggressor: bool,
    pub sequence: u64,
    pub time: DateTime<Utc>,
}

/// Price/quantity level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct Level {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Top-N order book levels, best price first on each side.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize, Constructor)]
pub struct OrderBookDepth {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

/// Aggregated resting volume on each side of the book at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct DepthSnapshot {
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    pub sampled_at: DateTime<Utc>,
}
