use super::history::RatioHistory;
use crate::model::TradeEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative aggressor volume since session start and the derived order-flow ratio (OCR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FlowState {
    pub buy_volume: Decimal,
    pub sell_volume: Decimal,
    /// `(buy - sell) / (buy + sell)`, in `[-1, 1]`. Zero while no volume has traded.
    pub ratio: Decimal,
    pub last_price: Decimal,
}

impl FlowState {
    /// Return the [`FlowState`] that results from applying `trade` to `self`.
    pub fn applied(&self, trade: &TradeEvent) -> Self {
        let (buy_volume, sell_volume) = if trade.is_seller_aggressor {
            (self.buy_volume, self.sell_volume + trade.quantity)
        } else {
            (self.buy_volume + trade.quantity, self.sell_volume)
        };

        Self {
            buy_volume,
            sell_volume,
            ratio: order_flow_ratio(buy_volume, sell_volume),
            last_price: trade.price,
        }
    }

    pub fn total_volume(&self) -> Decimal {
        self.buy_volume + self.sell_volume
    }
}

/// Normalised difference between buy and sell aggressor volume.
pub fn order_flow_ratio(buy_volume: Decimal, sell_volume: Decimal) -> Decimal {
    let total = buy_volume + sell_volume;
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (buy_volume - sell_volume) / total
}

/// Applies trades to the [`FlowState`] and records each resulting ratio in the
/// [`RatioHistory`] within the same `&mut` step, so both always reflect the same trade count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct VolumeAccumulator {
    state: FlowState,
    history: RatioHistory,
}

impl VolumeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, trade: &TradeEvent) -> &FlowState {
        self.state = self.state.applied(trade);
        self.history.push(self.state.ratio);
        &self.state
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn history(&self) -> &RatioHistory {
        &self.history
    }
}
