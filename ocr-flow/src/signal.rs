//! Classification of order-flow ratio and order book depth into a discrete trading signal.
//!
//! The thresholds are empirically tuned constants, not runtime configuration.

use crate::model::DepthSnapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ratio above which buy aggression is considered dominant (strict).
pub const BUY_RATIO_THRESHOLD: Decimal = dec!(0.7);

/// Ratio below which sell aggression is considered dominant (strict).
pub const SELL_RATIO_THRESHOLD: Decimal = dec!(-0.7);

/// The thinning side of the book must hold less than this fraction of the opposite side.
pub const DEPTH_ASYMMETRY_FACTOR: Decimal = dec!(0.8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum Signal {
    #[default]
    Neutral,
    BuySignal,
    SellSignal,
}

impl Signal {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Neutral => "Watching...",
            Signal::BuySignal => "Buy signal: high OCR, asks thinning",
            Signal::SellSignal => "Sell signal: low OCR, bids thinning",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::BuySignal)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::SellSignal)
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify the latest order-flow `ratio` against the latest `depth`. First match wins:
/// 1. `ratio > 0.7` and `ask < bid * 0.8` => [`Signal::BuySignal`]
/// 2. `ratio < -0.7` and `bid < ask * 0.8` => [`Signal::SellSignal`]
/// 3. otherwise [`Signal::Neutral`]
pub fn classify(ratio: Decimal, depth: &DepthSnapshot) -> Signal {
    let DepthSnapshot {
        bid_volume,
        ask_volume,
        ..
    } = *depth;

    if ratio > BUY_RATIO_THRESHOLD && ask_volume < bid_volume * DEPTH_ASYMMETRY_FACTOR {
        Signal::BuySignal
    } else if ratio < SELL_RATIO_THRESHOLD && bid_volume < ask_volume * DEPTH_ASYMMETRY_FACTOR {
        Signal::SellSignal
    } else {
        Signal::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn depth(bid_volume: Decimal, ask_volume: Decimal) -> DepthSnapshot {
        DepthSnapshot::new(bid_volume, ask_volume, Utc::now())
    }

    #[test]
    fn test_classify() {
        struct TestCase {
            ratio: Decimal,
            depth: DepthSnapshot,
            expected: Signal,
        }

        let tests = vec![
            TestCase {
                // TC0: high ratio & thin asks => buy
                ratio: dec!(0.75),
                depth: depth(dec!(100), dec!(70)),
                expected: Signal::BuySignal,
            },
            TestCase {
                // TC1: high ratio but asks not thin enough
                ratio: dec!(0.75),
                depth: depth(dec!(100), dec!(95)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC2: ratio exactly at threshold is not a buy
                ratio: dec!(0.7),
                depth: depth(dec!(100), dec!(10)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC3: asks exactly 80% of bids is not thin
                ratio: dec!(0.9),
                depth: depth(dec!(100), dec!(80)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC4: low ratio & thin bids => sell
                ratio: dec!(-0.75),
                depth: depth(dec!(70), dec!(100)),
                expected: Signal::SellSignal,
            },
            TestCase {
                // TC5: ratio exactly at negative threshold is not a sell
                ratio: dec!(-0.7),
                depth: depth(dec!(10), dec!(100)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC6: low ratio but bids deep
                ratio: dec!(-0.95),
                depth: depth(dec!(100), dec!(100)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC7: empty book on both sides
                ratio: dec!(1),
                depth: depth(dec!(0), dec!(0)),
                expected: Signal::Neutral,
            },
            TestCase {
                // TC8: empty ask side with positive bids => buy
                ratio: dec!(1),
                depth: depth(dec!(5), dec!(0)),
                expected: Signal::BuySignal,
            },
            TestCase {
                // TC9: empty bid side with positive asks => sell
                ratio: dec!(-1),
                depth: depth(dec!(0), dec!(5)),
                expected: Signal::SellSignal,
            },
            TestCase {
                // TC10: balanced flow
                ratio: dec!(0),
                depth: depth(dec!(100), dec!(1)),
                expected: Signal::Neutral,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = classify(test.ratio, &test.depth);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let snapshot = depth(dec!(100), dec!(70));
        let first = classify(dec!(0.75), &snapshot);
        for _ in 0..10 {
            assert_eq!(classify(dec!(0.75), &snapshot), first);
        }
    }

    #[test]
    fn test_signal_labels() {
        assert_eq!(Signal::default(), Signal::Neutral);
        assert!(Signal::BuySignal.is_buy());
        assert!(Signal::SellSignal.is_sell());
        assert!(!Signal::Neutral.is_buy() && !Signal::Neutral.is_sell());
        assert_eq!(Signal::BuySignal.to_string(), "Buy signal: high OCR, asks thinning");
    }
}
