use crate::{
    error::TransientFetchError,
    feed::DepthSource,
    model::{DepthSnapshot, Level},
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Number of price levels aggregated on each side of the book.
pub const DEFAULT_DEPTH_LEVELS: usize = 10;

/// Fetches top-of-book depth from a [`DepthSource`] and aggregates resting volume per side.
#[derive(Clone)]
pub struct DepthSampler {
    source: Arc<dyn DepthSource>,
    levels: usize,
}

impl std::fmt::Debug for DepthSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthSampler")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

impl DepthSampler {
    pub fn new(source: Arc<dyn DepthSource>, levels: usize) -> Self {
        Self { source, levels }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Fetch the order book for `symbol` and sum the quantity of the top `levels` levels on
    /// each side.
    pub async fn sample(&self, symbol: &str) -> Result<DepthSnapshot, TransientFetchError> {
        let depth = self.source.fetch_depth(symbol, self.levels).await?;

        Ok(DepthSnapshot::new(
            sum_top_levels(&depth.bids, self.levels),
            sum_top_levels(&depth.asks, self.levels),
            Utc::now(),
        ))
    }
}

/// Sum of `amount` across the first `levels` entries. Sources may return more levels than
/// requested, so the slice is capped here as well.
pub fn sum_top_levels(book_side: &[Level], levels: usize) -> Decimal {
    book_side.iter().take(levels).map(|level| level.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderBookDepth;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedDepth(Result<OrderBookDepth, TransientFetchError>);

    #[async_trait]
    impl DepthSource for FixedDepth {
        async fn fetch_depth(
            &self,
            _: &str,
            _: usize,
        ) -> Result<OrderBookDepth, TransientFetchError> {
            self.0.clone()
        }
    }

    fn levels(amounts: &[Decimal]) -> Vec<Level> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Level::new(Decimal::from(100 + i as i64), *amount))
            .collect()
    }

    #[test]
    fn test_sum_top_levels() {
        struct TestCase {
            input: Vec<Level>,
            levels: usize,
            expected: Decimal,
        }

        let tests = vec![
            TestCase {
                // TC0: empty side
                input: vec![],
                levels: 10,
                expected: dec!(0),
            },
            TestCase {
                // TC1: fewer levels than requested
                input: levels(&[dec!(1.5), dec!(2.25)]),
                levels: 10,
                expected: dec!(3.75),
            },
            TestCase {
                // TC2: extra levels beyond N are ignored
                input: levels(&[dec!(1), dec!(1), dec!(1), dec!(50)]),
                levels: 3,
                expected: dec!(3),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = sum_top_levels(&test.input, test.levels);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[tokio::test]
    async fn test_sample_aggregates_each_side() {
        let book = OrderBookDepth::new(
            levels(&[dec!(60), dec!(40)]),
            levels(&[dec!(30), dec!(20), dec!(20)]),
        );
        let sampler = DepthSampler::new(Arc::new(FixedDepth(Ok(book))), DEFAULT_DEPTH_LEVELS);

        let snapshot = sampler.sample("BTCUSDT").await.unwrap();
        assert_eq!(snapshot.bid_volume, dec!(100));
        assert_eq!(snapshot.ask_volume, dec!(70));
    }

    #[tokio::test]
    async fn test_sample_propagates_transient_error() {
        let sampler = DepthSampler::new(
            Arc::new(FixedDepth(Err(TransientFetchError::Status(503)))),
            DEFAULT_DEPTH_LEVELS,
        );

        assert_eq!(
            sampler.sample("BTCUSDT").await,
            Err(TransientFetchError::Status(503))
        );
    }
}
