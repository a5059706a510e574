//! Bounded FIFO history of recent values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{VecDeque, vec_deque};

/// Number of order-flow ratio values kept for the trend display.
pub const RATIO_HISTORY_CAPACITY: usize = 50;

/// Rolling window of the most recent order-flow ratio values, oldest first.
pub type RatioHistory = RollingHistory<Decimal>;

/// Ring buffer storing the N most recent values.
///
/// Storage is allocated once up front. Pushing at capacity evicts the oldest value.
/// Deserialising rejects a zero capacity and keeps only the newest `capacity` values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RollingHistoryParts<T>")]
pub struct RollingHistory<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingHistory<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingHistory capacity must be non-zero");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values in chronological order (oldest first).
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.values.iter()
    }

    /// Value at `index`, where 0 is the oldest retained value.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Unvalidated wire form of a [`RollingHistory`].
#[derive(Deserialize)]
struct RollingHistoryParts<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> TryFrom<RollingHistoryParts<T>> for RollingHistory<T> {
    type Error = &'static str;

    fn try_from(parts: RollingHistoryParts<T>) -> Result<Self, Self::Error> {
        let RollingHistoryParts {
            mut values,
            capacity,
        } = parts;

        if capacity == 0 {
            return Err("RollingHistory capacity must be non-zero");
        }

        let excess = values.len().saturating_sub(capacity);
        values.drain(..excess);
        values.reserve(capacity - values.len());

        Ok(Self { values, capacity })
    }
}

impl Default for RollingHistory<Decimal> {
    fn default() -> Self {
        Self::new(RATIO_HISTORY_CAPACITY)
    }
}

impl<'a, T> IntoIterator for &'a RollingHistory<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
