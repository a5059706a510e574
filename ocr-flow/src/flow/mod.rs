//! Aggressor volume accumulation, order-flow ratio (OCR) and its rolling history.

mod accumulator;
mod history;

pub use accumulator::{FlowState, VolumeAccumulator, order_flow_ratio};
pub use history::{RATIO_HISTORY_CAPACITY, RatioHistory, RollingHistory};
