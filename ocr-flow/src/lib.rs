/// OCR Flow - live order-flow ratio analysis
///
/// Consumes a real-time aggregate trade stream and a periodically polled order book for one
/// instrument at a time, and maintains:
/// - Cumulative aggressive buy / sell volume and the order-flow ratio (OCR)
/// - A bounded history of the most recent ratio values
/// - Aggregated top-of-book depth per side
/// - A buy / sell / neutral signal combining the ratio with depth asymmetry
///
/// The [`session::SessionController`] owns the lifecycle of the single active session and
/// publishes consistent [`session::SessionSnapshot`]s for readers such as the terminal UI.
pub mod catalog;
pub mod config;
pub mod depth;
pub mod error;
pub mod feed;
pub mod flow;
pub mod logging;
pub mod model;
pub mod session;
pub mod signal;

// Re-export commonly used types for convenience
pub use catalog::{CoinListing, Contract, InstrumentCatalog};
pub use config::{FeedConfig, SessionConfig};
pub use depth::DepthSampler;
pub use flow::{FlowState, RatioHistory, VolumeAccumulator};
pub use model::{DepthSnapshot, Level, OrderBookDepth, TradeEvent};
pub use session::{SessionController, SessionSnapshot, SessionStatus};
pub use signal::{Signal, classify};
