//! Binance integrations: the spot aggregate trade WebSocket stream and the USDⓈ-M futures REST
//! API (order book depth, exchange info).

pub mod rest;
pub mod trade;

pub use rest::BinanceRest;
pub use trade::BinanceTradeSource;
