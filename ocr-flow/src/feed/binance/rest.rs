use crate::{
    catalog::Contract,
    config::FeedConfig,
    error::{CatalogError, ConfigError, TransientFetchError},
    feed::DepthSource,
    model::{Level, OrderBookDepth},
};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;
use url::Url;

const DEPTH_PATH: &str = "/fapi/v1/depth";
const EXCHANGE_INFO_PATH: &str = "/fapi/v1/exchangeInfo";
const STATUS_TRADING: &str = "TRADING";

/// `limit` values accepted by the depth endpoint.
const DEPTH_LIMITS: [usize; 7] = [5, 10, 20, 50, 100, 500, 1000];

/// Binance USDⓈ-M futures REST client serving order book depth and exchange info.
#[derive(Debug, Clone)]
pub struct BinanceRest {
    client: Client,
    base_url: Url,
}

impl BinanceRest {
    pub fn new(config: &FeedConfig) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(&config.rest_base_url).map_err(|error| ConfigError::InvalidUrl {
                name: "rest base",
                value: config.rest_base_url.clone(),
                reason: error.to_string(),
            })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| ConfigError::HttpClient(error.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// `GET /fapi/v1/depth?symbol=<symbol>&limit=<limit>`, where `limit` is `levels` rounded up
    /// to the nearest accepted value. Only the top `levels` are summed by the sampler.
    pub fn depth_url(&self, symbol: &str, levels: usize) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(DEPTH_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair("symbol", &symbol.to_uppercase())
            .append_pair("limit", &depth_limit(levels).to_string());
        url
    }

    pub fn exchange_info_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(EXCHANGE_INFO_PATH);
        url.set_query(None);
        url
    }

    /// Fetch every contract currently in `TRADING` status.
    pub async fn fetch_contracts(&self) -> Result<Vec<Contract>, CatalogError> {
        let response = self
            .client
            .get(self.exchange_info_url())
            .send()
            .await
            .map_err(|error| CatalogError::Http(error.to_string()))?;

        if let Err(status_error) = response.error_for_status_ref() {
            return Err(CatalogError::Status(
                status_error.status().map(|status| status.as_u16()).unwrap_or_default(),
            ));
        }

        let info = response
            .json::<BinanceExchangeInfo>()
            .await
            .map_err(|error| CatalogError::Decode(error.to_string()))?;

        let contracts = info.tradable_contracts();
        debug!(contracts = contracts.len(), "fetched Binance exchange info");

        if contracts.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(contracts)
    }
}

/// Smallest accepted depth `limit` covering `levels`, capped at the largest.
pub fn depth_limit(levels: usize) -> usize {
    DEPTH_LIMITS
        .iter()
        .copied()
        .find(|limit| *limit >= levels)
        .unwrap_or(DEPTH_LIMITS[DEPTH_LIMITS.len() - 1])
}

#[async_trait]
impl DepthSource for BinanceRest {
    async fn fetch_depth(
        &self,
        symbol: &str,
        levels: usize,
    ) -> Result<OrderBookDepth, TransientFetchError> {
        let response = self
            .client
            .get(self.depth_url(symbol, levels))
            .send()
            .await
            .map_err(|error| TransientFetchError::Http(error.to_string()))?;

        if let Err(status_error) = response.error_for_status_ref() {
            return Err(TransientFetchError::Status(
                status_error.status().map(|status| status.as_u16()).unwrap_or_default(),
            ));
        }

        response
            .json::<BinanceDepth>()
            .await
            .map(OrderBookDepth::from)
            .map_err(|error| TransientFetchError::Decode(error.to_string()))
    }
}

/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/derivatives/usds-margined-futures/market-data/rest-api/Order-Book>
/// ```json
/// {
///     "lastUpdateId": 1027024,
///     "E": 1589436922972,
///     "T": 1589436922959,
///     "bids": [["4.00000000", "431.00000000"]],
///     "asks": [["4.00000200", "12.00000000"]]
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BinanceDepth {
    #[serde(rename = "lastUpdateId", default)]
    pub last_update_id: u64,
    pub bids: Vec<BinanceLevel>,
    pub asks: Vec<BinanceLevel>,
}

/// `[price, quantity]` pair of decimal strings.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BinanceLevel(
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
);

impl From<BinanceLevel> for Level {
    fn from(BinanceLevel(price, amount): BinanceLevel) -> Self {
        Level::new(price, amount)
    }
}

impl From<BinanceDepth> for OrderBookDepth {
    fn from(depth: BinanceDepth) -> Self {
        OrderBookDepth::new(
            depth.bids.into_iter().map(Level::from).collect(),
            depth.asks.into_iter().map(Level::from).collect(),
        )
    }
}

/// Subset of `GET /fapi/v1/exchangeInfo` needed to list tradable instruments.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct BinanceExchangeInfo {
    pub symbols: Vec<BinanceSymbolInfo>,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceSymbolInfo {
    pub symbol: SmolStr,
    pub status: SmolStr,
    pub base_asset: SmolStr,
    pub quote_asset: SmolStr,
}

impl BinanceExchangeInfo {
    pub fn tradable_contracts(self) -> Vec<Contract> {
        self.symbols
            .into_iter()
            .filter(|symbol| symbol.status == STATUS_TRADING)
            .map(|symbol| Contract::new(symbol.symbol, symbol.base_asset, symbol.quote_asset))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rest() -> BinanceRest {
        BinanceRest::new(&FeedConfig::default()).unwrap()
    }

    #[test]
    fn test_depth_url() {
        assert_eq!(
            rest().depth_url("btcusdt", 10).as_str(),
            "https://fapi.binance.com/fapi/v1/depth?symbol=BTCUSDT&limit=10"
        );
    }

    #[test]
    fn test_depth_limit() {
        struct TestCase {
            levels: usize,
            expected: usize,
        }

        let tests = vec![
            TestCase {
                // TC0: below smallest limit
                levels: 1,
                expected: 5,
            },
            TestCase {
                // TC1: accepted value is kept
                levels: 10,
                expected: 10,
            },
            TestCase {
                // TC2: rounded up to next accepted value
                levels: 7,
                expected: 10,
            },
            TestCase {
                // TC3: between large limits
                levels: 101,
                expected: 500,
            },
            TestCase {
                // TC4: above largest limit is capped
                levels: 5000,
                expected: 1000,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(depth_limit(test.levels), test.expected, "TC{} failed", index);
        }

        assert_eq!(
            rest().depth_url("ETHUSDT", 7).as_str(),
            "https://fapi.binance.com/fapi/v1/depth?symbol=ETHUSDT&limit=10"
        );
    }

    #[test]
    fn test_exchange_info_url() {
        assert_eq!(
            rest().exchange_info_url().as_str(),
            "https://fapi.binance.com/fapi/v1/exchangeInfo"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = FeedConfig::default().with_rest_base_url("not a url");
        assert!(matches!(
            BinanceRest::new(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_de_binance_depth() {
        let input = r#"
        {
            "lastUpdateId": 1027024,
            "E": 1589436922972,
            "T": 1589436922959,
            "bids": [["4.00000000", "431.00000000"], ["3.99", "9.5"]],
            "asks": [["4.00000200", "12.00000000"]]
        }
        "#;

        let depth = OrderBookDepth::from(serde_json::from_str::<BinanceDepth>(input).unwrap());
        assert_eq!(
            depth,
            OrderBookDepth::new(
                vec![
                    Level::new(dec!(4), dec!(431)),
                    Level::new(dec!(3.99), dec!(9.5)),
                ],
                vec![Level::new(dec!(4.000002), dec!(12))],
            )
        );
    }

    #[test]
    fn test_de_binance_depth_rejects_non_numeric_level() {
        let input = r#"{"bids": [["abc", "1"]], "asks": []}"#;
        assert!(serde_json::from_str::<BinanceDepth>(input).is_err());
    }

    #[test]
    fn test_tradable_contracts_filters_status() {
        let input = r#"
        {
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "pair": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT"},
                {"symbol": "BTCUSDT_250328", "status": "SETTLING", "baseAsset": "BTC", "quoteAsset": "USDT"},
                {"symbol": "ETHUSDC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "USDC"}
            ]
        }
        "#;

        let contracts = serde_json::from_str::<BinanceExchangeInfo>(input)
            .unwrap()
            .tradable_contracts();

        assert_eq!(
            contracts,
            vec![
                Contract::new("BTCUSDT".into(), "BTC".into(), "USDT".into()),
                Contract::new("ETHUSDC".into(), "ETH".into(), "USDC".into()),
            ]
        );
    }
}
