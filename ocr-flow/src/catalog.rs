//! Tradable instrument listing grouped by base asset ("coin").

use crate::{config::FeedConfig, error::CatalogError, feed::binance::BinanceRest};
use derive_more::Constructor;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single tradable contract, eg/ `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, Constructor)]
pub struct Contract {
    pub symbol: SmolStr,
    pub base_asset: SmolStr,
    pub quote_asset: SmolStr,
}

/// Every contract sharing one base asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct CoinListing {
    pub coin: SmolStr,
    pub contracts: Vec<Contract>,
}

/// Coins in first-listed order, each with its tradable contracts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentCatalog {
    coins: Vec<CoinListing>,
    preferred_quote: SmolStr,
}

impl InstrumentCatalog {
    /// Group `contracts` by base asset, preserving the order each coin is first seen.
    pub fn from_contracts(
        contracts: impl IntoIterator<Item = Contract>,
        preferred_quote: impl Into<SmolStr>,
    ) -> Self {
        let mut grouped = IndexMap::<SmolStr, Vec<Contract>>::new();
        for contract in contracts {
            grouped
                .entry(contract.base_asset.clone())
                .or_default()
                .push(contract);
        }

        Self {
            coins: grouped
                .into_iter()
                .map(|(coin, contracts)| CoinListing::new(coin, contracts))
                .collect(),
            preferred_quote: preferred_quote.into(),
        }
    }

    /// Fetch the tradable contracts from Binance and build the catalog.
    pub async fn fetch(rest: &BinanceRest, config: &FeedConfig) -> Result<Self, CatalogError> {
        let contracts = rest.fetch_contracts().await?;
        Ok(Self::from_contracts(contracts, config.preferred_quote.clone()))
    }

    pub fn coins(&self) -> &[CoinListing] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn find(&self, coin: &str) -> Option<&CoinListing> {
        self.coins.iter().find(|listing| listing.coin == coin)
    }

    /// Coins whose name contains `term`, case-insensitively. An empty term matches every coin.
    pub fn search(&self, term: &str) -> Vec<&CoinListing> {
        let term = term.trim().to_lowercase();
        self.coins
            .iter()
            .filter(|listing| term.is_empty() || listing.coin.to_lowercase().contains(&term))
            .collect()
    }

    /// Symbol to analyse for `coin`: the contract quoted in the preferred quote asset if one
    /// exists, else the first listed contract.
    pub fn resolve_trading_symbol(&self, coin: &str) -> Option<SmolStr> {
        let listing = self.find(coin)?;

        listing
            .contracts
            .iter()
            .find(|contract| contract.quote_asset == self.preferred_quote)
            .or_else(|| listing.contracts.first())
            .map(|contract| contract.symbol.clone())
    }
}
