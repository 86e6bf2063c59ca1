use anyhow::Result;
use async_trait::async_trait;
use autotrader_core::{PriceFeed, SupervisorError, SymbolUniverse};
use autotrader_data::Candle;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Latest quote per symbol. Doubles as the tradable universe for `All` scopes.
#[derive(Debug, Default)]
pub struct PriceBook {
    prices: RwLock<BTreeMap<String, Decimal>>,
}

impl PriceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the book with the last close of each series.
    #[must_use]
    pub fn from_candles(series: &BTreeMap<String, Vec<Candle>>) -> Self {
        let prices = series
            .iter()
            .filter_map(|(symbol, candles)| candles.last().map(|c| (symbol.clone(), c.close)))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices
            .write()
            .await
            .insert(symbol.to_ascii_uppercase(), price);
    }

    pub async fn price(&self, symbol: &str) -> Option<Decimal> {
        self.prices
            .read()
            .await
            .get(&symbol.to_ascii_uppercase())
            .copied()
    }
}

#[async_trait]
impl PriceFeed for PriceBook {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.price(symbol).await.ok_or_else(|| {
            SupervisorError::PriceUnavailable {
                symbol: symbol.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl SymbolUniverse for PriceBook {
    async fn tradable_symbols(&self) -> Result<Vec<String>> {
        Ok(self.prices.read().await.keys().cloned().collect())
    }
}
