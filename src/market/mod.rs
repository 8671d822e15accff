pub mod cache;
pub mod entsoe;
pub mod fetch;
#[cfg(test)]
pub mod mock;
pub mod normalize;
pub mod types;

use crate::range::TimeRange;
use async_trait::async_trait;
use entsoe::EntsoeError;
use types::{RawSeries, RawTable};

/// Source of raw market data for a location and time range.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn query_price_series(&self, location: &str, range: &TimeRange) -> Result<RawSeries, EntsoeError>;

    async fn query_generation_table(&self, location: &str, range: &TimeRange) -> Result<RawTable, EntsoeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Prices,
    Generation,
}

impl DataKind {
    pub fn tag(&self) -> &'static str {
        match self {
            DataKind::Prices => "prices",
            DataKind::Generation => "generation",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DataKind::Prices => "EUR/MWh",
            DataKind::Generation => "MW",
        }
    }

    pub fn no_data_warning(&self, zone: &str) -> String {
        match self {
            DataKind::Prices => format!(
                "No market price data available for {} in the selected date range.",
                zone
            ),
            DataKind::Generation => format!(
                "No generation per type data available for {} in the selected date range.",
                zone
            ),
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
