use super::cache::{cache_key, CacheSettings, FetchCache};
use super::entsoe::EntsoeError;
use super::normalize::{series_to_points, table_to_series_map};
use super::types::*;
use super::{DataKind, MarketDataProvider};
use crate::range::TimeRange;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Upstream request failed: {0}")]
    Upstream(Arc<EntsoeError>),
}

/// Cached access to normalized prices and generation data.
pub struct MarketFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: FetchCache<Arc<MarketData>>,
}

impl MarketFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, settings: CacheSettings) -> Self {
        Self {
            provider,
            cache: FetchCache::new(settings),
        }
    }

    pub async fn fetch_prices(&self, location: &str, range: &TimeRange) -> Result<Option<PriceSeries>, FetchError> {
        let data = self.fetch(DataKind::Prices, location, range).await?;
        Ok(data.and_then(|data| data.as_prices().cloned()))
    }

    pub async fn fetch_generation(
        &self,
        location: &str,
        range: &TimeRange,
    ) -> Result<Option<GenerationTable>, FetchError> {
        let data = self.fetch(DataKind::Generation, location, range).await?;
        Ok(data.and_then(|data| data.as_generation().cloned()))
    }

    /// `Ok(None)` means upstream has no data for the query, which is cached like data.
    pub async fn fetch(
        &self,
        kind: DataKind,
        location: &str,
        range: &TimeRange,
    ) -> Result<Option<Arc<MarketData>>, FetchError> {
        let key = cache_key(location, range.start(), range.end(), kind);

        let produce = async {
            tracing::debug!("Fetching {} for {} from upstream", kind, location);
            let data = match kind {
                DataKind::Prices => {
                    let series = self.provider.query_price_series(location, range).await?;
                    MarketData::Prices(series_to_points(&series))
                }
                DataKind::Generation => {
                    let table = self.provider.query_generation_table(location, range).await?;
                    MarketData::Generation(table_to_series_map(&table, range.timezone()))
                }
            };
            Ok::<_, EntsoeError>(Arc::new(data))
        };

        let result = self
            .cache
            .get_or_compute(key, produce)
            .await
            .map_err(FetchError::Upstream)?;

        if result.is_none() {
            tracing::warn!("No {} data upstream for {}", kind, location);
        }
        Ok(result)
    }
}
