use super::entsoe::EntsoeError;
use super::types::*;
use super::MarketDataProvider;
use crate::range::TimeRange;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Data,
    NoData,
    Fail,
}

/// Scripted upstream that counts its calls.
pub struct MockMarketClient {
    price_outcome: Mutex<MockOutcome>,
    generation_outcome: Mutex<MockOutcome>,
    price_calls: AtomicUsize,
    generation_calls: AtomicUsize,
    delay: Option<std::time::Duration>,
}

impl MockMarketClient {
    pub fn new() -> Self {
        Self {
            price_outcome: Mutex::new(MockOutcome::Data),
            generation_outcome: Mutex::new(MockOutcome::Data),
            price_calls: AtomicUsize::new(0),
            generation_calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_price_outcome(&self, outcome: MockOutcome) {
        *self.price_outcome.lock().unwrap() = outcome;
    }

    pub fn set_generation_outcome(&self, outcome: MockOutcome) {
        *self.generation_outcome.lock().unwrap() = outcome;
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub fn generation_calls(&self) -> usize {
        self.generation_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, outcome: MockOutcome) -> Result<(), EntsoeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match outcome {
            MockOutcome::Data => Ok(()),
            MockOutcome::NoData => Err(EntsoeError::NoMatchingData),
            MockOutcome::Fail => Err(EntsoeError::ApiError("mock upstream failure".to_string())),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketClient {
    /// One hourly price at the start of the range, then one missing value.
    async fn query_price_series(&self, _location: &str, range: &TimeRange) -> Result<RawSeries, EntsoeError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.price_outcome.lock().unwrap();
        self.respond(outcome).await?;

        let start = range.start().fixed_offset();
        Ok(RawSeries {
            points: vec![
                RawPoint {
                    timestamp: start,
                    value: Some(45.2),
                },
                RawPoint {
                    timestamp: start + Duration::hours(1),
                    value: None,
                },
            ],
        })
    }

    /// Two hourly rows with a gap in the wind column and a consumption column.
    async fn query_generation_table(&self, _location: &str, range: &TimeRange) -> Result<RawTable, EntsoeError> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.generation_outcome.lock().unwrap();
        self.respond(outcome).await?;

        let start = range.start().with_timezone(&chrono::Utc);
        let pair = |name: &str, category: &str| ColumnName::Pair(name.to_string(), category.to_string());
        Ok(RawTable {
            index: vec![start, start + Duration::hours(1)],
            columns: vec![
                RawColumn {
                    name: pair("Solar", "Actual Aggregated"),
                    values: vec![Some(0.0), Some(3.5)],
                },
                RawColumn {
                    name: pair("Hydro Pumped Storage", "Actual Consumption"),
                    values: vec![Some(100.0), Some(90.0)],
                },
                RawColumn {
                    name: pair("Wind Onshore", "Actual Aggregated"),
                    values: vec![Some(1200.0), None],
                },
            ],
        })
    }
}
