use super::entsoe::EntsoeError;
use super::DataKind;
use chrono::DateTime;
use chrono_tz::Tz;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Deterministic key for one upstream query.
pub fn cache_key(location: &str, start: &DateTime<Tz>, end: &DateTime<Tz>, kind: DataKind) -> String {
    format!(
        "{}:{}:{}:{}",
        location,
        start.to_rfc3339(),
        end.to_rfc3339(),
        kind.tag()
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheSettings {
    pub max_capacity: Option<u64>,
    pub time_to_live: Option<Duration>,
}

/// Write-once memoizer over upstream outcomes.
///
/// A stored `None` records that upstream confirmed there is no data for the
/// key. Only successful or no-data outcomes are stored; any other error is
/// handed back to every caller waiting on that key and the next request
/// retries. Concurrent callers for the same missing key share one producer
/// run.
#[derive(Clone)]
pub struct FetchCache<V> {
    entries: Cache<String, Option<V>>,
}

impl<V> FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(settings: CacheSettings) -> Self {
        let mut builder = Cache::builder();
        if let Some(capacity) = settings.max_capacity {
            builder = builder.max_capacity(capacity);
        }
        if let Some(ttl) = settings.time_to_live {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
        }
    }

    pub async fn get_or_compute<F>(&self, key: String, produce: F) -> Result<Option<V>, Arc<EntsoeError>>
    where
        F: Future<Output = Result<V, EntsoeError>>,
    {
        if let Some(entry) = self.entries.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(entry);
        }

        self.entries
            .try_get_with(key, async move {
                match produce.await {
                    Ok(value) => Ok(Some(value)),
                    Err(err) if err.is_not_found() => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_cache() -> FetchCache<u32> {
        FetchCache::new(CacheSettings::default())
    }

    async fn counted(calls: &AtomicUsize, outcome: Result<u32, EntsoeError>) -> Result<u32, EntsoeError> {
        calls.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let tz = chrono_tz::Europe::Brussels;
        let start = tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = tz.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        let key = cache_key("10Y1001A1001A82H", &start, &end, DataKind::Prices);
        assert_eq!(key, cache_key("10Y1001A1001A82H", &start, &end, DataKind::Prices));
        assert_eq!(
            key,
            "10Y1001A1001A82H:2024-01-01T00:00:00+01:00:2024-01-03T00:00:00+01:00:prices"
        );

        let later = tz.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let nudged = end + chrono::Duration::milliseconds(1);
        let variants = [
            cache_key("10YAT-APG------L", &start, &end, DataKind::Prices),
            cache_key("10Y1001A1001A82H", &end, &later, DataKind::Prices),
            cache_key("10Y1001A1001A82H", &start, &later, DataKind::Prices),
            cache_key("10Y1001A1001A82H", &start, &nudged, DataKind::Prices),
            cache_key("10Y1001A1001A82H", &start, &end, DataKind::Generation),
        ];
        for variant in variants {
            assert_ne!(variant, key);
        }
    }

    #[test]
    fn test_cache_key_includes_offset() {
        let start = chrono_tz::Europe::Brussels
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        let same_instant = start.with_timezone(&chrono_tz::Tz::UTC);
        let end = start + chrono::Duration::days(1);
        let end_utc = end.with_timezone(&chrono_tz::Tz::UTC);

        assert_ne!(
            cache_key("X", &start, &end, DataKind::Prices),
            cache_key("X", &same_instant, &end_utc, DataKind::Prices)
        );
    }

    #[tokio::test]
    async fn test_value_is_computed_once() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("a".to_string(), counted(&calls, Ok(7)))
            .await
            .unwrap();
        let second = cache
            .get_or_compute("a".to_string(), counted(&calls, Ok(8)))
            .await
            .unwrap();

        assert_eq!(first, Some(7));
        assert_eq!(second, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_stored_as_none() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("a".to_string(), counted(&calls, Err(EntsoeError::NoMatchingData)))
            .await
            .unwrap();
        let second = cache
            .get_or_compute("a".to_string(), counted(&calls, Ok(1)))
            .await
            .unwrap();

        assert_eq!(first, None);
        assert_eq!(second, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_stored() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        let err = cache
            .get_or_compute("a".to_string(), counted(&calls, Err(EntsoeError::Timeout)))
            .await
            .unwrap_err();
        assert!(matches!(*err, EntsoeError::Timeout));

        let retried = cache
            .get_or_compute("a".to_string(), counted(&calls, Ok(3)))
            .await
            .unwrap();
        assert_eq!(retried, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_computation() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        let slow = |value: u32| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<u32, EntsoeError>(value)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_compute("k".to_string(), slow(1)),
            cache.get_or_compute("k".to_string(), slow(2)),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("a".to_string(), counted(&calls, Ok(1))).await.unwrap();
        cache.get_or_compute("b".to_string(), counted(&calls, Ok(2))).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
