use crate::market::cache::CacheSettings;
use crate::range::RangePolicy;
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub entsoe_api_key: String,
    pub entsoe_base_url: String,
    pub app_timezone: Tz,
    pub max_date_range_days: u32,
    pub upstream_timeout: Duration,
    pub upstream_max_retries: u32,
    pub cache_max_capacity: Option<u64>,
    pub cache_ttl: Option<Duration>,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Config {
            entsoe_api_key: var("ENTSOE_API_KEY")
                .or_else(|| var("ENTSOE_TOKEN"))
                .ok_or_else(|| anyhow::anyhow!("Missing ENTSOE_API_KEY or ENTSOE_TOKEN in environment"))?,
            entsoe_base_url: var("ENTSOE_BASE_URL")
                .unwrap_or_else(|| "https://web-api.tp.entsoe.eu/api".to_string()),
            app_timezone: parse_or("APP_TIMEZONE", var("APP_TIMEZONE"), chrono_tz::Europe::Brussels)?,
            max_date_range_days: parse_or("MAX_DATE_RANGE_DAYS", var("MAX_DATE_RANGE_DAYS"), 370)?,
            upstream_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                var("UPSTREAM_TIMEOUT_SECS"),
                30,
            )?),
            upstream_max_retries: parse_or("UPSTREAM_MAX_RETRIES", var("UPSTREAM_MAX_RETRIES"), 0)?,
            cache_max_capacity: parse_optional("CACHE_MAX_CAPACITY", var("CACHE_MAX_CAPACITY"))?,
            cache_ttl: parse_optional("CACHE_TTL_SECS", var("CACHE_TTL_SECS"))?.map(Duration::from_secs),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn range_policy(&self) -> RangePolicy {
        RangePolicy {
            timezone: self.app_timezone,
            max_days: self.max_date_range_days,
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            max_capacity: self.cache_max_capacity,
            time_to_live: self.cache_ttl,
        }
    }
}

fn parse_optional<T: FromStr>(name: &str, value: Option<String>) -> anyhow::Result<Option<T>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", name, raw))
        })
        .transpose()
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> anyhow::Result<T> {
    Ok(parse_optional(name, value)?.unwrap_or(default))
}
