use super::types::*;
use super::MarketDataProvider;
use crate::config::Config;
use crate::range::TimeRange;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::time::sleep;

const NO_MATCHING_DATA: &str = "No matching data found";
const GENERATION_CATEGORY: &str = "Actual Aggregated";
const PREFERRED_PRICE_RESOLUTION: &str = "PT60M";
// A year of quarter hours is about 35k points
const MAX_PERIOD_POINTS: u32 = 100_000;

#[derive(Error, Debug)]
pub enum EntsoeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("XML parsing failed: {0}")]
    XmlParsing(#[from] quick_xml::DeError),
    #[error("No matching data found")]
    NoMatchingData,
    #[error("Upstream rejected the security token")]
    Unauthorized,
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Upstream request timed out")]
    Timeout,
}

impl EntsoeError {
    /// Upstream confirmed the query is valid but has no records.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntsoeError::NoMatchingData)
    }

    pub fn is_transient(&self) -> bool {
        match self {
            EntsoeError::Timeout | EntsoeError::RequestFailed(_) => true,
            EntsoeError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EntsoeError::Timeout
        } else {
            EntsoeError::RequestFailed(err)
        }
    }
}

pub struct EntsoeClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_delay: std::time::Duration,
}

impl EntsoeClient {
    pub fn new(config: &Config) -> Result<Self, EntsoeError> {
        let client = Client::builder()
            .user_agent("EntsoeProxy/1.0")
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.entsoe_base_url.clone(),
            api_key: config.entsoe_api_key.clone(),
            max_retries: config.upstream_max_retries,
            retry_delay: std::time::Duration::from_millis(500),
        })
    }

    async fn get_document(&self, params: &[(&str, String)]) -> Result<String, EntsoeError> {
        let mut retry_count = 0;
        let mut delay = self.retry_delay;

        loop {
            match self.request_once(params).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && retry_count < self.max_retries => {
                    tracing::warn!(
                        "ENTSO-E request failed ({}), retrying in {}ms",
                        err,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5);
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn request_once(&self, params: &[(&str, String)]) -> Result<String, EntsoeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("securityToken", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(EntsoeError::from_request)?;

        let status = response.status();
        let body = response.text().await.map_err(EntsoeError::from_request)?;
        classify_response(status.as_u16(), body)
    }
}

#[async_trait]
impl MarketDataProvider for EntsoeClient {
    async fn query_price_series(&self, location: &str, range: &TimeRange) -> Result<RawSeries, EntsoeError> {
        tracing::debug!("Querying day-ahead prices for {}", location);
        let mut params = period_params(range);
        params.push(("documentType", "A44".to_string()));
        params.push(("in_Domain", location.to_string()));
        params.push(("out_Domain", location.to_string()));

        let body = self.get_document(&params).await?;
        parse_price_document(&body, range)
    }

    async fn query_generation_table(&self, location: &str, range: &TimeRange) -> Result<RawTable, EntsoeError> {
        tracing::debug!("Querying generation per type for {}", location);
        let mut params = period_params(range);
        params.push(("documentType", "A75".to_string()));
        params.push(("processType", "A16".to_string()));
        params.push(("in_Domain", location.to_string()));

        let body = self.get_document(&params).await?;
        parse_generation_document(&body, range)
    }
}

fn period_params(range: &TimeRange) -> Vec<(&'static str, String)> {
    let format = |ts: &DateTime<chrono_tz::Tz>| ts.with_timezone(&Utc).format("%Y%m%d%H00").to_string();
    vec![
        ("periodStart", format(range.start())),
        ("periodEnd", format(range.end())),
    ]
}

fn classify_response(status: u16, body: String) -> Result<String, EntsoeError> {
    if body.contains("Acknowledgement_MarketDocument") {
        let ack: Acknowledgement = quick_xml::de::from_str(&body)?;
        let reasons: Vec<&str> = ack
            .reasons
            .iter()
            .filter_map(|reason| reason.text.as_deref())
            .collect();

        if reasons.iter().any(|text| text.contains(NO_MATCHING_DATA)) {
            return Err(EntsoeError::NoMatchingData);
        }
        if (200..300).contains(&status) || status == 400 {
            return Err(EntsoeError::ApiError(reasons.join("; ")));
        }
    }

    match status {
        200..=299 => Ok(body),
        401 => Err(EntsoeError::Unauthorized),
        _ => Err(EntsoeError::HttpStatus {
            status,
            message: body.chars().take(200).collect(),
        }),
    }
}

// XML documents returned by the transparency platform

#[derive(Debug, Deserialize)]
struct Acknowledgement {
    #[serde(rename = "Reason", default)]
    reasons: Vec<Reason>,
}

#[derive(Debug, Deserialize)]
struct Reason {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "curveType")]
    curve_type: Option<String>,
    #[serde(rename = "outBiddingZone_Domain.mRID")]
    out_domain: Option<Domain>,
    #[serde(rename = "MktPSRType")]
    psr_type: Option<PsrType>,
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct Domain {
    #[serde(rename = "$text")]
    _mrid: String,
}

#[derive(Debug, Deserialize)]
struct PsrType {
    #[serde(rename = "psrType")]
    code: String,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    interval: Interval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct Interval {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct Point {
    position: u32,
    #[serde(rename = "price.amount")]
    price: Option<f64>,
    quantity: Option<f64>,
}

impl TimeSeries {
    /// Curve type A03 omits points that repeat the previous value.
    fn fills_gaps(&self) -> bool {
        self.curve_type.as_deref() == Some("A03")
    }
}

impl Period {
    fn expand(
        &self,
        fill_gaps: bool,
        value_of: impl Fn(&Point) -> Option<f64>,
    ) -> Result<Vec<(DateTime<Utc>, f64)>, EntsoeError> {
        let start = parse_instant(&self.interval.start)?;
        let end = parse_instant(&self.interval.end)?;
        let step = parse_resolution(&self.resolution)?;

        let by_position: BTreeMap<u32, f64> = self
            .points
            .iter()
            .filter_map(|point| value_of(point).map(|value| (point.position, value)))
            .collect();

        let at = |position: u32| -> Result<DateTime<Utc>, EntsoeError> {
            i32::try_from(position)
                .ok()
                .filter(|position| *position >= 1)
                .and_then(|position| step.checked_mul(position - 1))
                .and_then(|offset| start.checked_add_signed(offset))
                .ok_or_else(|| EntsoeError::InvalidPayload(format!("point position {} out of range", position)))
        };

        if !fill_gaps {
            return by_position
                .into_iter()
                .map(|(position, value)| Ok((at(position)?, value)))
                .collect();
        }

        let slots = u32::try_from(((end - start).num_seconds() / step.num_seconds()).max(0))
            .ok()
            .filter(|slots| *slots <= MAX_PERIOD_POINTS)
            .ok_or_else(|| {
                EntsoeError::InvalidPayload(format!(
                    "period {}/{} has too many {} points",
                    self.interval.start, self.interval.end, self.resolution
                ))
            })?;

        let mut last = None;
        let mut values = Vec::with_capacity(slots as usize);
        for position in 1..=slots {
            if let Some(value) = by_position.get(&position) {
                last = Some(*value);
            }
            if let Some(value) = last {
                values.push((at(position)?, value));
            }
        }
        Ok(values)
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, EntsoeError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ"))
        .map(|naive| naive.and_utc())
        .map_err(|_| EntsoeError::InvalidPayload(format!("bad timestamp '{}'", value)))
}

fn parse_resolution(value: &str) -> Result<Duration, EntsoeError> {
    let invalid = || EntsoeError::InvalidPayload(format!("unsupported resolution '{}'", value));
    let amount = |digits: &str| digits.parse::<i64>().ok().filter(|n| *n > 0).ok_or_else(invalid);

    if let Some(time) = value.strip_prefix("PT") {
        if let Some(minutes) = time.strip_suffix('M') {
            return Duration::try_minutes(amount(minutes)?).ok_or_else(invalid);
        }
        if let Some(hours) = time.strip_suffix('H') {
            return Duration::try_hours(amount(hours)?).ok_or_else(invalid);
        }
    } else if let Some(days) = value.strip_prefix('P').and_then(|rest| rest.strip_suffix('D')) {
        return Duration::try_days(amount(days)?).ok_or_else(invalid);
    }

    Err(invalid())
}

fn parse_price_document(body: &str, range: &TimeRange) -> Result<RawSeries, EntsoeError> {
    let document: MarketDocument = quick_xml::de::from_str(body)?;

    let resolutions: Vec<&str> = document
        .time_series
        .iter()
        .flat_map(|series| series.periods.iter().map(|p| p.resolution.as_str()))
        .collect();
    let wanted = if resolutions.contains(&PREFERRED_PRICE_RESOLUTION) {
        Some(PREFERRED_PRICE_RESOLUTION)
    } else {
        resolutions.first().copied()
    };

    let mut prices: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for series in &document.time_series {
        for period in series.periods.iter().filter(|p| Some(p.resolution.as_str()) == wanted) {
            for (timestamp, value) in period.expand(series.fills_gaps(), |point| point.price)? {
                prices.entry(timestamp).or_insert(value);
            }
        }
    }

    let timezone = range.timezone();
    let points = prices
        .into_iter()
        .filter(|(timestamp, _)| range.contains(timestamp))
        .map(|(timestamp, value)| RawPoint {
            timestamp: timestamp.with_timezone(&timezone).fixed_offset(),
            value: Some(value),
        })
        .collect();

    Ok(RawSeries { points })
}

fn parse_generation_document(body: &str, range: &TimeRange) -> Result<RawTable, EntsoeError> {
    let document: MarketDocument = quick_xml::de::from_str(body)?;

    let mut columns: Vec<((String, &'static str), BTreeMap<DateTime<Utc>, f64>)> = Vec::new();
    for series in &document.time_series {
        let name = series
            .psr_type
            .as_ref()
            .map(|psr| psr_type_name(&psr.code).to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let category = if series.out_domain.is_some() {
            super::normalize::CONSUMPTION_CATEGORY
        } else {
            GENERATION_CATEGORY
        };

        let column_key = (name, category);
        let position = match columns.iter().position(|(key, _)| *key == column_key) {
            Some(position) => position,
            None => {
                columns.push((column_key, BTreeMap::new()));
                columns.len() - 1
            }
        };

        for period in &series.periods {
            for (timestamp, value) in period.expand(series.fills_gaps(), |point| point.quantity)? {
                if range.contains(&timestamp) {
                    columns[position].1.entry(timestamp).or_insert(value);
                }
            }
        }
    }

    let index: Vec<DateTime<Utc>> = columns
        .iter()
        .flat_map(|(_, values)| values.keys().copied())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let two_level = columns
        .iter()
        .any(|((_, category), _)| *category == super::normalize::CONSUMPTION_CATEGORY);

    let columns = columns
        .into_iter()
        .map(|((name, category), values)| RawColumn {
            name: if two_level {
                ColumnName::Pair(name, category.to_string())
            } else {
                ColumnName::Single(name)
            },
            values: index.iter().map(|ts| values.get(ts).copied()).collect(),
        })
        .collect();

    Ok(RawTable { index, columns })
}

/// Human readable label for an ENTSO-E production source type code.
pub fn psr_type_name(code: &str) -> &str {
    match code {
        "A03" => "Mixed",
        "A04" => "Generation",
        "A05" => "Load",
        "B01" => "Biomass",
        "B02" => "Fossil Brown coal/Lignite",
        "B03" => "Fossil Coal-derived gas",
        "B04" => "Fossil Gas",
        "B05" => "Fossil Hard coal",
        "B06" => "Fossil Oil",
        "B07" => "Fossil Oil shale",
        "B08" => "Fossil Peat",
        "B09" => "Geothermal",
        "B10" => "Hydro Pumped Storage",
        "B11" => "Hydro Run-of-river and poundage",
        "B12" => "Hydro Water Reservoir",
        "B13" => "Marine",
        "B14" => "Nuclear",
        "B15" => "Other renewable",
        "B16" => "Solar",
        "B17" => "Waste",
        "B18" => "Wind Offshore",
        "B19" => "Wind Onshore",
        "B20" => "Other",
        "B21" => "AC Link",
        "B22" => "DC Link",
        "B23" => "Substation",
        "B24" => "Transformer",
        "B25" => "Energy storage",
        other => other,
    }
}
