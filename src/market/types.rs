use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One normalized observation, serialized as `{"timestamp": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

fn serialize_timestamp<S>(timestamp: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

pub type PriceSeries = Vec<SeriesPoint>;

/// Named generation series in upstream column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationTable {
    series: Vec<(String, Vec<SeriesPoint>)>,
}

impl GenerationTable {
    /// Appends a series unless one with the same name is already present.
    pub fn insert(&mut self, name: String, points: Vec<SeriesPoint>) -> bool {
        if self.get(&name).is_some() {
            return false;
        }
        self.series.push((name, points));
        true
    }

    pub fn get(&self, name: &str) -> Option<&[SeriesPoint]> {
        self.series
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, points)| points.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for GenerationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (name, points) in &self.series {
            map.serialize_entry(name, points)?;
        }
        map.end()
    }
}

/// A cached, normalized upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketData {
    Prices(PriceSeries),
    Generation(GenerationTable),
}

impl MarketData {
    pub fn as_prices(&self) -> Option<&PriceSeries> {
        match self {
            MarketData::Prices(points) => Some(points),
            MarketData::Generation(_) => None,
        }
    }

    pub fn as_generation(&self) -> Option<&GenerationTable> {
        match self {
            MarketData::Generation(table) => Some(table),
            MarketData::Prices(_) => None,
        }
    }
}

// Upstream shapes, before normalization

#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: Option<f64>,
}

/// A single upstream time series, already in its reporting timezone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub points: Vec<RawPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnName {
    Single(String),
    /// (series name, sub-category) as in "Solar" / "Actual Consumption".
    Pair(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: ColumnName,
    pub values: Vec<Option<f64>>,
}

/// Column oriented upstream table sharing one UTC index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub index: Vec<DateTime<Utc>>,
    pub columns: Vec<RawColumn>,
}
