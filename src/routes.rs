use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    config::Config,
    locations::{Location, LocationType},
    market::{
        fetch::{FetchError, MarketFetcher},
        types::{GenerationTable, PriceSeries},
        DataKind,
    },
    range::{RangeError, TimeRange},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<MarketFetcher>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    InvalidRange(#[from] RangeError),
    #[error("Invalid location type")]
    InvalidLocationType,
    #[error("Invalid or missing zone")]
    InvalidZone,
    #[error(transparent)]
    Upstream(#[from] FetchError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upstream(err) => {
                tracing::error!("Upstream fetch failed: {}", err);
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub zone: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "location-type")]
    pub location_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesData<T> {
    pub series: T,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse<T> {
    pub data: SeriesData<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Default> SeriesResponse<T> {
    /// Shapes a fetch outcome; no data becomes an empty series with a warning.
    fn from_outcome(kind: DataKind, zone: &str, series: Option<T>) -> Self {
        match series {
            Some(series) => Self {
                data: SeriesData {
                    series,
                    unit: kind.unit(),
                },
                zone: Some(zone.to_string()),
                warning: None,
            },
            None => Self {
                data: SeriesData {
                    series: T::default(),
                    unit: kind.unit(),
                },
                zone: None,
                warning: Some(kind.no_data_warning(zone)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub bidding_zones: BTreeMap<&'static str, Location>,
    pub countries: BTreeMap<&'static str, Location>,
    pub control_areas: BTreeMap<&'static str, Location>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_locations() -> Json<LocationsResponse> {
    let collect = |kind: LocationType| kind.table().iter().copied().collect();
    Json(LocationsResponse {
        bidding_zones: collect(LocationType::BiddingZones),
        countries: collect(LocationType::Countries),
        control_areas: collect(LocationType::ControlAreas),
    })
}

pub async fn get_prices(
    State(state): State<AppState>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse<PriceSeries>>, ApiError> {
    let (zone, location) = resolve_zone(params.zone.as_deref(), LocationType::BiddingZones)?;
    let range = validate_range(&state, &params)?;

    let series = state.fetcher.fetch_prices(location.eic, &range).await?;
    Ok(Json(SeriesResponse::from_outcome(DataKind::Prices, zone, series)))
}

pub async fn get_generation(
    State(state): State<AppState>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse<GenerationTable>>, ApiError> {
    let location_type = match params.location_type.as_deref() {
        None => LocationType::default(),
        Some(value) => LocationType::parse(value).ok_or(ApiError::InvalidLocationType)?,
    };
    let (zone, location) = resolve_zone(params.zone.as_deref(), location_type)?;
    let range = validate_range(&state, &params)?;

    let table = state.fetcher.fetch_generation(location.eic, &range).await?;
    Ok(Json(SeriesResponse::from_outcome(DataKind::Generation, zone, table)))
}

fn resolve_zone(zone: Option<&str>, location_type: LocationType) -> Result<(&str, &'static Location), ApiError> {
    let zone = zone.filter(|z| !z.is_empty()).ok_or(ApiError::InvalidZone)?;
    let location = location_type.lookup(zone).ok_or(ApiError::InvalidZone)?;
    Ok((zone, location))
}

fn validate_range(state: &AppState, params: &SeriesQuery) -> Result<TimeRange, ApiError> {
    let range = TimeRange::validate(
        params.start.as_deref().unwrap_or_default(),
        params.end.as_deref().unwrap_or_default(),
        &state.config.range_policy(),
    )?;
    Ok(range)
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locations", get(get_locations))
        .route("/price", get(get_prices))
        .route("/generation", get(get_generation))
        .with_state(state)
}
