// HTTP request handlers
use crate::application::paginator::page_size_from;
use crate::domain::bucket::Granularity;
use crate::domain::calendar::{DateRange, TimeFilter, YearMonth};
use crate::domain::error::TelemetryError;
use crate::domain::page::Page;
use crate::domain::reading::NewReading;
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    BucketDto, ChartPointDto, ForecastDto, IngestRequest, IngestResponse, ReadingDto, StatsDto,
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, TelemetryError>;

#[derive(Deserialize)]
pub struct ReadingsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub filter: Option<String>,
    pub month: Option<String>,
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub granularity: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub granularity: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub filter: Option<String>,
    pub month: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub start: String,
    pub end: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn ping() -> &'static str {
    "pong"
}

fn page_size(requested: Option<i64>, default: usize) -> Result<usize, TelemetryError> {
    requested.map_or(Ok(default), page_size_from)
}

fn granularity(raw: Option<&str>) -> Result<Granularity, TelemetryError> {
    raw.map_or(Ok(Granularity::default()), str::parse)
}

/// Paginated raw readings, newest first
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> ApiResult<Page<ReadingDto>> {
    let filter = TimeFilter::from_params(query.filter.as_deref(), query.month.as_deref())?;
    let window = filter.window(Local::now().naive_local());
    let size = page_size(query.per_page, state.pagination.page_size)?;

    let page = state
        .dashboard_service
        .readings_page(window, query.page.unwrap_or(1), size)
        .await?;
    Ok(Json(page.map(ReadingDto::from)))
}

pub async fn latest_readings(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ReadingDto>> {
    let readings = state
        .dashboard_service
        .latest(state.pagination.latest_limit)
        .await?;
    Ok(Json(readings.into_iter().map(ReadingDto::from).collect()))
}

/// Store a sample pushed by a device
pub async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), TelemetryError> {
    let Json(body) = body.map_err(|rejection| TelemetryError::InvalidReading(rejection.body_text()))?;
    let timestamp = NewReading::parse_timestamp(&body.datetime)?;
    let reading = NewReading::new(body.steps, body.raw_voltage, body.raw_current, timestamp)?;
    let stored = state.dashboard_service.ingest(reading).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "success",
            id: stored.id,
        }),
    ))
}

/// Aggregated summary table
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Page<BucketDto>> {
    let granularity = granularity(query.granularity.as_deref())?;
    let range = match (query.start, query.end) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        )?),
    };
    let size = page_size(query.per_page, state.pagination.page_size)?;

    let page = state
        .dashboard_service
        .summary_page(granularity, range, query.page.unwrap_or(1), size)
        .await?;
    Ok(Json(page.map(BucketDto::from)))
}

/// Chart series of per-bucket averages
pub async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Page<ChartPointDto>> {
    let granularity = granularity(query.granularity.as_deref())?;
    let size = page_size(query.per_page, state.pagination.chart_page_size)?;

    let page = state
        .dashboard_service
        .chart_page(granularity, query.page.unwrap_or(1), size)
        .await?;
    Ok(Json(page.map(ChartPointDto::from)))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<StatsDto> {
    let filter = TimeFilter::from_params(query.filter.as_deref(), query.month.as_deref())?;
    let stats = state
        .dashboard_service
        .stats(filter.window(Local::now().naive_local()))
        .await?;
    Ok(Json(stats.into()))
}

/// Serve the cached forecast; never recomputes
pub async fn forecast(State(state): State<Arc<AppState>>) -> Json<ForecastDto> {
    let current = state.forecast_cache.current();
    Json(ForecastDto::from(current.as_ref()))
}

/// Raw readings for an inclusive month range, oldest first
pub async fn export_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Vec<ReadingDto>> {
    let start: YearMonth = query.start.parse()?;
    let end: YearMonth = query.end.parse()?;
    let readings = state.export_selector.select_range(start, end).await?;
    Ok(Json(readings.into_iter().map(ReadingDto::from).collect()))
}
