// Response and request bodies. Display rounding happens here and nowhere else.
use crate::domain::bucket::{Bucket, BucketKey, SummaryStats};
use crate::domain::calendar::YearMonth;
use crate::domain::forecast::ForecastResult;
use crate::domain::reading::Reading;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const NO_FORECAST_MESSAGE: &str =
    "Not enough historical data for a monthly forecast. Please collect more data.";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub steps: i64,
    pub datetime: String,
    pub raw_voltage: f64,
    pub raw_current: f64,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadingDto {
    pub id: i64,
    pub steps: u64,
    pub voltage: f64,
    pub current: f64,
    pub datetime: String,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            steps: r.steps,
            voltage: r.voltage,
            current: r.current,
            datetime: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketDto {
    pub key: BucketKey,
    pub start_date: NaiveDate,
    pub total_steps: u64,
    pub total_voltage: f64,
    pub total_current: f64,
    pub sample_count: u64,
}

impl From<Bucket> for BucketDto {
    fn from(b: Bucket) -> Self {
        Self {
            key: b.key,
            start_date: b.key.start_date(),
            total_steps: b.total_steps,
            total_voltage: round2(b.total_voltage),
            total_current: round2(b.total_current),
            sample_count: b.sample_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChartPointDto {
    pub label: String,
    pub avg_voltage: f64,
    pub avg_current: f64,
    pub total_steps: u64,
}

impl From<Bucket> for ChartPointDto {
    fn from(b: Bucket) -> Self {
        let label = match b.key {
            BucketKey::Day(date) => date.format("%b %d").to_string(),
            BucketKey::Week { .. } => format!("Week of {}", b.key.start_date().format("%b %d")),
            BucketKey::Month(month) => month.first_day().format("%b %Y").to_string(),
        };
        Self {
            label,
            avg_voltage: round2(b.avg_voltage()),
            avg_current: round2(b.avg_current()),
            total_steps: b.total_steps,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsDto {
    pub days: usize,
    pub total_steps: u64,
    pub total_voltage: f64,
    pub total_current: f64,
    pub avg_steps: f64,
    pub avg_voltage: f64,
    pub avg_current: f64,
    pub max_steps: u64,
    pub max_voltage: f64,
    pub max_current: f64,
    pub min_steps: u64,
    pub min_voltage: f64,
    pub min_current: f64,
}

impl From<SummaryStats> for StatsDto {
    fn from(s: SummaryStats) -> Self {
        Self {
            days: s.days,
            total_steps: s.total_steps,
            total_voltage: round2(s.total_voltage),
            total_current: round2(s.total_current),
            avg_steps: round2(s.avg_steps),
            avg_voltage: round2(s.avg_voltage),
            avg_current: round2(s.avg_current),
            max_steps: s.max_steps,
            max_voltage: round2(s.max_voltage),
            max_current: round2(s.max_current),
            min_steps: s.min_steps,
            min_voltage: round2(s.min_voltage),
            min_current: round2(s.min_current),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastDto {
    pub forecast_date: Option<NaiveDate>,
    pub forecast_month: Option<String>,
    pub forecast_voltage: Option<f64>,
    pub forecast_current: Option<f64>,
    pub best_voltage_month: Option<YearMonth>,
    pub best_voltage_value: Option<f64>,
    pub best_current_month: Option<YearMonth>,
    pub best_current_value: Option<f64>,
    pub training_months: usize,
    pub computed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<&ForecastResult> for ForecastDto {
    fn from(f: &ForecastResult) -> Self {
        Self {
            forecast_date: f.forecast_date,
            forecast_month: f.forecast_date.map(|d| d.format("%B %Y").to_string()),
            forecast_voltage: f.predicted_voltage.map(round2),
            forecast_current: f.predicted_current.map(round2),
            best_voltage_month: f.best_voltage_month,
            best_voltage_value: f.best_voltage_value.map(round2),
            best_current_month: f.best_current_month,
            best_current_value: f.best_current_value.map(round2),
            training_months: f.training_months,
            computed_at: f.computed_at,
            message: (!f.is_available()).then_some(NO_FORECAST_MESSAGE),
        }
    }
}
