// Forecast domain model
use super::calendar::YearMonth;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Coefficients of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn flat(value: f64) -> Self {
        Self {
            slope: 0.0,
            intercept: value,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// A historical month ranked highest for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestMonth {
    pub month: YearMonth,
    pub value: f64,
}

/// Output of one model run over the monthly training series.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub next_month: YearMonth,
    pub voltage_fit: LinearFit,
    pub current_fit: LinearFit,
    pub predicted_voltage: f64,
    pub predicted_current: f64,
    pub best_voltage: BestMonth,
    pub best_current: BestMonth,
    pub training_months: usize,
}

/// The process-wide forecast snapshot served to request handlers.
///
/// Every field is optional: a freshly started service holds [`ForecastResult::empty`],
/// and a refresh over an empty store publishes a result with only `computed_at` set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ForecastResult {
    pub forecast_date: Option<NaiveDate>,
    pub predicted_voltage: Option<f64>,
    pub predicted_current: Option<f64>,
    pub best_voltage_month: Option<YearMonth>,
    pub best_voltage_value: Option<f64>,
    pub best_current_month: Option<YearMonth>,
    pub best_current_value: Option<f64>,
    pub training_months: usize,
    pub computed_at: Option<DateTime<Utc>>,
}

impl ForecastResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unavailable(computed_at: DateTime<Utc>) -> Self {
        Self {
            computed_at: Some(computed_at),
            ..Self::default()
        }
    }

    pub fn from_projection(projection: &Projection, computed_at: DateTime<Utc>) -> Self {
        Self {
            forecast_date: Some(projection.next_month.first_day()),
            predicted_voltage: Some(projection.predicted_voltage),
            predicted_current: Some(projection.predicted_current),
            best_voltage_month: Some(projection.best_voltage.month),
            best_voltage_value: Some(projection.best_voltage.value),
            best_current_month: Some(projection.best_current.month),
            best_current_value: Some(projection.best_current.value),
            training_months: projection.training_months,
            computed_at: Some(computed_at),
        }
    }

    pub fn is_available(&self) -> bool {
        self.forecast_date.is_some()
    }
}
