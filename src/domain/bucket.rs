// Aggregated rollup models
use super::calendar::YearMonth;
use super::error::TelemetryError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Key of the bucket that `date` falls into.
    pub fn key_for(&self, date: NaiveDate) -> BucketKey {
        match self {
            Self::Day => BucketKey::Day(date),
            Self::Week => {
                let iso = date.iso_week();
                BucketKey::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Self::Month => BucketKey::Month(YearMonth::of(date)),
        }
    }
}

impl FromStr for Granularity {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(TelemetryError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Bucket identity. Ordering is chronological within one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Day(NaiveDate),
    /// ISO year and week number, weeks starting on Monday.
    Week { year: i32, week: u32 },
    Month(YearMonth),
}

impl BucketKey {
    /// First calendar day covered by the bucket.
    pub fn start_date(&self) -> NaiveDate {
        match self {
            Self::Day(date) => *date,
            Self::Week { year, week } => {
                NaiveDate::from_isoywd_opt(*year, *week, Weekday::Mon).unwrap_or(NaiveDate::MIN)
            }
            Self::Month(month) => month.first_day(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Week { year, week } => write!(f, "{year:04}-W{week:02}"),
            Self::Month(month) => write!(f, "{month}"),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sums over every reading sharing a key. Values are kept at full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: BucketKey,
    pub total_steps: u64,
    pub total_voltage: f64,
    pub total_current: f64,
    pub sample_count: u64,
}

impl Bucket {
    pub fn empty(key: BucketKey) -> Self {
        Self {
            key,
            total_steps: 0,
            total_voltage: 0.0,
            total_current: 0.0,
            sample_count: 0,
        }
    }

    pub fn avg_voltage(&self) -> f64 {
        mean(self.total_voltage, self.sample_count)
    }

    pub fn avg_current(&self) -> f64 {
        mean(self.total_current, self.sample_count)
    }
}

fn mean(total: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// One month's averages, used as a single regression training sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub avg_voltage: f64,
    pub avg_current: f64,
    pub total_steps: u64,
}

/// Headline figures for the dashboard, computed over daily buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryStats {
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
