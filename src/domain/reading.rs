// Raw sample domain model
use super::error::TelemetryError;
use chrono::NaiveDateTime;
use serde::Serialize;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One stored sample. Immutable once the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: i64,
    pub steps: u64,
    pub voltage: f64,
    pub current: f64,
    pub timestamp: NaiveDateTime,
}

/// A validated sample waiting for the store to assign an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub steps: u64,
    pub voltage: f64,
    pub current: f64,
    pub timestamp: NaiveDateTime,
}

impl NewReading {
    pub fn new(
        steps: i64,
        voltage: f64,
        current: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Self, TelemetryError> {
        let steps = u64::try_from(steps)
            .map_err(|_| TelemetryError::InvalidReading(format!("steps must be >= 0, got {steps}")))?;
        check_measurement("voltage", voltage)?;
        check_measurement("current", current)?;
        Ok(Self {
            steps,
            voltage,
            current,
            timestamp,
        })
    }

    /// Parses a device timestamp such as `2025-01-31T14:05` or `2025-01-31 14:05:09`.
    pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TelemetryError> {
        let raw = raw.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| TelemetryError::InvalidReading(format!("unrecognised timestamp '{raw}'")))
    }

    pub fn with_id(self, id: i64) -> Reading {
        Reading {
            id,
            steps: self.steps,
            voltage: self.voltage,
            current: self.current,
            timestamp: self.timestamp,
        }
    }
}

fn check_measurement(name: &str, value: f64) -> Result<(), TelemetryError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TelemetryError::InvalidReading(format!(
            "{name} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}
