// Aggregator - Rolls raw readings up into day/week/month buckets
use crate::domain::bucket::{Bucket, BucketKey, Granularity, MonthlyPoint, SummaryStats};
use crate::domain::calendar::DateRange;
use crate::domain::error::TelemetryError;
use crate::domain::reading::Reading;
use std::collections::BTreeMap;

/// Group readings into buckets of the given granularity.
///
/// The output is ascending by bucket key and contains only buckets that saw at
/// least one reading. Readings are summed in `(timestamp, id)` order inside each
/// bucket, so the floating point totals do not depend on input order.
pub fn aggregate(
    readings: &[Reading],
    granularity: Granularity,
    range: Option<DateRange>,
) -> Result<Vec<Bucket>, TelemetryError> {
    if let Some(range) = range {
        // Re-validate: DateRange fields are public.
        DateRange::new(range.start, range.end)?;
    }

    let mut groups: BTreeMap<BucketKey, Vec<&Reading>> = BTreeMap::new();
    for reading in readings {
        let date = reading.timestamp.date();
        if range.is_some_and(|r| !r.contains(date)) {
            continue;
        }
        groups
            .entry(granularity.key_for(date))
            .or_default()
            .push(reading);
    }

    Ok(groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
            members.into_iter().fold(Bucket::empty(key), |mut bucket, r| {
                bucket.total_steps += r.steps;
                bucket.total_voltage += r.voltage;
                bucket.total_current += r.current;
                bucket.sample_count += 1;
                bucket
            })
        })
        .collect())
}

/// Monthly averages for the forecast model, chronological, gaps left out.
pub fn monthly_points(readings: &[Reading]) -> Vec<MonthlyPoint> {
    // Month granularity without a range cannot fail.
    aggregate(readings, Granularity::Month, None)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|bucket| match bucket.key {
            BucketKey::Month(month) => Some(MonthlyPoint {
                month,
                avg_voltage: bucket.avg_voltage(),
                avg_current: bucket.avg_current(),
                total_steps: bucket.total_steps,
            }),
            _ => None,
        })
        .collect()
}

/// Dashboard headline figures over a daily bucket series.
pub fn summarize(daily: &[Bucket]) -> SummaryStats {
    if daily.is_empty() {
        return SummaryStats::default();
    }

    let days = daily.len();
    let total_steps: u64 = daily.iter().map(|b| b.total_steps).sum();
    let total_voltage: f64 = daily.iter().map(|b| b.total_voltage).sum();
    let total_current: f64 = daily.iter().map(|b| b.total_current).sum();

    SummaryStats {
        days,
        total_steps,
        total_voltage,
        total_current,
        avg_steps: total_steps as f64 / days as f64,
        avg_voltage: total_voltage / days as f64,
        avg_current: total_current / days as f64,
        max_steps: daily.iter().map(|b| b.total_steps).max().unwrap_or(0),
        max_voltage: daily.iter().map(|b| b.total_voltage).fold(f64::MIN, f64::max),
        max_current: daily.iter().map(|b| b.total_current).fold(f64::MIN, f64::max),
        min_steps: daily.iter().map(|b| b.total_steps).min().unwrap_or(0),
        min_voltage: daily.iter().map(|b| b.total_voltage).fold(f64::MAX, f64::min),
        min_current: daily.iter().map(|b| b.total_current).fold(f64::MAX, f64::min),
    }
}
