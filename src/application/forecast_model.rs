// Forecast model - Linear trend over monthly averages
use crate::domain::bucket::MonthlyPoint;
use crate::domain::error::TelemetryError;
use crate::domain::forecast::{BestMonth, LinearFit, Projection};

pub const DEFAULT_MIN_POINTS: usize = 2;

/// Fit voltage and current independently and project the month after the
/// latest observed one.
///
/// `points` must be chronological. The x axis is the position in the series, so
/// months without data do not leave holes in the index. With fewer than
/// `min_points` points (but at least one) the projection stays flat at the
/// latest observed value.
pub fn fit_and_predict(points: &[MonthlyPoint], min_points: usize) -> Result<Projection, TelemetryError> {
    let latest = points
        .last()
        .ok_or(TelemetryError::InsufficientData { available: 0 })?;

    let voltages: Vec<f64> = points.iter().map(|p| p.avg_voltage).collect();
    let currents: Vec<f64> = points.iter().map(|p| p.avg_current).collect();

    let (voltage_fit, current_fit) = if points.len() >= min_points.max(2) {
        (least_squares(&voltages), least_squares(&currents))
    } else {
        (
            LinearFit::flat(latest.avg_voltage),
            LinearFit::flat(latest.avg_current),
        )
    };

    let next_x = points.len() as f64;
    Ok(Projection {
        next_month: latest.month.succ(),
        voltage_fit,
        current_fit,
        predicted_voltage: voltage_fit.predict(next_x),
        predicted_current: current_fit.predict(next_x),
        best_voltage: best_month(points, |p| p.avg_voltage).unwrap_or(BestMonth {
            month: latest.month,
            value: latest.avg_voltage,
        }),
        best_current: best_month(points, |p| p.avg_current).unwrap_or(BestMonth {
            month: latest.month,
            value: latest.avg_current,
        }),
        training_months: points.len(),
    })
}

/// Ordinary least squares over `(index, value)` pairs. Needs at least two values.
fn least_squares(ys: &[f64]) -> LinearFit {
    let n = ys.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (sxy, sxx) = ys
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
            let dx = i as f64 - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

    if sxx == 0.0 {
        return LinearFit::flat(mean_y);
    }

    let slope = sxy / sxx;
    LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}

/// Highest historical month for one metric; the earliest month wins a tie.
pub fn best_month(points: &[MonthlyPoint], metric: impl Fn(&MonthlyPoint) -> f64) -> Option<BestMonth> {
    points.iter().fold(None, |best: Option<BestMonth>, point| {
        let value = metric(point);
        match best {
            Some(b) if b.value >= value => Some(b),
            _ => Some(BestMonth {
                month: point.month,
                value,
            }),
        }
    })
}
