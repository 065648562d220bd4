// Export selector - Raw readings for an inclusive month range
use crate::application::reading_repository::ReadingRepository;
use crate::domain::calendar::{TimeWindow, YearMonth};
use crate::domain::error::TelemetryError;
use crate::domain::reading::Reading;
use std::sync::Arc;

#[derive(Clone)]
pub struct ExportSelector {
    repository: Arc<dyn ReadingRepository>,
}

impl ExportSelector {
    pub fn new(repository: Arc<dyn ReadingRepository>) -> Self {
        Self { repository }
    }

    /// Every reading from the first day of `start` up to the last day of
    /// `end`, oldest first.
    pub async fn select_range(&self, start: YearMonth, end: YearMonth) -> Result<Vec<Reading>, TelemetryError> {
        if start > end {
            return Err(TelemetryError::invalid_range(start, end));
        }

        let window = TimeWindow {
            start: Some(start.start()),
            end: Some(end.succ().start()),
        };
        let mut readings = self.repository.readings_in(window).await?;
        readings.retain(|r| window.contains(r.timestamp));
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        tracing::debug!("Selected {} reading(s) for export {}..={}", readings.len(), start, end);
        Ok(readings)
    }
}
