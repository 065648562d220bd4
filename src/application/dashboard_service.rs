// Dashboard service - Use cases behind the tables, charts and ingestion endpoint
use crate::application::aggregator::{aggregate, summarize};
use crate::application::forecast_refresh::RefreshTrigger;
use crate::application::paginator::paginate;
use crate::application::reading_repository::ReadingRepository;
use crate::domain::bucket::{Bucket, Granularity, SummaryStats};
use crate::domain::calendar::{DateRange, TimeWindow};
use crate::domain::error::TelemetryError;
use crate::domain::page::Page;
use crate::domain::reading::{NewReading, Reading};
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn ReadingRepository>,
    refresh: RefreshTrigger,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn ReadingRepository>, refresh: RefreshTrigger) -> Self {
        Self { repository, refresh }
    }

    /// Aggregated buckets for the summary table, oldest first.
    pub async fn summary_page(
        &self,
        granularity: Granularity,
        range: Option<DateRange>,
        page: i64,
        page_size: usize,
    ) -> Result<Page<Bucket>, TelemetryError> {
        let buckets = self.buckets(granularity, range).await?;
        paginate(&buckets, page, page_size)
    }

    /// Same bucket series as the summary table; the chart shows averages.
    pub async fn chart_page(
        &self,
        granularity: Granularity,
        page: i64,
        page_size: usize,
    ) -> Result<Page<Bucket>, TelemetryError> {
        let buckets = self.buckets(granularity, None).await?;
        paginate(&buckets, page, page_size)
    }

    pub async fn stats(&self, window: TimeWindow) -> Result<SummaryStats, TelemetryError> {
        let readings = self.repository.readings_in(window).await?;
        let daily = aggregate(&readings, Granularity::Day, None)?;
        Ok(summarize(&daily))
    }

    /// Raw reading table, newest first.
    pub async fn readings_page(
        &self,
        window: TimeWindow,
        page: i64,
        page_size: usize,
    ) -> Result<Page<Reading>, TelemetryError> {
        let mut readings = self.repository.readings_in(window).await?;
        readings.reverse();
        paginate(&readings, page, page_size)
    }

    pub async fn latest(&self, limit: usize) -> Result<Vec<Reading>, TelemetryError> {
        Ok(self.repository.latest(limit).await?)
    }

    /// Store a new reading and ask the refresh cycle to pick it up early.
    pub async fn ingest(&self, reading: NewReading) -> Result<Reading, TelemetryError> {
        let stored = self.repository.insert(reading).await?;
        tracing::debug!("Stored reading {} at {}", stored.id, stored.timestamp);
        self.refresh.request();
        Ok(stored)
    }

    async fn buckets(
        &self,
        granularity: Granularity,
        range: Option<DateRange>,
    ) -> Result<Vec<Bucket>, TelemetryError> {
        let window = range.map(|r| r.window()).unwrap_or_default();
        let readings = self.repository.readings_in(window).await?;
        aggregate(&readings, granularity, range)
    }
}
