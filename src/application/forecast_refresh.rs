// Refresh cycle - Recomputes the forecast cache in the background
use crate::application::aggregator::monthly_points;
use crate::application::forecast_cache::ForecastCache;
use crate::application::forecast_model::fit_and_predict;
use crate::application::reading_repository::ReadingRepository;
use crate::domain::calendar::TimeWindow;
use crate::domain::error::{StoreError, TelemetryError};
use crate::domain::forecast::ForecastResult;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{MissedTickBehavior, interval, timeout};

/// Configuration for the refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between scheduled refreshes
    pub interval: Duration,
    /// Monthly points needed before a trend is fitted
    pub min_points: usize,
    /// Upper bound on a single Reading Store scan
    pub store_timeout: Duration,
}

/// Asks the running cycle to refresh before its next scheduled tick.
///
/// Requests made while a refresh is in flight collapse into one follow-up run.
#[derive(Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn request(&self) {
        self.notify.notify_one();
    }

    async fn requested(&self) {
        self.notify.notified().await;
    }
}

pub struct RefreshCycle {
    repository: Arc<dyn ReadingRepository>,
    cache: Arc<ForecastCache>,
    config: RefreshConfig,
    trigger: RefreshTrigger,
}

impl RefreshCycle {
    pub fn new(
        repository: Arc<dyn ReadingRepository>,
        cache: Arc<ForecastCache>,
        config: RefreshConfig,
        trigger: RefreshTrigger,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
            trigger,
        }
    }

    /// Run the refresh loop forever.
    ///
    /// The caller is expected to have run the startup refresh already, so the
    /// interval's immediate first tick is consumed. Refreshes run one after
    /// another on this task and never overlap; ticks missed while a refresh
    /// was running are skipped.
    pub async fn run(self) {
        tracing::info!(
            "Forecast refresh cycle started (interval: {}s, min points: {})",
            self.config.interval.as_secs(),
            self.config.min_points
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.trigger.requested() => {
                    tracing::debug!("Forecast refresh requested ahead of schedule");
                }
            }

            self.refresh_logged().await;
        }
    }

    /// Refresh once, containing any failure. The previous snapshot is kept on error.
    pub async fn refresh_logged(&self) {
        match self.refresh_once().await {
            Ok(result) if result.is_available() => {
                tracing::info!(
                    "Forecast cache updated: {} from {} month(s)",
                    result
                        .forecast_date
                        .map(|d| d.format("%Y-%m").to_string())
                        .unwrap_or_default(),
                    result.training_months
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Forecast refresh failed, keeping previous forecast: {}", e);
            }
        }
    }

    /// Scan the store, fit the model and publish a new snapshot.
    ///
    /// Nothing is published when the scan fails.
    pub async fn refresh_once(&self) -> Result<Arc<ForecastResult>, TelemetryError> {
        let readings = timeout(
            self.config.store_timeout,
            self.repository.readings_in(TimeWindow::unbounded()),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.config.store_timeout.as_secs()))??;

        let points = monthly_points(&readings);
        let computed_at = Utc::now();

        let result = match fit_and_predict(&points, self.config.min_points) {
            Ok(projection) => ForecastResult::from_projection(&projection, computed_at),
            Err(TelemetryError::InsufficientData { available }) => {
                tracing::warn!(
                    "No forecast available: {} monthly point(s) in the store",
                    available
                );
                ForecastResult::unavailable(computed_at)
            }
            Err(e) => return Err(e),
        };

        self.cache.publish(result);
        Ok(self.cache.current())
    }
}
