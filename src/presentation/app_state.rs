// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::export_selector::ExportSelector;
use crate::application::forecast_cache::ForecastCache;
use crate::infrastructure::config::PaginationSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub export_selector: ExportSelector,
    pub forecast_cache: Arc<ForecastCache>,
    pub pagination: PaginationSettings,
}
