// Application layer - Use cases and the Reading Store seam
pub mod aggregator;
pub mod dashboard_service;
pub mod export_selector;
pub mod forecast_cache;
pub mod forecast_model;
pub mod forecast_refresh;
pub mod paginator;
pub mod reading_repository;
