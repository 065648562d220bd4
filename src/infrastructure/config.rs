use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub influx: Option<InfluxSettings>,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub pagination: PaginationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Influx,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

fn default_measurement() -> String {
    "sensor_data".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastSettings {
    /// Seconds between scheduled refreshes (default: once a day)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Monthly points required before a trend line is fitted
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            min_points: default_min_points(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    86_400
}

fn default_min_points() -> usize {
    crate::application::forecast_model::DEFAULT_MIN_POINTS
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_chart_page_size")]
    pub chart_page_size: usize,
    #[serde(default = "default_latest_limit")]
    pub latest_limit: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            chart_page_size: default_chart_page_size(),
            latest_limit: default_latest_limit(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_chart_page_size() -> usize {
    7
}

fn default_latest_limit() -> usize {
    10
}

impl Settings {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.server.host, self.server.port))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.backend == StoreBackend::Influx && self.influx.is_none() {
            bail!("store backend is influx but no [influx] section is configured");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be positive");
        }
        if self.forecast.refresh_interval_secs == 0 {
            bail!("forecast.refresh_interval_secs must be positive");
        }
        if self.forecast.min_points == 0 {
            bail!("forecast.min_points must be at least 1");
        }
        let p = &self.pagination;
        if p.page_size == 0 || p.chart_page_size == 0 || p.latest_limit == 0 {
            bail!("pagination sizes must be positive");
        }
        Ok(())
    }
}

/// Load `config/settings.*`, then apply `TELEMETRY__SECTION__KEY` environment overrides.
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/settings").required(false))
        .add_source(
            config::Environment::with_prefix("TELEMETRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
