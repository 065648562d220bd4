// InfluxDB repository implementation
use crate::application::reading_repository::ReadingRepository;
use crate::domain::calendar::TimeWindow;
use crate::domain::error::StoreError;
use crate::domain::reading::{NewReading, Reading};
use crate::infrastructure::config::{prepare_query, InfluxSettings};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

// `reading_id` is a tag so readings sharing a timestamp stay distinct points
const SELECT_READINGS: &str =
    "SELECT \"reading_id\"::tag, \"steps\", \"voltage\", \"current\" FROM \"${measurement}\"${where} ORDER BY time ${order}${limit}";
const SHOW_READING_IDS: &str = "SHOW TAG VALUES FROM \"${measurement}\" WITH KEY = \"reading_id\"";

#[derive(Debug)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    measurement: String,
    /// Last id handed out; loaded from the store on first insert
    last_id: Mutex<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[allow(dead_code)]
    name: String,
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxRepository {
    pub fn new(settings: InfluxSettings, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token,
            database: settings.database,
            retention_policy: settings.retention_policy,
            measurement: settings.measurement,
            last_id: Mutex::new(None),
        })
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    fn build_write_url(&self) -> String {
        format!(
            "{}/write?db={}&rp={}&precision=ms",
            self.host, self.database, self.retention_policy
        )
    }

    fn readings_query(&self, window: TimeWindow, descending: bool, limit: Option<usize>) -> String {
        let mut vars = HashMap::new();
        vars.insert("measurement", self.measurement.clone());
        vars.insert("where", where_clause(window));
        vars.insert("order", if descending { "DESC" } else { "ASC" }.to_string());
        vars.insert(
            "limit",
            limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default(),
        );
        prepare_query(SELECT_READINGS, &vars)
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse, StoreError> {
        tracing::debug!("Executing InfluxQL: {}", query);

        let response = self
            .client
            .get(self.build_query_url(query))
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let data = response.json::<InfluxQLResponse>().await?;

        // Check for errors in the response
        if let Some(error) = data.results.first().and_then(|r| r.error.as_ref()) {
            return Err(StoreError::Query(error.clone()));
        }

        Ok(data)
    }

    async fn max_stored_id(&self) -> Result<i64, StoreError> {
        let mut vars = HashMap::new();
        vars.insert("measurement", self.measurement.clone());
        let response = self.execute_query(&prepare_query(SHOW_READING_IDS, &vars)).await?;
        Ok(max_reading_id(&response))
    }
}

#[async_trait]
impl ReadingRepository for InfluxRepository {
    async fn readings_in(&self, window: TimeWindow) -> Result<Vec<Reading>, StoreError> {
        let response = self.execute_query(&self.readings_query(window, false, None)).await?;
        let mut readings = decode_readings(response)?;
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(readings)
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let query = self.readings_query(TimeWindow::unbounded(), true, Some(limit));
        let mut readings = decode_readings(self.execute_query(&query).await?)?;
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(readings)
    }

    async fn insert(&self, reading: NewReading) -> Result<Reading, StoreError> {
        // Held across the write so concurrent inserts get distinct, increasing ids
        let mut last_id = self.last_id.lock().await;
        let current = match *last_id {
            Some(id) => id,
            None => self.max_stored_id().await?,
        };
        let stored = reading.with_id(current + 1);

        let response = self
            .client
            .post(self.build_write_url())
            .header("Authorization", format!("Token {}", self.token))
            .body(line_protocol(&self.measurement, &stored))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        *last_id = Some(stored.id);
        Ok(stored)
    }
}

fn influx_time(ts: NaiveDateTime) -> String {
    ts.and_utc().format("%Y-%m-%dT%H:%M:%S%.fZ").to_string()
}

fn where_clause(window: TimeWindow) -> String {
    let mut conditions = Vec::new();
    if let Some(start) = window.start {
        conditions.push(format!("time >= '{}'", influx_time(start)));
    }
    if let Some(end) = window.end {
        conditions.push(format!("time < '{}'", influx_time(end)));
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn line_protocol(measurement: &str, reading: &Reading) -> String {
    format!(
        "{},reading_id={} steps={}i,voltage={},current={} {}",
        measurement.replace(' ', "\\ ").replace(',', "\\,"),
        reading.id,
        reading.steps,
        reading.voltage,
        reading.current,
        reading.timestamp.and_utc().timestamp_millis()
    )
}

/// Highest id among the `reading_id` tag values, 0 for an empty store.
fn max_reading_id(response: &InfluxQLResponse) -> i64 {
    response
        .results
        .iter()
        .filter_map(|r| r.series.as_ref())
        .flatten()
        .flat_map(|s| {
            let idx = s.columns.iter().position(|c| c == "value").unwrap_or(1);
            s.values.iter().filter_map(move |row| row.get(idx).and_then(as_id))
        })
        .max()
        .unwrap_or(0)
}

// Tag values come back as strings
fn as_id(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn decode_readings(response: InfluxQLResponse) -> Result<Vec<Reading>, StoreError> {
    let mut readings = Vec::new();
    let Some(series) = response.results.into_iter().next().and_then(|r| r.series) else {
        return Ok(readings);
    };

    for s in series {
        let column = |name: &str| {
            s.columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| StoreError::Decode(format!("missing column '{}'", name)))
        };
        let time_idx = column("time")?;
        let id_idx = column("reading_id")?;
        let steps_idx = column("steps")?;
        let voltage_idx = column("voltage")?;
        let current_idx = column("current")?;

        for row in &s.values {
            let field = |idx: usize| {
                row.get(idx)
                    .ok_or_else(|| StoreError::Decode(format!("short row: {:?}", row)))
            };

            let time = field(time_idx)?
                .as_str()
                .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
                .ok_or_else(|| StoreError::Decode(format!("bad time in row {:?}", row)))?;
            let id = as_id(field(id_idx)?)
                .ok_or_else(|| StoreError::Decode(format!("bad reading_id in row {:?}", row)))?;
            let steps = field(steps_idx)?
                .as_u64()
                .ok_or_else(|| StoreError::Decode(format!("bad steps in row {:?}", row)))?;
            let voltage = field(voltage_idx)?
                .as_f64()
                .ok_or_else(|| StoreError::Decode(format!("bad voltage in row {:?}", row)))?;
            let current = field(current_idx)?
                .as_f64()
                .ok_or_else(|| StoreError::Decode(format!("bad current in row {:?}", row)))?;

            readings.push(Reading {
                id,
                steps,
                voltage,
                current,
                timestamp: time.naive_utc(),
            });
        }
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn repository() -> InfluxRepository {
        InfluxRepository::new(
            InfluxSettings {
                host: "http://influx:8086/".into(),
                token: "secret".into(),
                database: "capstone".into(),
                retention_policy: "autogen".into(),
                measurement: "sensor_data".into(),
            },
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_readings_query_with_window() {
        let window = TimeWindow {
            start: Some(at(2025, 1, 1)),
            end: Some(at(2025, 3, 1)),
        };
        let query = repository().readings_query(window, false, None);
        assert_eq!(
            query,
            "SELECT \"reading_id\"::tag, \"steps\", \"voltage\", \"current\" FROM \"sensor_data\" \
             WHERE time >= '2025-01-01T00:00:00Z' AND time < '2025-03-01T00:00:00Z' ORDER BY time ASC"
        );
    }

    #[test]
    fn test_latest_query_is_descending_and_limited() {
        let query = repository().readings_query(TimeWindow::unbounded(), true, Some(10));
        assert!(query.ends_with("FROM \"sensor_data\" ORDER BY time DESC LIMIT 10"));
    }

    #[test]
    fn test_urls_trim_host_and_encode_query() {
        let repo = repository();
        assert_eq!(
            repo.build_query_url("SELECT 1"),
            "http://influx:8086/query?db=capstone&rp=autogen&q=SELECT%201"
        );
        assert_eq!(
            repo.build_write_url(),
            "http://influx:8086/write?db=capstone&rp=autogen&precision=ms"
        );
    }

    #[test]
    fn test_line_protocol() {
        let reading = Reading {
            id: 42,
            steps: 120,
            voltage: 3.25,
            current: 0.5,
            timestamp: at(2025, 1, 1),
        };
        assert_eq!(
            line_protocol("sensor_data", &reading),
            "sensor_data,reading_id=42 steps=120i,voltage=3.25,current=0.5 1735689600000"
        );
    }

    // Series key is measurement plus tag set; InfluxDB overwrites points sharing key and time
    fn point_key(line: &str) -> (String, String) {
        let mut parts = line.split(' ');
        let series = parts.next().unwrap_or_default().to_string();
        let time = parts.nth(1).unwrap_or_default().to_string();
        (series, time)
    }

    #[test]
    fn test_same_minute_readings_are_distinct_points() {
        let ts = NewReading::parse_timestamp("2025-01-31T14:05").unwrap();
        let first = NewReading::new(100, 3.1, 0.2, ts).unwrap().with_id(1);
        let second = NewReading::new(50, 3.3, 0.4, ts).unwrap().with_id(2);

        let a = point_key(&line_protocol("sensor_data", &first));
        let b = point_key(&line_protocol("sensor_data", &second));
        assert_eq!(a.1, b.1);
        assert_ne!(a, b);
        assert_eq!(a.0, "sensor_data,reading_id=1");
    }

    #[test]
    fn test_max_reading_id_from_tag_values() {
        let body = r#"{"results":[{"statement_id":0,"series":[{"name":"sensor_data",
            "columns":["key","value"],
            "values":[["reading_id","9"],["reading_id","10"],["reading_id","2"]]}]}]}"#;
        let response: InfluxQLResponse = serde_json::from_str(body).unwrap();
        assert_eq!(max_reading_id(&response), 10);

        let empty: InfluxQLResponse = serde_json::from_str(r#"{"results":[{"statement_id":0}]}"#).unwrap();
        assert_eq!(max_reading_id(&empty), 0);
    }

    #[test]
    fn test_decode_readings() {
        let body = r#"{"results":[{"statement_id":0,"series":[{"name":"sensor_data",
            "columns":["time","reading_id","steps","voltage","current"],
            "values":[["2025-01-01T08:30:00Z","1",120,3.1,0.2],
                      ["2025-01-02T09:00:00Z",2,80,3.3,0.25]]}]}]}"#;
        let response: InfluxQLResponse = serde_json::from_str(body).unwrap();
        let readings = decode_readings(response).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].id, 1);
        assert_eq!(readings[0].steps, 120);
        assert_eq!(readings[1].voltage, 3.3);
        assert_eq!(
            readings[0].timestamp,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(8, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_empty_and_malformed_responses() {
        let empty: InfluxQLResponse = serde_json::from_str(r#"{"results":[{"statement_id":0}]}"#).unwrap();
        assert!(decode_readings(empty).unwrap().is_empty());

        let missing: InfluxQLResponse = serde_json::from_str(
            r#"{"results":[{"series":[{"name":"sensor_data","columns":["time","steps"],"values":[]}]}]}"#,
        )
        .unwrap();
        assert!(matches!(decode_readings(missing), Err(StoreError::Decode(_))));
    }
}
