// In-process Reading Store
use crate::application::reading_repository::ReadingRepository;
use crate::domain::calendar::TimeWindow;
use crate::domain::error::StoreError;
use crate::domain::reading::{NewReading, Reading};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Append-only store kept in memory. Used with `backend = "memory"` and in tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    rows: RwLock<Vec<Reading>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingRepository for MemoryRepository {
    async fn readings_in(&self, window: TimeWindow) -> Result<Vec<Reading>, StoreError> {
        let rows = self.rows.read().await;
        let mut selected: Vec<Reading> = rows
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(selected)
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let mut all = self.readings_in(TimeWindow::unbounded()).await?;
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }

    async fn insert(&self, reading: NewReading) -> Result<Reading, StoreError> {
        let mut rows = self.rows.write().await;
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let stored = reading.with_id(id);
        rows.push(stored.clone());
        Ok(stored)
    }
}
