// Repository trait for the Reading Store
use crate::domain::calendar::TimeWindow;
use crate::domain::error::StoreError;
use crate::domain::reading::{NewReading, Reading};
use async_trait::async_trait;

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Readings whose timestamp falls inside the half-open window,
    /// in ascending timestamp order
    async fn readings_in(&self, window: TimeWindow) -> Result<Vec<Reading>, StoreError>;

    /// The most recent `limit` readings, newest first
    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, StoreError>;

    /// Append a reading; the store assigns the next id
    async fn insert(&self, reading: NewReading) -> Result<Reading, StoreError>;
}
