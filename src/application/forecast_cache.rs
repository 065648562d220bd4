// Forecast cache - Single-slot snapshot shared by the refresh cycle and handlers
use crate::domain::forecast::ForecastResult;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Holds the latest complete [`ForecastResult`].
///
/// Readers get an `Arc` to an immutable snapshot without locking; the refresh
/// cycle replaces the whole snapshot in one swap.
pub struct ForecastCache {
    slot: ArcSwap<ForecastResult>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self {
            slot: ArcSwap::from_pointee(ForecastResult::empty()),
        }
    }

    pub fn current(&self) -> Arc<ForecastResult> {
        self.slot.load_full()
    }

    pub fn publish(&self, result: ForecastResult) {
        self.slot.store(Arc::new(result));
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new()
    }
}
