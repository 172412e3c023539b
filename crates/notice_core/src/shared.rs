use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TrackerError;
use crate::notice::{ArrivalTime, Notice};
use crate::tracker::{NoticeTracker, TrackerState, UpdateOutcome};

/// Cloneable handle for hosts that call the tracker from several threads.
/// Each operation holds the lock for its whole watermark read/persist/display sequence.
#[derive(Clone)]
pub struct SharedNoticeTracker {
    inner: Arc<Mutex<NoticeTracker>>,
}

impl SharedNoticeTracker {
    pub fn new(tracker: NoticeTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    pub fn update(
        &self,
        all_notices: &[Notice],
        notifications_enabled: bool,
    ) -> Result<UpdateOutcome, TrackerError> {
        self.inner.lock().update(all_notices, notifications_enabled)
    }

    pub fn cancel(&self) -> Result<(), TrackerError> {
        self.inner.lock().cancel()
    }

    pub fn state(&self) -> TrackerState {
        self.inner.lock().state()
    }

    pub fn watermark(&self) -> Result<ArrivalTime, TrackerError> {
        self.inner.lock().watermark()
    }

    pub fn notified_count(&self) -> usize {
        self.inner.lock().notified().len()
    }
}

impl From<NoticeTracker> for SharedNoticeTracker {
    fn from(tracker: NoticeTracker) -> Self {
        Self::new(tracker)
    }
}
