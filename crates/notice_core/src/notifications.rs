use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::icon::ProjectIcon;

/// Identity of the one notification the tracker owns on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i32);

impl Default for NotificationId {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LargeIcon {
    Project(ProjectIcon),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: Option<String>,
    /// Inbox-style lines, one per notice, only set for multi-notice summaries.
    pub lines: Vec<String>,
    pub large_icon: LargeIcon,
    pub small_icon: String,
    pub badge_count: Option<usize>,
    pub sub_text: Option<String>,
    pub channel_id: String,
    pub auto_cancel: bool,
    /// View opened when the user taps the notification.
    pub target: String,
}

/// Platform-specific notification adapters will implement this trait.
pub trait NotificationSurface: Send + Sync {
    fn display(
        &self,
        id: NotificationId,
        payload: &NotificationPayload,
    ) -> Result<(), SurfaceError>;
    fn withdraw(&self, id: NotificationId) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Displayed(NotificationId, NotificationPayload),
    Withdrawn(NotificationId),
}

/// Keeps every call it receives. Useful for headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    /// The payload currently on screen, if the last call was a display.
    pub fn current(&self) -> Option<NotificationPayload> {
        match self.events.lock().last() {
            Some(SurfaceEvent::Displayed(_, payload)) => Some(payload.clone()),
            _ => None,
        }
    }
}

impl NotificationSurface for RecordingSurface {
    fn display(
        &self,
        id: NotificationId,
        payload: &NotificationPayload,
    ) -> Result<(), SurfaceError> {
        self.events
            .lock()
            .push(SurfaceEvent::Displayed(id, payload.clone()));
        Ok(())
    }

    fn withdraw(&self, id: NotificationId) -> Result<(), SurfaceError> {
        self.events.lock().push(SurfaceEvent::Withdrawn(id));
        Ok(())
    }
}

impl<T: NotificationSurface + ?Sized> NotificationSurface for std::sync::Arc<T> {
    fn display(
        &self,
        id: NotificationId,
        payload: &NotificationPayload,
    ) -> Result<(), SurfaceError> {
        (**self).display(id, payload)
    }

    fn withdraw(&self, id: NotificationId) -> Result<(), SurfaceError> {
        (**self).withdraw(id)
    }
}
