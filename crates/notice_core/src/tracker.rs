use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::TrackerError;
use crate::icon::{NoProjectIcons, ProjectIconProvider};
use crate::notice::{ArrivalTime, Notice};
use crate::notifications::{NotificationId, NotificationSurface};
use crate::store::WatermarkStore;
use crate::summary::build_summary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub notification_id: NotificationId,
    pub channel_id: String,
    pub app_name: String,
    pub small_icon: String,
    pub target: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            notification_id: NotificationId::default(),
            channel_id: "main-channel".to_string(),
            app_name: "BOINC".to_string(),
            small_icon: "notice-mail".to_string(),
            target: "notices".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Notifications are switched off; `withdrawn` tells whether one was on screen.
    Disabled { withdrawn: bool },
    /// Nothing newer than the watermark arrived.
    Unchanged,
    /// The summary was (re)displayed with `total` notices, `new_notices` of them added now.
    Displayed { new_notices: usize, total: usize },
}

pub struct NoticeTrackerBuilder {
    store: Box<dyn WatermarkStore>,
    surface: Box<dyn NotificationSurface>,
    icons: Box<dyn ProjectIconProvider>,
    config: TrackerConfig,
}

impl NoticeTrackerBuilder {
    pub fn new(store: Box<dyn WatermarkStore>, surface: Box<dyn NotificationSurface>) -> Self {
        Self {
            store,
            surface,
            icons: Box::new(NoProjectIcons),
            config: TrackerConfig::default(),
        }
    }

    pub fn with_icon_provider(mut self, icons: Box<dyn ProjectIconProvider>) -> Self {
        self.icons = icons;
        self
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notification_id(mut self, id: NotificationId) -> Self {
        self.config.notification_id = id;
        self
    }

    pub fn build(self) -> NoticeTracker {
        NoticeTracker {
            store: self.store,
            surface: self.surface,
            icons: self.icons,
            config: self.config,
            notified: Vec::new(),
            state: TrackerState::Hidden,
        }
    }
}

/// Surfaces notices newer than the persisted watermark as one summary
/// notification, accumulating them until the user acknowledges it.
pub struct NoticeTracker {
    store: Box<dyn WatermarkStore>,
    surface: Box<dyn NotificationSurface>,
    icons: Box<dyn ProjectIconProvider>,
    config: TrackerConfig,
    notified: Vec<Notice>,
    state: TrackerState,
}

impl NoticeTracker {
    pub fn builder(
        store: Box<dyn WatermarkStore>,
        surface: Box<dyn NotificationSurface>,
    ) -> NoticeTrackerBuilder {
        NoticeTrackerBuilder::new(store, surface)
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == TrackerState::Shown
    }

    /// Notices accumulated since the last acknowledgement, in arrival order of discovery.
    pub fn notified(&self) -> &[Notice] {
        &self.notified
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn watermark(&self) -> Result<ArrivalTime, TrackerError> {
        Ok(self.store.load()?)
    }

    /// Reconcile the notification with the full list of notices currently known.
    ///
    /// `all_notices` need not be sorted and may repeat notices from earlier
    /// calls; only those strictly newer than the persisted watermark count.
    #[instrument(skip(self, all_notices), fields(notices = all_notices.len()))]
    pub fn update(
        &mut self,
        all_notices: &[Notice],
        notifications_enabled: bool,
    ) -> Result<UpdateOutcome, TrackerError> {
        if !notifications_enabled {
            let withdrawn = self.withdraw_if_shown()?;
            return Ok(UpdateOutcome::Disabled { withdrawn });
        }

        let watermark = self.store.load()?;
        let mut most_recent: Option<ArrivalTime> = None;
        let mut new_notices = 0;
        for notice in all_notices {
            if notice.arrival_time.partial_cmp(&watermark) != Some(Ordering::Greater) {
                continue;
            }
            // several notices may share an arrival time, so persist only after the scan
            most_recent = Some(match most_recent {
                Some(seen) => seen.max(notice.arrival_time),
                None => notice.arrival_time,
            });
            if self.notified.contains(notice) {
                tracing::debug!(title = %notice.title, "notice already in summary");
                continue;
            }
            tracing::debug!(
                project = %notice.project_name,
                arrived = %notice.arrival_time,
                "new notice"
            );
            self.notified.push(notice.clone());
            new_notices += 1;
        }

        let Some(most_recent) = most_recent else {
            return Ok(UpdateOutcome::Unchanged);
        };

        self.store.save(most_recent.max(watermark))?;
        debug_assert!(!self.notified.is_empty());
        let payload = match build_summary(&self.notified, &self.config, self.icons.as_ref()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(%err, "skipping notice notification");
                return Ok(UpdateOutcome::Unchanged);
            }
        };
        self.surface.display(self.config.notification_id, &payload)?;
        self.state = TrackerState::Shown;
        tracing::info!(
            id = %self.config.notification_id,
            total = self.notified.len(),
            new_notices,
            "notice notification displayed"
        );
        Ok(UpdateOutcome::Displayed {
            new_notices,
            total: self.notified.len(),
        })
    }

    /// Acknowledge the notification: withdraw it and forget the accumulated notices.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) -> Result<(), TrackerError> {
        if self.withdraw_if_shown()? {
            self.notified.clear();
        }
        Ok(())
    }

    fn withdraw_if_shown(&mut self) -> Result<bool, TrackerError> {
        if self.state != TrackerState::Shown {
            return Ok(false);
        }
        self.surface.withdraw(self.config.notification_id)?;
        self.state = TrackerState::Hidden;
        tracing::info!(id = %self.config.notification_id, "notice notification withdrawn");
        Ok(true)
    }
}
