pub mod error;
pub mod icon;
pub mod notice;
pub mod notifications;
pub mod shared;
pub mod store;
pub mod summary;
pub mod tracker;

pub use crate::notice::{ArrivalTime, Notice};
pub use crate::shared::SharedNoticeTracker;
pub use crate::tracker::{
    NoticeTracker, NoticeTrackerBuilder, TrackerConfig, TrackerState, UpdateOutcome,
};
