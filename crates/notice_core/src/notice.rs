use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch, as reported by the BOINC client.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrivalTime(pub f64);

impl ArrivalTime {
    pub const EARLIEST: ArrivalTime = ArrivalTime(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !self.0.is_finite() {
            return None;
        }
        let secs = self.0.trunc() as i64;
        let nanos = (self.0.fract() * 1_000_000_000.0).round() as u32;
        Utc.timestamp_opt(secs, nanos.min(999_999_999)).single()
    }

    /// The later of two arrival times.
    pub fn max(self, other: ArrivalTime) -> ArrivalTime {
        if other > self {
            other
        } else {
            self
        }
    }
}

impl From<f64> for ArrivalTime {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(when) => write!(f, "{}", when.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A project notice as delivered by the client's notice feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub arrival_time: ArrivalTime,
    pub project_name: String,
    pub title: String,
    #[serde(default)]
    pub seqno: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_time: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub link: String,
}

impl Notice {
    pub fn new(
        arrival_time: impl Into<ArrivalTime>,
        project_name: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            arrival_time: arrival_time.into(),
            project_name: project_name.into(),
            title: title.into(),
            seqno: 0,
            description: String::new(),
            create_time: 0.0,
            category: String::new(),
            link: String::new(),
        }
    }

    /// The `<project>: <title>` line used in multi-notice summaries.
    pub fn summary_line(&self) -> String {
        format!("{}: {}", self.project_name, self.title)
    }
}
