use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use notice_core::icon::DirectoryIconProvider;
use notice_core::notifications::{NotificationId, NotificationSurface};
use notice_core::store::FileWatermarkStore;
use notice_core::{NoticeTracker, UpdateOutcome};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::feed::load_feed;
use crate::surface::TerminalSurface;

pub const WATERMARK_FILE: &str = "notice_watermark.json";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) feed_path: PathBuf,
    pub(crate) data_dir: PathBuf,
    pub(crate) icon_dir: Option<PathBuf>,
    pub(crate) notifications_enabled: bool,
    pub(crate) watch: bool,
    pub(crate) notification_id: NotificationId,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(feed) = lookup("BOINC_NOTICE_FEED") {
            config.feed_path = PathBuf::from(feed);
        }
        if let Some(dir) = lookup("BOINC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BOINC_PROJECT_ICON_DIR") {
            if !dir.trim().is_empty() {
                config.icon_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(flag) = lookup("BOINC_NOTICE_NOTIFICATIONS") {
            config.notifications_enabled = parse_flag(&flag).unwrap_or(true);
        }
        if let Some(flag) = lookup("BOINC_NOTICE_WATCH") {
            config.watch = parse_flag(&flag).unwrap_or(false);
        }
        if let Some(id) = lookup("BOINC_NOTIFICATION_ID") {
            let value = id
                .trim()
                .parse::<i32>()
                .with_context(|| format!("BOINC_NOTIFICATION_ID `{id}` is not an integer"))?;
            config.notification_id = NotificationId(value);
        }
        Ok(config)
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.data_dir.join(WATERMARK_FILE)
    }

    pub fn feed_path(&self) -> &Path {
        &self.feed_path
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_path: PathBuf::from("notices.json"),
            data_dir: PathBuf::from(".boinc"),
            icon_dir: None,
            notifications_enabled: true,
            watch: false,
            notification_id: NotificationId::default(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

pub fn build_tracker(config: &AppConfig, surface: Box<dyn NotificationSurface>) -> NoticeTracker {
    let store = FileWatermarkStore::new(config.watermark_path());
    let mut builder =
        NoticeTracker::builder(Box::new(store), surface).notification_id(config.notification_id);
    if let Some(dir) = &config.icon_dir {
        builder = builder.with_icon_provider(Box::new(DirectoryIconProvider::new(dir)));
    }
    builder.build()
}

#[derive(Debug, PartialEq, Eq)]
enum AppEvent {
    FeedChanged,
    Acknowledge,
    Quit,
}

/// Re-read the feed and hand it to the tracker.
pub fn refresh(tracker: &mut NoticeTracker, config: &AppConfig) -> Result<UpdateOutcome> {
    let notices = load_feed(&config.feed_path)?;
    let outcome = tracker
        .update(&notices, config.notifications_enabled)
        .context("failed to update notice notification")?;
    debug!(?outcome, "notice feed processed");
    Ok(outcome)
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(
        feed = %config.feed_path.display(),
        watermark = %config.watermark_path().display(),
        "starting notice notifier"
    );
    let mut tracker = build_tracker(&config, Box::new(TerminalSurface));
    refresh(&mut tracker, &config)?;
    if !config.watch {
        return Ok(());
    }

    let (tx, rx) = mpsc::channel();
    let _watcher = watch_feed(&config.feed_path, tx.clone())?;
    spawn_command_reader(BufReader::new(io::stdin()), tx);
    event_loop(&mut tracker, &config, rx)
}

fn event_loop(
    tracker: &mut NoticeTracker,
    config: &AppConfig,
    rx: Receiver<AppEvent>,
) -> Result<()> {
    for event in rx {
        match event {
            AppEvent::FeedChanged => {
                if let Err(err) = refresh(tracker, config) {
                    warn!(%err, "unable to refresh notices");
                }
            }
            AppEvent::Acknowledge => {
                if let Err(err) = tracker.cancel() {
                    warn!(%err, "unable to dismiss notice notification");
                }
            }
            AppEvent::Quit => break,
        }
    }
    Ok(())
}

fn watch_feed(feed_path: &Path, tx: Sender<AppEvent>) -> Result<RecommendedWatcher> {
    let file_name = feed_path.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                let touches_feed = event
                    .paths
                    .iter()
                    .any(|path| path.file_name().map(|name| name.to_os_string()) == file_name);
                if touches_feed && !event.kind.is_access() {
                    let _ = tx.send(AppEvent::FeedChanged);
                }
            }
            Err(err) => warn!(%err, "feed watcher error"),
        }
    })?;
    // watch the directory so feeds replaced by rename are still seen
    let dir = match feed_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("unable to watch `{}`", dir.display()))?;
    Ok(watcher)
}

/// Forward `ack`/`quit` commands typed on `input`. Closed input (a detached
/// service with stdin on /dev/null) only ends this thread; the watcher keeps the loop alive.
fn spawn_command_reader<R>(input: R, tx: Sender<AppEvent>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(event) = parse_command(&line) else {
                if !line.trim().is_empty() {
                    warn!(command = %line.trim(), "unknown command, expected ack or quit");
                }
                continue;
            };
            let quit = event == AppEvent::Quit;
            if tx.send(event).is_err() || quit {
                return;
            }
        }
        debug!("command input closed");
    })
}

fn parse_command(line: &str) -> Option<AppEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "ack" | "cancel" => Some(AppEvent::Acknowledge),
        "quit" | "exit" => Some(AppEvent::Quit),
        "refresh" => Some(AppEvent::FeedChanged),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use notice_core::error::SurfaceError;
    use notice_core::notifications::{NotificationPayload, RecordingSurface, SurfaceEvent};
    use notice_core::TrackerState;
    use tempfile::tempdir;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BOINC_NOTICE_FEED", "/tmp/feed.json"),
            ("BOINC_DATA_DIR", "/var/lib/boinc"),
            ("BOINC_NOTICE_NOTIFICATIONS", "off"),
            ("BOINC_NOTIFICATION_ID", "12"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.feed_path, PathBuf::from("/tmp/feed.json"));
        assert_eq!(
            config.watermark_path(),
            PathBuf::from("/var/lib/boinc").join(WATERMARK_FILE)
        );
        assert!(!config.notifications_enabled);
        assert!(!config.watch);
        assert_eq!(config.notification_id, NotificationId(12));
    }

    #[test]
    fn bad_notification_id_is_rejected() {
        let result = AppConfig::from_lookup(|key| {
            (key == "BOINC_NOTIFICATION_ID").then(|| "twelve".to_string())
        });
        assert!(result.is_err());
    }

    struct StuckSurface;

    impl NotificationSurface for StuckSurface {
        fn display(
            &self,
            _id: NotificationId,
            _payload: &NotificationPayload,
        ) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn withdraw(&self, _id: NotificationId) -> Result<(), SurfaceError> {
            Err(SurfaceError("notification service went away".into()))
        }
    }

    fn feed_config(temp: &Path) -> AppConfig {
        let feed = temp.join("notices.json");
        fs::write(
            &feed,
            r#"[{"arrival_time": 5, "project_name": "A", "title": "x"}]"#,
        )
        .unwrap();
        AppConfig {
            feed_path: feed,
            data_dir: temp.join("data"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn closed_command_input_keeps_watching() {
        let temp = tempdir().unwrap();
        let config = feed_config(temp.path());
        let surface = Arc::new(RecordingSurface::new());
        let mut tracker = build_tracker(&config, Box::new(surface.clone()));

        let (tx, rx) = mpsc::channel();
        let watcher_tx = tx.clone();
        spawn_command_reader(io::Cursor::new(Vec::new()), tx)
            .join()
            .unwrap();

        watcher_tx.send(AppEvent::FeedChanged).unwrap();
        drop(watcher_tx);
        event_loop(&mut tracker, &config, rx).unwrap();

        assert_eq!(tracker.state(), TrackerState::Shown);
        assert_eq!(surface.events().len(), 1);
    }

    #[test]
    fn command_reader_forwards_ack_and_stops_at_quit() {
        let (tx, rx) = mpsc::channel();
        let input = io::Cursor::new(b"ack\nbogus\nquit\nack\n".to_vec());
        spawn_command_reader(input, tx).join().unwrap();
        let events: Vec<AppEvent> = rx.iter().collect();
        assert_eq!(events, vec![AppEvent::Acknowledge, AppEvent::Quit]);
    }

    #[test]
    fn failed_dismissal_does_not_end_the_loop() {
        let temp = tempdir().unwrap();
        let config = feed_config(temp.path());
        let mut tracker = build_tracker(&config, Box::new(StuckSurface));

        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::FeedChanged).unwrap();
        tx.send(AppEvent::Acknowledge).unwrap();
        tx.send(AppEvent::Acknowledge).unwrap();
        drop(tx);

        event_loop(&mut tracker, &config, rx).unwrap();
        assert_eq!(tracker.state(), TrackerState::Shown);
        assert_eq!(tracker.notified().len(), 1);
    }

    #[test]
    fn commands_map_to_events() {
        assert_eq!(parse_command(" ACK "), Some(AppEvent::Acknowledge));
        assert_eq!(parse_command("quit"), Some(AppEvent::Quit));
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn event_loop_refreshes_and_acknowledges() {
        let temp = tempdir().unwrap();
        let feed = temp.path().join("notices.json");
        fs::write(
            &feed,
            r#"[{"arrival_time": 5, "project_name": "A", "title": "x"}]"#,
        )
        .unwrap();
        let config = AppConfig {
            feed_path: feed,
            data_dir: temp.path().join("data"),
            ..AppConfig::default()
        };
        let surface = Arc::new(RecordingSurface::new());
        let mut tracker = build_tracker(&config, Box::new(surface.clone()));

        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::FeedChanged).unwrap();
        tx.send(AppEvent::Acknowledge).unwrap();
        tx.send(AppEvent::FeedChanged).unwrap();
        tx.send(AppEvent::Quit).unwrap();
        event_loop(&mut tracker, &config, rx).unwrap();

        assert_eq!(tracker.state(), TrackerState::Hidden);
        let events = surface.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SurfaceEvent::Withdrawn(_)));
        assert!(config.watermark_path().exists());
    }
}
