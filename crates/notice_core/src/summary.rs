use crate::error::TrackerError;
use crate::icon::ProjectIconProvider;
use crate::notice::Notice;
use crate::notifications::{LargeIcon, NotificationPayload};
use crate::tracker::TrackerConfig;

/// Project icons are shown at twice their native size.
const PROJECT_ICON_SCALE: u32 = 2;

pub fn summary_title(count: usize, first_project: &str) -> String {
    if count == 1 {
        format!("New notice from {first_project}")
    } else {
        format!("{count} new notices from {first_project} and others")
    }
}

/// Render the notification describing every notice in `notified`, in order.
///
/// A single notice gets its own title as body and the project's icon. Several
/// notices are listed line by line under the first project's name with a
/// numeric badge and the default icon.
pub fn build_summary(
    notified: &[Notice],
    config: &TrackerConfig,
    icons: &dyn ProjectIconProvider,
) -> Result<NotificationPayload, TrackerError> {
    let first = notified.first().ok_or(TrackerError::EmptyNoticeSet)?;
    let count = notified.len();

    let mut payload = NotificationPayload {
        title: summary_title(count, &first.project_name),
        body: None,
        lines: Vec::new(),
        large_icon: LargeIcon::Default,
        small_icon: config.small_icon.clone(),
        badge_count: None,
        sub_text: None,
        channel_id: config.channel_id.clone(),
        auto_cancel: true,
        target: config.target.clone(),
    };

    if count == 1 {
        payload.body = Some(first.title.clone());
        payload.large_icon = resolve_project_icon(icons, &first.project_name);
    } else {
        payload.badge_count = Some(count);
        payload.sub_text = Some(config.app_name.clone());
        payload.lines = notified.iter().map(Notice::summary_line).collect();
    }
    Ok(payload)
}

fn resolve_project_icon(icons: &dyn ProjectIconProvider, project_name: &str) -> LargeIcon {
    match icons.lookup(project_name) {
        Ok(Some(icon)) => LargeIcon::Project(icon.scaled(PROJECT_ICON_SCALE)),
        Ok(None) => LargeIcon::Default,
        Err(err) => {
            tracing::debug!(%err, "falling back to default notice icon");
            LargeIcon::Default
        }
    }
}
