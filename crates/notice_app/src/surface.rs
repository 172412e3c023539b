use std::io::{self, Write};

use notice_core::error::SurfaceError;
use notice_core::notifications::{
    LargeIcon, NotificationId, NotificationPayload, NotificationSurface,
};

/// Prints the notification to stdout in place of a desktop notification daemon.
#[derive(Debug, Default)]
pub struct TerminalSurface;

pub fn render_payload(id: NotificationId, payload: &NotificationPayload) -> String {
    let mut out = format!("[{id}] {}", payload.title);
    if let Some(count) = payload.badge_count {
        out.push_str(&format!(" ({count})"));
    }
    if let Some(sub_text) = &payload.sub_text {
        out.push_str(&format!(" - {sub_text}"));
    }
    out.push('\n');
    if let Some(body) = &payload.body {
        out.push_str(&format!("    {body}\n"));
    }
    for line in &payload.lines {
        out.push_str(&format!("    {line}\n"));
    }
    if let LargeIcon::Project(icon) = &payload.large_icon {
        out.push_str(&format!(
            "    icon: {} ({}x{})\n",
            icon.path.display(),
            icon.width,
            icon.height
        ));
    }
    out
}

impl NotificationSurface for TerminalSurface {
    fn display(
        &self,
        id: NotificationId,
        payload: &NotificationPayload,
    ) -> Result<(), SurfaceError> {
        tracing::debug!(%id, channel = %payload.channel_id, "displaying notice summary");
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(render_payload(id, payload).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|err| SurfaceError(err.to_string()))
    }

    fn withdraw(&self, id: NotificationId) -> Result<(), SurfaceError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "[{id}] dismissed").map_err(|err| SurfaceError(err.to_string()))
    }
}
