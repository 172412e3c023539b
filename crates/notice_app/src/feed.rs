use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notice_core::Notice;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    List(Vec<Notice>),
    Wrapped { notices: Vec<Notice> },
}

/// Read the client's notice dump: either a bare JSON array or `{"notices": [...]}`.
/// A feed file that does not exist yet is an empty feed.
pub fn load_feed(path: impl AsRef<Path>) -> Result<Vec<Notice>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "notice feed not present yet");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("unable to read notice feed `{}`", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: FeedDocument = serde_json::from_str(&raw)
        .with_context(|| format!("notice feed `{}` is not valid JSON", path.display()))?;
    Ok(match document {
        FeedDocument::List(notices) => notices,
        FeedDocument::Wrapped { notices } => notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accepts_bare_and_wrapped_feeds() {
        let temp = tempdir().unwrap();
        let bare = temp.path().join("bare.json");
        fs::write(
            &bare,
            r#"[{"arrival_time": 5, "project_name": "A", "title": "x"}]"#,
        )
        .unwrap();
        let wrapped = temp.path().join("wrapped.json");
        fs::write(
            &wrapped,
            r#"{"notices": [{"arrival_time": 8.5, "project_name": "B", "title": "y", "seqno": 3}]}"#,
        )
        .unwrap();

        assert_eq!(load_feed(&bare).unwrap()[0].project_name, "A");
        let notices = load_feed(&wrapped).unwrap();
        assert_eq!(notices[0].seqno, 3);
        assert!(load_feed(temp.path().join("missing.json")).unwrap().is_empty());
    }

    #[test]
    fn malformed_feed_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        assert!(load_feed(&path).is_err());
    }
}
