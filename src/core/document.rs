//! # Documents
//!
//! A `Document` starts life as a stub (a path and a display note) and is
//! filled in place as its body and rendered lines arrive. Whichever view holds
//! it owns it; the file listing keeps stubs, the document view holds at most
//! one loaded document.
//!
//! ```text
//! DiscoveredEntry ──from_entry()──► Document { body: None, rendered: None }
//!                                        │ load command
//!                                        ▼
//!                                   Document { body: Some, rendered: None }
//!                                        │ render command
//!                                        ▼
//!                                   Document { body: Some, rendered: Some }
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use ratatui::text::Text;

use crate::core::paths::{relative_note, strip_absolute_path};

/// One file found by a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    pub path: PathBuf,
    pub mod_time: SystemTime,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Source file, if the document came from disk.
    pub local_path: Option<PathBuf>,
    /// Raw body, read lazily and at most once per load.
    pub body: Option<String>,
    /// Path relative to the working directory, used for display and filtering.
    pub note: String,
    pub mod_time: Option<DateTime<Local>>,
    /// Cached output of the renderer.
    pub rendered: Option<Text<'static>>,
    filter_value: Option<String>,
}

impl Document {
    /// Stub for a walker result. `root` must be the root the walker was
    /// started from, so the note is a plain prefix strip.
    pub fn from_entry(entry: &DiscoveredEntry, root: &Path) -> Self {
        Self {
            local_path: Some(entry.path.clone()),
            note: relative_note(&entry.path, root),
            mod_time: Some(DateTime::<Local>::from(entry.mod_time)),
            ..Default::default()
        }
    }

    pub fn from_path(path: &Path, cwd: &Path, mod_time: Option<SystemTime>) -> Self {
        Self {
            local_path: Some(path.to_path_buf()),
            note: strip_absolute_path(path, cwd),
            mod_time: mod_time.map(DateTime::<Local>::from),
            ..Default::default()
        }
    }

    /// A bare stub known only by its display note.
    pub fn with_note(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            ..Default::default()
        }
    }

    /// A document whose body was handed to us directly (e.g. piped on stdin).
    pub fn from_content(body: String) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.body.is_some()
    }

    /// Lower-cased note used as the fuzzy-match key. Computed once.
    pub fn build_filter_value(&mut self) -> &str {
        self.filter_value
            .get_or_insert_with(|| self.note.to_lowercase())
            .as_str()
    }

    pub fn filter_value(&self) -> Option<&str> {
        self.filter_value.as_deref()
    }

    /// Human-friendly age, e.g. "3 minutes ago". Older than a week shows a date.
    pub fn relative_time(&self, now: DateTime<Local>) -> String {
        let Some(t) = self.mod_time else {
            return String::new();
        };
        let age = now.signed_duration_since(t);
        let plural = |n: i64, unit: &str| {
            if n == 1 {
                format!("1 {unit} ago")
            } else {
                format!("{n} {unit}s ago")
            }
        };
        if age.num_seconds() < 60 {
            "just now".to_string()
        } else if age.num_minutes() < 60 {
            plural(age.num_minutes(), "minute")
        } else if age.num_hours() < 24 {
            plural(age.num_hours(), "hour")
        } else if age.num_days() < 7 {
            plural(age.num_days(), "day")
        } else {
            t.format("%d %b %Y").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn doc_modified(t: DateTime<Local>) -> Document {
        Document {
            mod_time: Some(t),
            ..Default::default()
        }
    }

    #[test]
    fn stub_from_entry_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "x").unwrap();
        let entry = DiscoveredEntry {
            path: path.clone(),
            mod_time: SystemTime::now(),
        };

        let doc = Document::from_entry(&entry, dir.path());
        assert_eq!(doc.note, "a.md");
        assert_eq!(doc.local_path.as_deref(), Some(path.as_path()));
        assert!(!doc.is_loaded());
        assert!(doc.rendered.is_none());
        assert!(doc.mod_time.is_some());
    }

    #[test]
    fn entry_notes_need_no_filesystem() {
        let root = Path::new("/srv/notes");
        let entry = DiscoveredEntry {
            path: root.join("2024").join("plan.md"),
            mod_time: SystemTime::UNIX_EPOCH,
        };
        let doc = Document::from_entry(&entry, root);
        assert_eq!(PathBuf::from(&doc.note), PathBuf::from("2024").join("plan.md"));
    }

    #[test]
    fn filter_value_is_lowercased_note() {
        let mut doc = Document {
            note: "Notes/Today.MD".into(),
            ..Default::default()
        };
        assert!(doc.filter_value().is_none());
        assert_eq!(doc.build_filter_value(), "notes/today.md");
        assert_eq!(doc.filter_value(), Some("notes/today.md"));
    }

    #[test]
    fn relative_time_buckets() {
        let now = Local.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(doc_modified(now).relative_time(now), "just now");
        assert_eq!(
            doc_modified(now - Duration::minutes(1)).relative_time(now),
            "1 minute ago"
        );
        assert_eq!(
            doc_modified(now - Duration::hours(5)).relative_time(now),
            "5 hours ago"
        );
        assert_eq!(
            doc_modified(now - Duration::days(2)).relative_time(now),
            "2 days ago"
        );
        assert_eq!(
            doc_modified(now - Duration::days(30)).relative_time(now),
            "09 Feb 2024"
        );
    }

    #[test]
    fn note_stubs_start_unloaded_and_unfiltered() {
        let mut doc = Document::with_note("Inbox.md");
        assert!(!doc.is_loaded());
        assert!(doc.local_path.is_none());
        assert!(doc.filter_value().is_none());
        assert_eq!(doc.build_filter_value(), "inbox.md");
    }

    #[test]
    fn content_documents_have_no_path() {
        let doc = Document::from_content("# hi".into());
        assert!(doc.is_loaded());
        assert!(doc.local_path.is_none());
        assert!(doc.note.is_empty());
    }
}
