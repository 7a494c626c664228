//! # Discovery Pipeline
//!
//! Streams candidate files under a root directory, one at a time.
//!
//! ```text
//!  blocking thread                          dispatch loop
//! ┌──────────────────┐   mpsc(1)   ┌─────────────────────────────┐
//! │ ignore::Walk     │────────────►│ DiscoveryHandle::next()     │
//! │  check cancel    │             │  → EntryFound / Finished    │
//! │  blocking_send   │             └─────────────────────────────┘
//! └──────────────────┘
//! ```
//!
//! The channel holds a single entry, so the walker never gets more than one
//! entry ahead of the consumer. The consumer pulls once per delivered entry.
//! Cancelling the token (reload, teardown) stops the walker before its next
//! emission, and dropping every handle unblocks a walker waiting to send.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use log::{debug, info, warn};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::core::document::DiscoveredEntry;
use crate::core::error::DiscoveryError;
use crate::core::paths::glob_extensions;

/// Whether the walk honours ignore files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Skip hidden files and anything matched by `.gitignore` / `.ignore`.
    RespectIgnores,
    /// Every matching file, hidden and ignored ones included.
    AllFiles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    /// Directory to search. Empty means the current working directory.
    pub root: PathBuf,
    /// Extensions as configured (`md`, `.md`); normalised to globs here.
    pub extensions: Vec<String>,
    pub mode: WalkMode,
    /// Extra glob patterns to exclude (only in `RespectIgnores` mode).
    pub ignore_patterns: Vec<String>,
}

/// Resolve the search root: empty → current directory, otherwise an absolute
/// path that must name a directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf, DiscoveryError> {
    if root.as_os_str().is_empty() {
        return std::env::current_dir().map_err(|e| DiscoveryError::from_io(Path::new("."), &e));
    }
    let meta = std::fs::metadata(root).map_err(|e| DiscoveryError::from_io(root, &e))?;
    if !meta.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }
    std::path::absolute(root).map_err(|e| DiscoveryError::from_io(root, &e))
}

/// Start a discovery run. Must be called from within a tokio runtime.
///
/// Returns the resolved root and a handle for pulling entries. If the scan
/// can't start, no walker is spawned and no entries are ever produced.
pub fn start(
    request: &DiscoveryRequest,
    cancel: CancellationToken,
) -> Result<(PathBuf, DiscoveryHandle), DiscoveryError> {
    let root = resolve_root(&request.root)?;
    debug!("local directory is {}", root.display());

    let overrides = build_overrides(&root, request)?;
    let extensions = build_extension_matcher(&request.extensions)?;
    let mode = request.mode;

    let (tx, rx) = mpsc::channel(1);
    let producer_cancel = cancel.clone();
    let walk_root = root.clone();
    tokio::task::spawn_blocking(move || {
        let builder = walker(&walk_root, overrides, mode);
        produce(&builder, &extensions, &walk_root, tx, producer_cancel)
    });

    info!("discovery started in {} ({:?})", root.display(), request.mode);
    let handle = DiscoveryHandle {
        inner: Arc::new(Mutex::new(HandleInner { rx, finished: false })),
        cancel,
    };
    Ok((root, handle))
}

/// The walker for `root`. Ignore files and the hidden-file rule apply only
/// in `RespectIgnores` mode.
fn walker(root: &Path, overrides: Override, mode: WalkMode) -> WalkBuilder {
    let respect = mode == WalkMode::RespectIgnores;
    let mut builder = WalkBuilder::new(root);
    builder
        .overrides(overrides)
        .follow_links(false)
        .require_git(false)
        .hidden(respect)
        .ignore(respect)
        .git_ignore(respect)
        .git_global(respect)
        .git_exclude(respect)
        .parents(respect);
    builder
}

/// Configured exclusions as ignore-only overrides. No whitelist globs go in
/// here: a whitelist match would win over `.gitignore` and hidden rules.
fn build_overrides(root: &Path, request: &DiscoveryRequest) -> Result<Override, DiscoveryError> {
    if request.mode == WalkMode::AllFiles || request.ignore_patterns.is_empty() {
        return Ok(Override::empty());
    }
    let bad = |e: ignore::Error| DiscoveryError::BadPattern(e.to_string());
    let mut builder = OverrideBuilder::new(root);
    builder.case_insensitive(true).map_err(bad)?;
    for pattern in &request.ignore_patterns {
        builder.add(&format!("!{pattern}")).map_err(bad)?;
    }
    builder.build().map_err(bad)
}

/// Case-insensitive matcher over file names for the configured extensions.
fn build_extension_matcher(extensions: &[String]) -> Result<GlobSet, DiscoveryError> {
    let bad = |e: globset::Error| DiscoveryError::BadPattern(e.to_string());
    let mut set = GlobSetBuilder::new();
    for glob in glob_extensions(extensions) {
        set.add(
            GlobBuilder::new(&glob)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(bad)?,
        );
    }
    set.build().map_err(bad)
}

fn produce(
    builder: &WalkBuilder,
    extensions: &GlobSet,
    root: &Path,
    tx: mpsc::Sender<DiscoveredEntry>,
    cancel: CancellationToken,
) {
    let mut sent = 0usize;
    for result in builder.build() {
        if cancel.is_cancelled() {
            debug!("discovery in {} cancelled after {sent} entries", root.display());
            return;
        }
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable path during discovery: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file())
            || !extensions.is_match(entry.file_name())
        {
            continue;
        }
        let mod_time = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let found = DiscoveredEntry {
            path: entry.into_path(),
            mod_time,
        };
        if tx.blocking_send(found).is_err() {
            debug!("discovery consumer went away after {sent} entries");
            return;
        }
        sent += 1;
    }
    debug!("discovery in {} exhausted with {sent} entries", root.display());
}

/// Single-consumer handle to a running discovery. Clones share the same
/// underlying channel; pulls are serialised.
#[derive(Clone)]
pub struct DiscoveryHandle {
    inner: Arc<Mutex<HandleInner>>,
    cancel: CancellationToken,
}

struct HandleInner {
    rx: mpsc::Receiver<DiscoveredEntry>,
    finished: bool,
}

impl DiscoveryHandle {
    /// Next entry, or `None` once discovery is finished. After the first
    /// `None`, every later call returns `None` immediately.
    pub async fn next(&self) -> Option<DiscoveredEntry> {
        let mut inner = self.inner.lock().await;
        if inner.finished {
            return None;
        }
        let next = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            entry = inner.rx.recv() => entry,
        };
        if next.is_none() {
            inner.finished = true;
            inner.rx.close();
        }
        next
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for DiscoveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryHandle")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};

    fn request(root: &Path, mode: WalkMode) -> DiscoveryRequest {
        DiscoveryRequest {
            root: root.to_path_buf(),
            extensions: vec!["md".into(), ".markdown".into()],
            mode,
            ignore_patterns: vec![],
        }
    }

    async fn collect(handle: &DiscoveryHandle) -> Vec<PathBuf> {
        let mut out = Vec::new();
        while let Some(entry) = handle.next().await {
            out.push(entry.path);
        }
        out.sort();
        out
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "# a").unwrap();
        fs::write(root.join("B.MD"), "# b").unwrap();
        fs::write(root.join("notes.markdown"), "# n").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join("build")).unwrap();
        fs::write(root.join("build").join("out.md"), "# generated").unwrap();
        fs::write(root.join(".hidden.md"), "# hidden").unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn respects_ignore_rules_and_extensions() {
        let dir = fixture();
        let root = dir.path().canonicalize().unwrap();
        let (resolved, handle) =
            start(&request(&root, WalkMode::RespectIgnores), CancellationToken::new()).unwrap();
        assert_eq!(resolved, root);

        let found = collect(&handle).await;
        assert_eq!(names(&found, &root), vec!["B.MD", "a.md", "notes.markdown"]);
    }

    #[tokio::test]
    async fn ignore_files_win_over_extension_matches() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join(".gitignore"), "draft.md\n").unwrap();
        fs::write(root.join(".ignore"), "private.md\n").unwrap();
        for name in ["draft.md", "private.md", "keep.md"] {
            fs::write(root.join(name), "# x").unwrap();
        }

        let (_, handle) =
            start(&request(&root, WalkMode::RespectIgnores), CancellationToken::new()).unwrap();
        assert_eq!(names(&collect(&handle).await, &root), vec!["keep.md"]);
    }

    #[tokio::test]
    async fn all_files_mode_bypasses_ignore_rules() {
        let dir = fixture();
        let root = dir.path().canonicalize().unwrap();
        let (_, handle) =
            start(&request(&root, WalkMode::AllFiles), CancellationToken::new()).unwrap();

        let found = names(&collect(&handle).await, &root);
        assert!(found.contains(&".hidden.md".to_string()));
        assert!(found.iter().any(|n| n.ends_with("out.md")));
        assert!(!found.iter().any(|n| n.ends_with("main.rs")));
    }

    #[tokio::test]
    async fn configured_ignore_patterns_are_excluded() {
        let dir = fixture();
        let root = dir.path().canonicalize().unwrap();
        let mut req = request(&root, WalkMode::RespectIgnores);
        req.ignore_patterns = vec!["notes.*".into()];
        let (_, handle) = start(&req, CancellationToken::new()).unwrap();

        assert_eq!(names(&collect(&handle).await, &root), vec!["B.MD", "a.md"]);
    }

    #[tokio::test]
    async fn finished_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (_, handle) = start(
            &request(dir.path(), WalkMode::RespectIgnores),
            CancellationToken::new(),
        )
        .unwrap();

        assert!(handle.next().await.is_none());
        assert!(handle.next().await.is_none());
    }

    #[tokio::test]
    async fn missing_root_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");
        let err = start(
            &request(&missing, WalkMode::RespectIgnores),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(err, DiscoveryError::NotFound(missing));
    }

    #[tokio::test]
    async fn file_root_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "x").unwrap();
        let err = start(
            &request(&file, WalkMode::RespectIgnores),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(err, DiscoveryError::NotADirectory(file));
    }

    #[tokio::test]
    async fn cancelled_handle_reports_finished() {
        let dir = fixture();
        let cancel = CancellationToken::new();
        let (_, handle) = start(&request(dir.path(), WalkMode::RespectIgnores), cancel.clone())
            .unwrap();

        handle.cancel();
        assert!(cancel.is_cancelled());
        assert!(handle.next().await.is_none());
        assert!(handle.next().await.is_none());
    }

    #[tokio::test]
    async fn bad_ignore_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), WalkMode::RespectIgnores);
        req.ignore_patterns = vec!["a{b".into()];
        let err = start(&req, CancellationToken::new()).unwrap_err();
        assert!(matches!(err, DiscoveryError::BadPattern(_)));
    }

    // ── Producer ────────────────────────────────────────────────────────

    fn many_notes(n: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..n {
            fs::write(dir.path().join(format!("note{i:02}.md")), "# n").unwrap();
        }
        dir
    }

    fn wait_until(mut ready: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !ready() {
            assert!(Instant::now() < deadline, "timed out waiting on the walker");
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Run the walker on a plain thread so the test controls every pull.
    fn spawn_walker(
        root: &Path,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<DiscoveredEntry>, thread::JoinHandle<()>) {
        let req = request(root, WalkMode::RespectIgnores);
        let overrides = build_overrides(root, &req).unwrap();
        let extensions = build_extension_matcher(&req.extensions).unwrap();
        let root = root.to_path_buf();
        let (tx, rx) = mpsc::channel(1);
        let walker_thread = thread::spawn(move || {
            let builder = walker(&root, overrides, WalkMode::RespectIgnores);
            produce(&builder, &extensions, &root, tx, cancel);
        });
        (rx, walker_thread)
    }

    #[test]
    fn walker_stays_one_entry_ahead() {
        let dir = many_notes(20);
        let (mut rx, walker_thread) = spawn_walker(dir.path(), CancellationToken::new());

        wait_until(|| rx.len() == 1);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(rx.len(), 1);
        assert!(!walker_thread.is_finished());

        // Each pull lets exactly one more entry through.
        assert!(rx.try_recv().is_ok());
        wait_until(|| rx.len() == 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.len(), 1);
        assert!(!walker_thread.is_finished());

        drop(rx);
        walker_thread.join().unwrap();
    }

    #[test]
    fn cancelled_walker_stops_at_next_emission() {
        let dir = many_notes(20);
        let cancel = CancellationToken::new();
        let (mut rx, walker_thread) = spawn_walker(dir.path(), cancel.clone());
        wait_until(|| rx.len() == 1);

        cancel.cancel();
        let mut received = 0;
        while rx.blocking_recv().is_some() {
            received += 1;
        }
        walker_thread.join().unwrap();
        // The buffered entry plus at most the one already blocked in send.
        assert!(received <= 2, "walker kept going after cancel: {received}");
    }

    #[test]
    fn walker_exits_when_consumer_is_dropped() {
        let dir = many_notes(20);
        let (rx, walker_thread) = spawn_walker(dir.path(), CancellationToken::new());
        wait_until(|| rx.len() == 1);

        drop(rx);
        walker_thread.join().unwrap();
    }

    #[test]
    fn extension_matching_ignores_case_and_directories() {
        let set = build_extension_matcher(&["md".into(), ".markdown".into()]).unwrap();
        assert!(set.is_match("README.MD"));
        assert!(set.is_match("notes.markdown"));
        assert!(!set.is_match("main.rs"));
        assert!(!set.is_match("md"));
    }
}
