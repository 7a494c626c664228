//! # App Controller
//!
//! The top-level state machine. It owns both views, decides which one is
//! showing, and turns each incoming `Message` into state changes plus the
//! commands that should run next.
//!
//! ```text
//!                 open / content loaded
//!   ┌────────────┐ ───────────────────────► ┌────────────────┐
//!   │ ListActive │                          │ DocumentActive │
//!   └────────────┘ ◄─────────────────────── └────────────────┘
//!                   esc / left / h / delete
//! ```
//!
//! `update` never blocks and never runs I/O itself. Anything slow (reading a
//! file, rendering, scanning a directory, waiting on a timer) goes back to the
//! dispatcher as a `Command`, and its result comes back as a later message.
//!
//! Background results carry the ticket of the request that produced them:
//! `run` for discovery, `seq` for a document load and its render. A result
//! whose ticket no longer matches is dropped, which is how a reload or a back
//! navigation makes in-flight work irrelevant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::config::ResolvedConfig;
use crate::core::discovery::{DiscoveryHandle, DiscoveryRequest, WalkMode};
use crate::core::document::{DiscoveredEntry, Document};
use crate::core::error::AppError;
use crate::core::frontmatter;
use crate::core::paths::{is_markdown_file, wrap_code_block};
use crate::tui::command::Command;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    DiscoveryStatus, DocumentView, ListEvent, ListMode, ListView, PagerEvent,
};
use crate::tui::keymap::{self, BindingContext, GlobalAction};
use crate::tui::markdown::Renderer;
use crate::tui::message::{Message, StatusContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationState {
    ListActive,
    DocumentActive,
}

/// What the application was started against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// A file or directory. An empty path means the working directory.
    Path(PathBuf),
    /// Literal text, e.g. piped on stdin. Never touches the filesystem.
    Content(String),
}

pub struct AppController {
    config: Arc<ResolvedConfig>,
    renderer: Arc<dyn Renderer>,
    launch: Launch,

    state: ApplicationState,
    fatal: Option<AppError>,

    list: ListView,
    pager: DocumentView,

    /// Directory notes are made relative to. Set from the discovery root.
    cwd: PathBuf,

    discovery_run: u64,
    discovery_cancel: Option<CancellationToken>,
    discovery_handle: Option<DiscoveryHandle>,
    discovery_runs_started: usize,

    /// Ticket of the document currently being loaded or shown.
    load_seq: u64,
}

impl AppController {
    pub fn new(config: Arc<ResolvedConfig>, renderer: Arc<dyn Renderer>, launch: Launch) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            list: ListView::new(config.clone()),
            pager: DocumentView::new(config.clone()),
            config,
            renderer,
            launch,
            state: ApplicationState::ListActive,
            fatal: None,
            cwd,
            discovery_run: 0,
            discovery_cancel: None,
            discovery_handle: None,
            discovery_runs_started: 0,
            load_seq: 0,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn fatal_error(&self) -> Option<&AppError> {
        self.fatal.as_ref()
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView {
        &mut self.list
    }

    pub fn pager(&self) -> &DocumentView {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut DocumentView {
        &mut self.pager
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Number of discovery runs requested since the controller was created.
    pub fn discovery_runs_started(&self) -> usize {
        self.discovery_runs_started
    }

    pub fn discovery_run(&self) -> u64 {
        self.discovery_run
    }

    // ── Initialization ──────────────────────────────────────────────────

    /// Work out the initial state from the launch target and return the
    /// commands that get it going. Reload calls this again.
    pub fn init(&mut self) -> Vec<Command> {
        let path = match &self.launch {
            Launch::Content(body) => {
                info!("showing {} bytes of literal content", body.len());
                self.state = ApplicationState::DocumentActive;
                self.load_seq += 1;
                let document = Document::from_content(body.clone());
                return self.show_document(document);
            }
            Launch::Path(path) => path.clone(),
        };

        let target = if path.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            path.clone()
        };
        let meta = match std::fs::metadata(&target) {
            Ok(meta) => meta,
            Err(e) => {
                error!("unable to stat {}: {e}", target.display());
                self.fatal = Some(AppError::fatal_init(&target, &e));
                return Vec::new();
            }
        };

        if meta.is_dir() {
            self.state = ApplicationState::ListActive;
            let mut cmds = vec![self.start_discovery(path)];
            if self.list.start_spinner() {
                cmds.push(Command::spinner_tick());
            }
            return cmds;
        }

        self.state = ApplicationState::DocumentActive;
        self.load_seq += 1;
        let document = Document::from_path(&target, &self.cwd, meta.modified().ok());
        debug!("launching against file {}", document.note);
        self.pager.show(document.clone());
        vec![Command::LoadContent {
            seq: self.load_seq,
            document,
        }]
    }

    fn start_discovery(&mut self, root: PathBuf) -> Command {
        if let Some(cancel) = self.discovery_cancel.take() {
            cancel.cancel();
        }
        self.discovery_handle = None;
        self.discovery_run += 1;
        self.discovery_runs_started += 1;

        let cancel = CancellationToken::new();
        self.discovery_cancel = Some(cancel.clone());
        self.list.set_discovery(DiscoveryStatus::Running);

        let mode = if self.config.show_all_files {
            WalkMode::AllFiles
        } else {
            WalkMode::RespectIgnores
        };
        Command::StartDiscovery {
            run: self.discovery_run,
            request: DiscoveryRequest {
                root,
                extensions: self.config.extensions.clone(),
                mode,
                ignore_patterns: self.config.ignore_patterns.clone(),
            },
            cancel,
        }
    }

    /// Cancel any discovery still producing. Called on quit.
    pub fn shutdown(&mut self) {
        if let Some(cancel) = self.discovery_cancel.take() {
            debug!("cancelling discovery run {}", self.discovery_run);
            cancel.cancel();
        }
        self.discovery_handle = None;
    }

    // ── Update ──────────────────────────────────────────────────────────

    /// Apply one message. Never blocks.
    pub fn update(&mut self, msg: Message) -> Vec<Command> {
        if self.fatal.is_some() {
            return match msg {
                Message::Key(_) => vec![Command::Quit],
                _ => Vec::new(),
            };
        }

        match msg {
            Message::Key(key) => self.handle_key(&key),

            Message::Resize { width, height } => {
                debug!("resize to {width}x{height}");
                self.list.set_size(height);
                self.pager.set_size(height);
                self.resume_spinner().into_iter().collect()
            }

            Message::DiscoveryStarted { run, root, handle } => {
                if run != self.discovery_run {
                    debug!("dropping superseded discovery run {run}");
                    handle.cancel();
                    return Vec::new();
                }
                self.cwd = root;
                self.discovery_handle = Some(handle.clone());
                vec![Command::NextEntry { run, handle }]
            }

            Message::EntryFound { run, entry } => self.entry_found(run, entry),

            Message::DiscoveryFinished { run } => {
                if run == self.discovery_run {
                    info!("discovery finished with {} documents", self.list.len());
                    self.list.set_discovery(DiscoveryStatus::Finished);
                    self.discovery_handle = None;
                    self.discovery_cancel = None;
                }
                Vec::new()
            }

            Message::ContentLoaded { seq, document } => {
                if seq != self.load_seq || !self.awaiting_content() {
                    debug!("dropping stale content for {}", document.note);
                    return Vec::new();
                }
                self.list.set_mode(ListMode::Ready);
                self.state = ApplicationState::DocumentActive;
                self.show_document(document)
            }

            Message::RenderFinished { seq, text } => {
                if seq == self.load_seq && self.state == ApplicationState::DocumentActive {
                    self.pager.set_rendered(text);
                }
                Vec::new()
            }

            Message::FilterFinished {
                generation,
                matches,
            } => {
                if !self.list.apply_filter_results(generation, matches) {
                    debug!("dropping stale filter results (generation {generation})");
                    return Vec::new();
                }
                self.resume_spinner().into_iter().collect()
            }

            Message::SpinnerTick => {
                let list_active = self.state == ApplicationState::ListActive;
                if self.list.tick(list_active) {
                    vec![Command::spinner_tick()]
                } else {
                    Vec::new()
                }
            }

            Message::StatusTimeout { context, seq } => {
                match context {
                    StatusContext::List => self.list.clear_status(seq),
                    StatusContext::Pager => self.pager.clear_status(seq),
                }
                Vec::new()
            }

            Message::Error(err) => self.handle_error(err),
        }
    }

    fn entry_found(&mut self, run: u64, entry: DiscoveredEntry) -> Vec<Command> {
        if run != self.discovery_run {
            debug!("dropping entry {} from run {run}", entry.path.display());
            return Vec::new();
        }
        let Some(handle) = self.discovery_handle.clone() else {
            return Vec::new();
        };
        self.list.add_document(Document::from_entry(&entry, &self.cwd));
        vec![Command::NextEntry { run, handle }]
    }

    fn handle_error(&mut self, err: AppError) -> Vec<Command> {
        match &err {
            AppError::FatalInit { .. } => {
                error!("{err}");
                self.fatal = Some(err);
                Vec::new()
            }
            AppError::Discovery { run, .. } => {
                if *run == self.discovery_run {
                    warn!("{err}");
                    self.discovery_cancel = None;
                    self.list.show_notice(err.to_string());
                }
                Vec::new()
            }
            AppError::ContentRead { seq, path, .. } => {
                if *seq != self.load_seq || !self.awaiting_content() {
                    return Vec::new();
                }
                warn!("{err}");
                if self.pager.document().is_none() {
                    self.pager.show(Document::from_path(path, &self.cwd, None));
                }
                self.list.set_mode(ListMode::Ready);
                self.state = ApplicationState::DocumentActive;
                self.pager.show_error(err.to_string());
                Vec::new()
            }
            AppError::Render { seq, .. } => {
                if *seq != self.load_seq || self.state != ApplicationState::DocumentActive {
                    return Vec::new();
                }
                warn!("{err}; showing raw body");
                let status_seq = self.pager.degrade_to_raw();
                vec![Command::status_timeout(StatusContext::Pager, status_seq)]
            }
        }
    }

    /// A load for `load_seq` is outstanding and still wanted.
    fn awaiting_content(&self) -> bool {
        match self.state {
            ApplicationState::DocumentActive => self
                .pager
                .document()
                .is_some_and(|d| !d.is_loaded() && self.pager.error().is_none()),
            ApplicationState::ListActive => self.list.is_loading_document(),
        }
    }

    // ── Keys ────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: &crossterm::event::KeyEvent) -> Vec<Command> {
        let name = keymap::key_name(key);
        let ctx = BindingContext {
            state: self.state,
            filtering: self.list.is_filtering(),
            loading_document: self.list.is_loading_document(),
        };

        if let Some(action) = keymap::lookup(&name, ctx) {
            debug!("global binding {name} -> {action:?}");
            return match action {
                GlobalAction::Quit => vec![Command::Quit],
                GlobalAction::Suspend => vec![Command::Suspend],
                GlobalAction::Reload => self.reload(),
                GlobalAction::Back => self.unload_document(),
            };
        }

        match self.state {
            ApplicationState::ListActive => {
                let mut cmds = match self.list.handle_event(key) {
                    Some(ListEvent::Open(index)) => self.open(index),
                    Some(ListEvent::RunFilter(request)) => {
                        debug!(
                            "filtering {} documents for {:?}",
                            request.candidates.len(),
                            request.term
                        );
                        vec![Command::Filter(request)]
                    }
                    None => Vec::new(),
                };
                // Filtering and clearing can shrink the page below full.
                cmds.extend(self.resume_spinner());
                cmds
            }
            ApplicationState::DocumentActive => match self.pager.handle_event(key) {
                Some(PagerEvent::Repaint) => vec![Command::ClearScreen],
                None => Vec::new(),
            },
        }
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Start loading the document at `index` in the listing.
    fn open(&mut self, index: usize) -> Vec<Command> {
        let Some(document) = self.list.document(index).cloned() else {
            return Vec::new();
        };
        info!("opening {}", document.note);
        self.load_seq += 1;
        self.list.set_mode(ListMode::LoadingDocument);
        vec![Command::LoadContent {
            seq: self.load_seq,
            document,
        }]
    }

    /// Hand a loaded document to the pager and request a render unless the
    /// document already carries one.
    fn show_document(&mut self, document: Document) -> Vec<Command> {
        let already_rendered = document.rendered.is_some();
        let body = self.prepare_body(&document);
        self.pager.show(document);
        if already_rendered {
            return Vec::new();
        }
        vec![Command::Render {
            seq: self.load_seq,
            body,
            style: self.config.style,
            renderer: self.renderer.clone(),
        }]
    }

    /// Frontmatter stripped; non-markdown files wrapped as a code block.
    fn prepare_body(&self, document: &Document) -> String {
        let raw = document.body.as_deref().unwrap_or_default();
        let body = frontmatter::strip_str(raw);
        match document.local_path.as_deref() {
            Some(path) if !is_markdown_file(path, &self.config.extensions) => {
                wrap_code_block(body, &extension_of(path))
            }
            _ => body.to_string(),
        }
    }

    /// Back to the listing.
    fn unload_document(&mut self) -> Vec<Command> {
        debug!("unloading document");
        self.state = ApplicationState::ListActive;
        self.list.set_mode(ListMode::Ready);
        // Anything still loading or rendering for the old document is stale.
        self.load_seq += 1;

        let mut cmds = Vec::new();
        if self.pager.unload() {
            cmds.push(Command::ClearScreen);
        }
        cmds.extend(self.resume_spinner());
        cmds
    }

    /// A tick to restart the busy indicator, if the list is showing, wants
    /// it, and no tick chain is already running.
    fn resume_spinner(&mut self) -> Option<Command> {
        let due = self.state == ApplicationState::ListActive && self.list.should_animate();
        (due && self.list.start_spinner()).then(Command::spinner_tick)
    }

    /// Drop every entry and start over as if freshly launched.
    fn reload(&mut self) -> Vec<Command> {
        info!("reloading");
        if let Some(cancel) = self.discovery_cancel.take() {
            cancel.cancel();
        }
        self.discovery_handle = None;
        self.list.reset();
        let mut cmds = self.init();
        if self.state == ApplicationState::ListActive && self.fatal.is_none() {
            let seq = self.list.set_status("reloaded".into());
            cmds.push(Command::status_timeout(StatusContext::List, seq));
        }
        cmds
    }
}

impl Drop for AppController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
