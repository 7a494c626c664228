//! # ListView Component
//!
//! The file listing. Holds every discovered `Document` stub in discovery
//! order, the filter, the selection, and the busy spinner shown while a
//! discovery run is still producing.
//!
//! ```text
//! glance ⠹ 12 documents
//! Filter: notes▏
//!
//! │ notes/today.md
//! │ 3 minutes ago
//!   README.md
//!   2 days ago
//!
//! ↑/k up · ↓/j down · / filter · enter open · r reload · q quit
//! ```
//!
//! Filtering has three states. While `Filtering`, keys edit the filter text
//! and the visible set is left alone. Committing runs one full rescan in the
//! background (`ListEvent::RunFilter`); entries discovered while a filter is
//! applied are matched against the committed term as they arrive.

use std::sync::Arc;

use chrono::Local;
use crossterm::event::KeyEvent;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::core::config::ResolvedConfig;
use crate::core::document::Document;
use crate::core::filter;
use crate::tui::command::FilterRequest;
use crate::tui::component::{Component, EventHandler};
use crate::tui::keymap::key_name;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Header, filter line, spacer, footer.
const CHROME_HEIGHT: u16 = 4;
/// Each row is the note and its modification time.
const ITEM_HEIGHT: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Browsing,
    Filtering,
    FilterApplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    /// No run has been started (file or content launch).
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Ready,
    /// A document was opened and its body is being read.
    LoadingDocument,
}

/// Events emitted by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// Open the document at this index into `documents()`.
    Open(usize),
    RunFilter(FilterRequest),
}

pub struct ListView {
    config: Arc<ResolvedConfig>,
    documents: Vec<Document>,

    filter_state: FilterState,
    filter_input: String,
    /// Term of the last commit; what arriving entries are matched against.
    applied_term: String,
    /// Ranked indices into `documents` while a filter is applied.
    filtered: Option<Vec<usize>>,
    filter_generation: u64,
    /// Number of documents the pending rescan was given.
    snapshot_len: usize,
    matcher: SkimMatcherV2,

    /// Selection as a position in the visible set.
    cursor: usize,
    list_state: ListState,

    /// A spinner tick is scheduled.
    spinner_active: bool,
    spinner_frame: usize,
    discovery: DiscoveryStatus,

    notice: Option<String>,
    status: Option<String>,
    status_seq: u64,
    mode: ListMode,

    height: u16,
}

impl ListView {
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self {
            config,
            documents: Vec::new(),
            filter_state: FilterState::Browsing,
            filter_input: String::new(),
            applied_term: String::new(),
            filtered: None,
            filter_generation: 0,
            snapshot_len: 0,
            matcher: SkimMatcherV2::default(),
            cursor: 0,
            list_state: ListState::default(),
            spinner_active: false,
            spinner_frame: 0,
            discovery: DiscoveryStatus::Idle,
            notice: None,
            status: None,
            status_seq: 0,
            mode: ListMode::Ready,
            height: 0,
        }
    }

    /// Forget every entry and the filter. Used by reload.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.filter_state = FilterState::Browsing;
        self.filter_input.clear();
        self.applied_term.clear();
        self.filtered = None;
        // Bump so a rescan still in flight is dropped.
        self.filter_generation += 1;
        self.snapshot_len = 0;
        self.cursor = 0;
        self.list_state.select(None);
        self.discovery = DiscoveryStatus::Idle;
        self.notice = None;
        self.mode = ListMode::Ready;
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter_state
    }

    pub fn filter_input(&self) -> &str {
        &self.filter_input
    }

    pub fn is_filtering(&self) -> bool {
        self.filter_state == FilterState::Filtering
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn is_loading_document(&self) -> bool {
        self.mode == ListMode::LoadingDocument
    }

    pub fn discovery(&self) -> DiscoveryStatus {
        self.discovery
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn spinner_active(&self) -> bool {
        self.spinner_active
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of entries currently shown.
    pub fn visible_len(&self) -> usize {
        match &self.filtered {
            Some(f) => f.len(),
            None => self.documents.len(),
        }
    }

    /// Document index of the `pos`-th visible entry.
    pub fn visible_at(&self, pos: usize) -> Option<usize> {
        match &self.filtered {
            Some(f) => f.get(pos).copied(),
            None => (pos < self.documents.len()).then_some(pos),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.visible_at(self.cursor)
    }

    /// Entries that fit on one page, or unbounded before the first resize.
    pub fn per_page(&self) -> usize {
        if self.height == 0 {
            return usize::MAX;
        }
        (self.height.saturating_sub(CHROME_HEIGHT) / ITEM_HEIGHT).max(1) as usize
    }

    // ── Discovery ───────────────────────────────────────────────────────

    pub fn set_discovery(&mut self, status: DiscoveryStatus) {
        self.discovery = status;
    }

    /// Append a discovered document. With a filter applied, the new entry is
    /// matched against the committed term on its own.
    pub fn add_document(&mut self, mut document: Document) {
        let index = self.documents.len();
        if self.filter_state == FilterState::FilterApplied {
            let value = document.build_filter_value().to_string();
            if let Some(filtered) = self.filtered.as_mut()
                && filter::score(&self.matcher, &self.applied_term, &value).is_some()
            {
                filtered.push(index);
            }
        }
        self.documents.push(document);
        self.clamp_cursor();
    }

    /// A non-fatal problem, shown in place of results.
    pub fn show_notice(&mut self, notice: String) {
        self.notice = Some(notice);
        self.discovery = DiscoveryStatus::Finished;
    }

    // ── Spinner ─────────────────────────────────────────────────────────

    /// Discovery is producing and the page isn't full yet.
    pub fn should_animate(&self) -> bool {
        self.discovery == DiscoveryStatus::Running && self.visible_len() < self.per_page()
    }

    /// Mark the spinner running. Returns true if a tick needs scheduling,
    /// i.e. it wasn't already running.
    pub fn start_spinner(&mut self) -> bool {
        if self.spinner_active {
            return false;
        }
        self.spinner_active = true;
        true
    }

    /// Advance one frame. Returns true if another tick should be scheduled.
    pub fn tick(&mut self, list_is_active: bool) -> bool {
        if !self.spinner_active {
            return false;
        }
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        self.spinner_active = list_is_active && self.should_animate();
        self.spinner_active
    }

    // ── Status / loading ────────────────────────────────────────────────

    pub fn set_status(&mut self, status: String) -> u64 {
        self.status = Some(status);
        self.status_seq += 1;
        self.status_seq
    }

    pub fn clear_status(&mut self, seq: u64) {
        if seq == self.status_seq {
            self.status = None;
        }
    }

    pub fn set_mode(&mut self, mode: ListMode) {
        self.mode = mode;
    }

    pub fn set_size(&mut self, height: u16) {
        self.height = height;
    }

    // ── Filtering ───────────────────────────────────────────────────────

    fn begin_filtering(&mut self) {
        self.filter_state = FilterState::Filtering;
    }

    fn clear_filter(&mut self) {
        self.filter_state = FilterState::Browsing;
        self.filter_input.clear();
        self.applied_term.clear();
        self.filtered = None;
        self.filter_generation += 1;
        self.clamp_cursor();
    }

    /// Commit the filter text. Empty text returns to browsing; otherwise a
    /// full rescan request over every known document is returned.
    fn commit_filter(&mut self) -> Option<FilterRequest> {
        let term = self.filter_input.trim().to_string();
        if term.is_empty() {
            self.clear_filter();
            return None;
        }
        self.filter_generation += 1;
        self.filter_state = FilterState::FilterApplied;
        self.applied_term = term.clone();
        self.snapshot_len = self.documents.len();
        self.filtered = Some(Vec::new());
        self.cursor = 0;

        let candidates = self
            .documents
            .iter_mut()
            .enumerate()
            .map(|(i, doc)| (i, doc.build_filter_value().to_string()))
            .collect();
        Some(FilterRequest {
            generation: self.filter_generation,
            term,
            candidates,
        })
    }

    /// Install rescan results. Returns false if they were stale.
    pub fn apply_filter_results(&mut self, generation: u64, matches: Vec<usize>) -> bool {
        if generation != self.filter_generation || self.filter_state == FilterState::Browsing {
            return false;
        }
        let mut filtered = matches;
        // Entries that arrived after the rescan was issued weren't in it.
        for index in self.snapshot_len..self.documents.len() {
            let value = self.documents[index].build_filter_value().to_string();
            if filter::score(&self.matcher, &self.applied_term, &value).is_some() {
                filtered.push(index);
            }
        }
        self.snapshot_len = self.documents.len();
        self.filtered = Some(filtered);
        self.clamp_cursor();
        true
    }

    // ── Selection ───────────────────────────────────────────────────────

    fn clamp_cursor(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            self.cursor = self.cursor.min(len - 1);
            self.list_state.select(Some(self.cursor));
        }
    }

    fn move_up(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
        self.clamp_cursor();
    }

    fn move_down(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_add(n);
        self.clamp_cursor();
    }

    fn page(&self) -> usize {
        self.per_page().min(self.visible_len().max(1))
    }
}

impl EventHandler for ListView {
    type Event = ListEvent;

    fn handle_event(&mut self, key: &KeyEvent) -> Option<ListEvent> {
        if self.mode == ListMode::LoadingDocument {
            return None;
        }
        let name = key_name(key);

        if self.filter_state == FilterState::Filtering {
            match name.as_str() {
                "enter" | "tab" => return self.commit_filter().map(ListEvent::RunFilter),
                "esc" => self.clear_filter(),
                "backspace" => {
                    self.filter_input.pop();
                }
                "space" => self.filter_input.push(' '),
                _ => {
                    if let crossterm::event::KeyCode::Char(c) = key.code
                        && !name.starts_with("ctrl+")
                        && !name.starts_with("alt+")
                    {
                        self.filter_input.push(c);
                    }
                }
            }
            return None;
        }

        match name.as_str() {
            "up" | "k" => self.move_up(1),
            "down" | "j" => self.move_down(1),
            "home" | "g" => self.move_up(usize::MAX),
            "end" | "G" => self.move_down(usize::MAX),
            "pgup" | "b" => self.move_up(self.page()),
            "pgdown" | "f" => self.move_down(self.page()),
            "/" => self.begin_filtering(),
            "esc" if self.filter_state == FilterState::FilterApplied => self.clear_filter(),
            "enter" => return self.selected_index().map(ListEvent::Open),
            _ => {}
        }
        None
    }
}

impl Component for ListView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};
        let [header_area, filter_area, _, list_area, footer_area] =
            Layout::vertical([Length(1), Length(1), Length(1), Min(0), Length(1)]).areas(area);
        self.height = area.height;

        frame.render_widget(Paragraph::new(self.header_line()), header_area);
        frame.render_widget(Paragraph::new(self.filter_line()), filter_area);

        if let Some(notice) = &self.notice {
            let para = Paragraph::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(notice.clone(), Style::default().fg(Color::Red)),
            ]));
            frame.render_widget(para, list_area);
        } else if self.visible_len() == 0 {
            let text = match (self.discovery, self.filter_state) {
                (DiscoveryStatus::Running, _) => "  Looking for documents...",
                (_, FilterState::FilterApplied) => "  Nothing matched.",
                _ => "  No documents found.",
            };
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
                list_area,
            );
        } else {
            let text_width = list_area.width.saturating_sub(2) as usize;
            let now = Local::now();
            let items: Vec<ListItem> = (0..self.visible_len())
                .filter_map(|pos| self.visible_at(pos).map(|i| (pos, i)))
                .map(|(pos, index)| {
                    let doc = &self.documents[index];
                    let selected = pos == self.cursor;
                    let (marker, note_style, time_style) = if selected {
                        (
                            Span::styled("│ ", Style::default().fg(Color::Magenta)),
                            Style::default()
                                .fg(Color::Magenta)
                                .add_modifier(Modifier::BOLD),
                            Style::default().fg(Color::Magenta).add_modifier(Modifier::DIM),
                        )
                    } else {
                        (
                            Span::raw("  "),
                            Style::default().fg(Color::Gray),
                            Style::default().fg(Color::DarkGray),
                        )
                    };
                    ListItem::new(vec![
                        Line::from(vec![
                            marker.clone(),
                            Span::styled(truncate_to_width(&doc.note, text_width), note_style),
                        ]),
                        Line::from(vec![
                            marker,
                            Span::styled(
                                truncate_to_width(&doc.relative_time(now), text_width),
                                time_style,
                            ),
                        ]),
                    ])
                })
                .collect();
            frame.render_stateful_widget(List::new(items), list_area, &mut self.list_state);
        }

        frame.render_widget(
            Paragraph::new(self.footer_line()).style(Style::default().fg(Color::DarkGray)),
            footer_area,
        );
    }
}

impl ListView {
    fn header_line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            " glance ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )];
        if self.spinner_active && self.discovery == DiscoveryStatus::Running {
            let frame = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            spans.push(Span::styled(
                format!(" {frame}"),
                Style::default().fg(Color::Magenta),
            ));
        }
        let count = match self.filtered {
            Some(_) => format!(" {} of {} documents", self.visible_len(), self.len()),
            None if self.len() == 1 => " 1 document".to_string(),
            None => format!(" {} documents", self.len()),
        };
        spans.push(Span::styled(count, Style::default().fg(Color::DarkGray)));
        if self.config.show_all_files {
            spans.push(Span::styled(" (all files)", Style::default().fg(Color::DarkGray)));
        }
        if self.mode == ListMode::LoadingDocument {
            spans.push(Span::styled(" · loading…", Style::default().fg(Color::DarkGray)));
        }
        if let Some(status) = &self.status {
            spans.push(Span::styled(
                format!(" · {status}"),
                Style::default().fg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }

    fn filter_line(&self) -> Line<'static> {
        match self.filter_state {
            FilterState::Browsing => Line::default(),
            FilterState::Filtering => Line::from(vec![
                Span::styled(" Filter: ", Style::default().fg(Color::Magenta)),
                Span::raw(self.filter_input.clone()),
                Span::styled("▏", Style::default().fg(Color::Magenta)),
            ]),
            FilterState::FilterApplied => Line::from(vec![
                Span::styled(" Filter: ", Style::default().fg(Color::DarkGray)),
                Span::styled(self.applied_term.clone(), Style::default().fg(Color::Gray)),
            ]),
        }
    }

    fn footer_line(&self) -> &'static str {
        match self.filter_state {
            FilterState::Filtering => " enter apply · esc clear",
            FilterState::FilterApplied => {
                " ↑/k up · ↓/j down · / edit filter · esc clear filter · enter open · q quit"
            }
            FilterState::Browsing => {
                " ↑/k up · ↓/j down · / filter · enter open · r reload · q quit"
            }
        }
    }
}

/// Cut `s` to at most `max` display columns, ending in "…" when shortened.
fn truncate_to_width(s: &str, max: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
