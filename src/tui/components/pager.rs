//! # DocumentView Component
//!
//! Shows one document: the rendered lines in a scroll view and a one-line
//! status bar with the note, the scroll position, and transient messages.
//! Until the renderer finishes a placeholder is shown.
//!
//! With the high-performance pager configured the view asks for a full
//! repaint (`PagerEvent::Repaint`) after every scroll.

use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::config::ResolvedConfig;
use crate::core::document::Document;
use crate::tui::component::{Component, EventHandler};
use crate::tui::keymap::key_name;
use crate::tui::markdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerEvent {
    /// The screen should be cleared and redrawn from scratch.
    Repaint,
}

pub struct DocumentView {
    config: Arc<ResolvedConfig>,
    document: Option<Document>,
    error: Option<String>,

    scroll_state: ScrollViewState,
    /// Wrapped height of the rendered text, measured at the last draw.
    content_height: u16,
    viewport_height: u16,

    full_repaint: bool,
    status: Option<String>,
    status_seq: u64,
}

impl DocumentView {
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self {
            config,
            document: None,
            error: None,
            scroll_state: ScrollViewState::default(),
            content_height: 0,
            viewport_height: 0,
            full_repaint: false,
            status: None,
            status_seq: 0,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn full_repaint(&self) -> bool {
        self.full_repaint
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn offset(&self) -> u16 {
        self.scroll_state.offset().y
    }

    pub fn set_size(&mut self, height: u16) {
        // The status bar takes one row.
        self.viewport_height = height.saturating_sub(1);
        self.clamp();
    }

    /// Take ownership of a loaded document.
    pub fn show(&mut self, document: Document) {
        self.document = Some(document);
        self.error = None;
        self.content_height = 0;
        self.scroll_state.set_offset(Position { x: 0, y: 0 });
        self.full_repaint = self.config.high_performance_pager;
    }

    /// Drop the document. Returns true if the terminal needs clearing.
    pub fn unload(&mut self) -> bool {
        let repaint = self.full_repaint;
        self.document = None;
        self.error = None;
        self.status = None;
        self.content_height = 0;
        self.scroll_state.set_offset(Position { x: 0, y: 0 });
        self.full_repaint = false;
        repaint
    }

    /// Cache rendered lines on the document.
    pub fn set_rendered(&mut self, text: Text<'static>) {
        if let Some(doc) = self.document.as_mut() {
            doc.rendered = Some(text);
        }
    }

    /// Rendering failed: show the raw body instead. Returns the status seq
    /// for the timer that clears the message.
    pub fn degrade_to_raw(&mut self) -> u64 {
        if let Some(doc) = self.document.as_mut() {
            let body = doc.body.as_deref().unwrap_or_default();
            doc.rendered = Some(markdown::plain(body));
        }
        self.set_status("rendered as plain text".into())
    }

    /// The body couldn't be read.
    pub fn show_error(&mut self, message: String) {
        self.error = Some(message);
    }

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

    // ── Scrolling ───────────────────────────────────────────────────────

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn clamp(&mut self) {
        let y = self.offset().min(self.max_offset());
        self.scroll_state.set_offset(Position { x: 0, y });
    }

    fn scroll_to(&mut self, y: u16) {
        self.scroll_state.set_offset(Position {
            x: 0,
            y: y.min(self.max_offset()),
        });
    }

    fn scroll_by(&mut self, delta: i32) {
        let y = (self.offset() as i32 + delta).clamp(0, u16::MAX as i32) as u16;
        self.scroll_to(y);
    }

    /// Scroll position as a percentage of the scrollable range.
    pub fn percent(&self) -> u16 {
        let max = self.max_offset();
        if max == 0 {
            return 100;
        }
        (self.offset() as u32 * 100 / max as u32) as u16
    }
}

impl EventHandler for DocumentView {
    type Event = PagerEvent;

    fn handle_event(&mut self, key: &KeyEvent) -> Option<PagerEvent> {
        let page = self.viewport_height.max(1) as i32;
        let half = (page / 2).max(1);
        let before = self.offset();

        match key_name(key).as_str() {
            "up" | "k" => self.scroll_by(-1),
            "down" | "j" => self.scroll_by(1),
            "pgup" | "b" => self.scroll_by(-page),
            "pgdown" | "f" | "space" => self.scroll_by(page),
            "ctrl+u" | "u" => self.scroll_by(-half),
            "ctrl+d" | "d" => self.scroll_by(half),
            "home" | "g" => self.scroll_to(0),
            "end" | "G" => self.scroll_to(u16::MAX),
            _ => return None,
        }

        (self.full_repaint && self.offset() != before).then_some(PagerEvent::Repaint)
    }
}

impl Component for DocumentView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};
        let [body_area, status_area] = Layout::vertical([Min(0), Length(1)]).areas(area);
        self.viewport_height = body_area.height;

        if let Some(error) = &self.error {
            let para = Paragraph::new(vec![
                Line::default(),
                Line::from(Span::styled(
                    format!("  {error}"),
                    Style::default().fg(Color::Red),
                )),
                Line::default(),
                Line::from(Span::styled(
                    "  press esc to return",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .wrap(Wrap { trim: false });
            frame.render_widget(para, body_area);
        } else if let Some(text) = self.document.as_ref().and_then(|d| d.rendered.as_ref()) {
            // Leave a column for the scrollbar.
            let mut width = body_area.width.saturating_sub(1);
            if self.config.width > 0 {
                width = width.min(self.config.width);
            }
            let para = Paragraph::new(text.clone()).wrap(Wrap { trim: false });
            self.content_height = para.line_count(width).min(u16::MAX as usize) as u16;
            self.clamp();

            let mut scroll_view = ScrollView::new(Size::new(width, self.content_height))
                .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
                .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
            scroll_view.render_widget(para, Rect::new(0, 0, width, self.content_height));
            frame.render_stateful_widget(scroll_view, body_area, &mut self.scroll_state);
        } else {
            frame.render_widget(
                Paragraph::new("  Rendering…").style(Style::default().fg(Color::DarkGray)),
                body_area,
            );
        }

        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }
}

impl DocumentView {
    fn status_line(&self) -> Line<'static> {
        let bar = Style::default().fg(Color::Gray).bg(Color::DarkGray);
        let note = self
            .document
            .as_ref()
            .map(|d| d.note.clone())
            .unwrap_or_default();
        let mut spans = vec![
            Span::styled(
                " glance ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {note} "), bar),
            Span::styled(format!(" {:>3}% ", self.percent()), bar.add_modifier(Modifier::BOLD)),
        ];
        if let Some(status) = &self.status {
            spans.push(Span::styled(
                format!(" {status} "),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{buffer_text, ctrl, key, test_config};
    use crossterm::event::KeyCode;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn long_document(lines: usize) -> Document {
        let body: String = (0..lines).map(|i| format!("line {i}\n")).collect();
        let mut doc = Document::with_note("long.md");
        doc.rendered = Some(markdown::plain(&body));
        doc.body = Some(body);
        doc
    }

    fn shown(config: ResolvedConfig, lines: usize) -> (DocumentView, Terminal<TestBackend>) {
        let mut view = DocumentView::new(Arc::new(config));
        view.show(long_document(lines));
        // 10 rows: 9 of content plus the status bar
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        (view, terminal)
    }

    #[test]
    fn test_scrolling_is_clamped() {
        let (mut view, _t) = shown(test_config(), 30);
        view.handle_event(&key(KeyCode::Up));
        assert_eq!(view.offset(), 0);

        view.handle_event(&key(KeyCode::Char('G')));
        assert_eq!(view.offset(), 21);
        view.handle_event(&key(KeyCode::Char('j')));
        assert_eq!(view.offset(), 21);
        assert_eq!(view.percent(), 100);

        view.handle_event(&key(KeyCode::Home));
        assert_eq!(view.offset(), 0);
        assert_eq!(view.percent(), 0);
    }

    #[test]
    fn test_page_and_half_page() {
        let (mut view, _t) = shown(test_config(), 50);
        view.handle_event(&key(KeyCode::Char(' ')));
        assert_eq!(view.offset(), 9);
        view.handle_event(&ctrl('u'));
        assert_eq!(view.offset(), 5);
        view.handle_event(&key(KeyCode::Char('d')));
        assert_eq!(view.offset(), 9);
        view.handle_event(&key(KeyCode::Char('b')));
        assert_eq!(view.offset(), 0);
    }

    #[test]
    fn test_short_document_does_not_scroll() {
        let (mut view, _t) = shown(test_config(), 3);
        view.handle_event(&key(KeyCode::PageDown));
        assert_eq!(view.offset(), 0);
        assert_eq!(view.percent(), 100);
    }

    #[test]
    fn test_full_repaint_requests_repaint_on_scroll() {
        let config = ResolvedConfig {
            high_performance_pager: true,
            ..test_config()
        };
        let (mut view, _t) = shown(config, 30);
        assert!(view.full_repaint());
        assert_eq!(view.handle_event(&key(KeyCode::Down)), Some(PagerEvent::Repaint));
        // Already at the top: nothing moved
        view.handle_event(&key(KeyCode::Home));
        assert_eq!(view.handle_event(&key(KeyCode::Up)), None);

        assert!(view.unload());
        assert!(!view.full_repaint());
        assert!(view.document().is_none());
    }

    #[test]
    fn test_unload_without_full_repaint() {
        let (mut view, _t) = shown(test_config(), 30);
        view.handle_event(&key(KeyCode::Down));
        assert!(!view.unload());
        assert_eq!(view.offset(), 0);
    }

    #[test]
    fn test_placeholder_until_rendered() {
        let mut view = DocumentView::new(Arc::new(test_config()));
        let mut doc = Document::with_note("a.md");
        doc.body = Some("# a".into());
        view.show(doc);
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        assert!(buffer_text(&terminal).contains("Rendering"));

        view.set_rendered(Text::raw("rendered body"));
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        let out = buffer_text(&terminal);
        assert!(out.contains("rendered body"));
        assert!(out.contains("a.md"));
    }

    #[test]
    fn test_degrade_shows_raw_body_with_status() {
        let mut view = DocumentView::new(Arc::new(test_config()));
        view.show(Document::from_content("**raw**".into()));
        let seq = view.degrade_to_raw();
        assert_eq!(view.status(), Some("rendered as plain text"));
        let rendered = view.document().and_then(|d| d.rendered.as_ref()).unwrap();
        assert_eq!(rendered.lines[0].spans[0].content, "**raw**");

        view.clear_status(seq);
        assert_eq!(view.status(), None);
    }

    #[test]
    fn test_error_view() {
        let mut view = DocumentView::new(Arc::new(test_config()));
        view.show(Document::default());
        view.show_error("unable to read a.md: denied".into());
        let mut terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        let out = buffer_text(&terminal);
        assert!(out.contains("unable to read a.md"));
        assert!(out.contains("press esc to return"));
    }
}
