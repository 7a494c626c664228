//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::text::Text;

use crate::core::config::{ResolvedConfig, StyleName};
use crate::tui::markdown::{self, RenderError, Renderer};

/// Renders every body as plain lines without touching syntect.
pub struct StubRenderer;

impl Renderer for StubRenderer {
    fn render(&self, body: &str, _style: StyleName) -> Result<Text<'static>, RenderError> {
        Ok(markdown::plain(body))
    }
}

/// A renderer that always fails.
pub struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _body: &str, _style: StyleName) -> Result<Text<'static>, RenderError> {
        Err(RenderError("renderer unavailable".into()))
    }
}

/// Default config with a concrete style, so nothing depends on `COLORFGBG`.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// One key press per character.
pub fn type_str(s: &str) -> Vec<KeyEvent> {
    s.chars().map(|c| key(KeyCode::Char(c))).collect()
}

/// The test terminal's buffer as text, one line per row.
pub fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
