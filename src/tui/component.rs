use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

/// A reusable UI component.
///
/// Components hold their own state and render to a `Frame` within a given
/// `Rect`. `render` takes `&mut self` so components can cache layout values
/// (page size, content height) and keep scroll state current during the
/// render pass, matching Ratatui's `StatefulWidget` pattern.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that handles key presses.
pub trait EventHandler {
    /// The type of high-level event this component emits.
    type Event;

    /// Handle a key press and optionally return a high-level event.
    fn handle_event(&mut self, key: &KeyEvent) -> Option<Self::Event>;
}
