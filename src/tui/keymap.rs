//! Global key bindings.
//!
//! Keys are looked up by name ("ctrl+c", "esc", "G") in a declarative table
//! before any view sees them. A key with no global action is handed to the
//! active view.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::ApplicationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Suspend,
    Reload,
    Back,
}

/// When a binding applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// In every state, including while the filter is being edited.
    Always,
    /// Anywhere except while the filter is being edited.
    NotFiltering,
    List,
    Document,
    /// The document view, or the list while a document is loading.
    DocumentOrLoading,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub key: &'static str,
    pub scope: Scope,
    pub action: GlobalAction,
}

const fn bind(key: &'static str, scope: Scope, action: GlobalAction) -> Binding {
    Binding { key, scope, action }
}

pub const GLOBAL_BINDINGS: &[Binding] = &[
    bind("ctrl+c", Scope::Always, GlobalAction::Quit),
    bind("q", Scope::NotFiltering, GlobalAction::Quit),
    bind("ctrl+z", Scope::NotFiltering, GlobalAction::Suspend),
    bind("r", Scope::List, GlobalAction::Reload),
    bind("esc", Scope::DocumentOrLoading, GlobalAction::Back),
    bind("left", Scope::Document, GlobalAction::Back),
    bind("h", Scope::Document, GlobalAction::Back),
    bind("delete", Scope::Document, GlobalAction::Back),
];

/// What the controller knows when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingContext {
    pub state: ApplicationState,
    /// The list's filter input has focus.
    pub filtering: bool,
    /// The list is waiting for a document's body.
    pub loading_document: bool,
}

impl Scope {
    fn applies(self, ctx: &BindingContext) -> bool {
        let list = ctx.state == ApplicationState::ListActive;
        match self {
            Scope::Always => true,
            Scope::NotFiltering => !ctx.filtering,
            Scope::List => list && !ctx.filtering && !ctx.loading_document,
            Scope::Document => ctx.state == ApplicationState::DocumentActive,
            Scope::DocumentOrLoading => {
                ctx.state == ApplicationState::DocumentActive || (list && ctx.loading_document)
            }
        }
    }
}

pub fn lookup(name: &str, ctx: BindingContext) -> Option<GlobalAction> {
    GLOBAL_BINDINGS
        .iter()
        .find(|b| b.key == name && b.scope.applies(&ctx))
        .map(|b| b.action)
}

/// Printable name of a key press. Shifted letters come through as their
/// upper-case character, so "G" and "g" are distinct names.
pub fn key_name(key: &KeyEvent) -> String {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".into(),
        KeyCode::Esc => "esc".into(),
        KeyCode::Tab => "tab".into(),
        KeyCode::BackTab => "shift+tab".into(),
        KeyCode::Backspace => "backspace".into(),
        KeyCode::Delete => "delete".into(),
        KeyCode::Up => "up".into(),
        KeyCode::Down => "down".into(),
        KeyCode::Left => "left".into(),
        KeyCode::Right => "right".into(),
        KeyCode::Home => "home".into(),
        KeyCode::End => "end".into(),
        KeyCode::PageUp => "pgup".into(),
        KeyCode::PageDown => "pgdown".into(),
        KeyCode::F(n) => format!("f{n}"),
        _ => String::new(),
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) && !base.is_empty() {
        format!("ctrl+{base}")
    } else if key.modifiers.contains(KeyModifiers::ALT) && !base.is_empty() {
        format!("alt+{base}")
    } else {
        base
    }
}
