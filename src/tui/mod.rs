//! # TUI Adapter
//!
//! The ratatui-specific layer. Owns the terminal, runs the dispatch loop,
//! and draws whichever view the controller says is active.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Dispatch Loop
//!
//! ```text
//! loop {
//!     run terminal commands (quit, suspend, clear)
//!     draw
//!     wait for one message, then drain whatever else is queued
//!     update() each message in turn, launching the commands it returns
//! }
//! ```
//!
//! The loop only draws after a batch of messages has been applied, so a
//! burst of discovered entries costs one frame rather than one per entry.
//! Nothing in the loop blocks: every slow operation is a `Command` running
//! on the runtime, and the loop is idle while it waits for the next message.

pub mod app;
pub mod command;
pub mod component;
pub mod components;
pub mod dispatch;
mod event;
pub mod keymap;
pub mod markdown;
pub mod message;
mod ui;

use log::{debug, info, warn};
use std::io::{self, stdout};
use std::sync::Arc;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::core::config::ResolvedConfig;
use crate::tui::app::{AppController, Launch};
use crate::tui::command::Command;
use crate::tui::dispatch::Dispatcher;
use crate::tui::event::InputReader;
use crate::tui::markdown::MarkdownRenderer;
use crate::tui::message::Message;

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        execute!(stdout(), Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show);
    }
}

pub async fn run(config: ResolvedConfig, launch: Launch) -> io::Result<()> {
    let config = Arc::new(config);
    let mut app = AppController::new(config, Arc::new(MarkdownRenderer), launch);
    let mut dispatcher = Dispatcher::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let input = InputReader::spawn(dispatcher.sender());

    // The first size isn't reported as an event.
    let size = terminal.size()?;
    app.update(Message::Resize {
        width: size.width,
        height: size.height,
    });
    let mut pending = dispatcher.launch(app.init());

    let result = loop {
        match apply_terminal_commands(&mut terminal, &input, pending.drain(..)) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        if let Err(e) = terminal.draw(|f| ui::draw_ui(f, &mut app)) {
            break Err(e);
        }

        let Some(first) = dispatcher.next().await else {
            warn!("message channel closed");
            break Ok(());
        };
        pending.extend(dispatcher.dispatch(&mut app, first));
        while let Some(msg) = dispatcher.try_next() {
            pending.extend(dispatcher.dispatch(&mut app, msg));
        }
    };

    info!("shutting down");
    app.shutdown();
    drop(input);
    ratatui::restore();
    result
}

/// Run `Quit`, `Suspend` and `ClearScreen`. Returns true on quit.
fn apply_terminal_commands(
    terminal: &mut DefaultTerminal,
    input: &InputReader,
    commands: impl Iterator<Item = Command>,
) -> io::Result<bool> {
    for command in commands {
        match command {
            Command::Quit => return Ok(true),
            Command::Suspend => suspend(terminal, input)?,
            Command::ClearScreen => terminal.clear()?,
            other => debug!("ignoring non-terminal command {other:?}"),
        }
    }
    Ok(false)
}

/// Hand the terminal back to the shell and stop until resumed.
#[cfg(unix)]
fn suspend(terminal: &mut DefaultTerminal, input: &InputReader) -> io::Result<()> {
    info!("suspending");
    input.pause();
    ratatui::restore();

    // SAFETY: raising a signal on our own process has no memory-safety
    // preconditions. Execution continues here after SIGCONT.
    unsafe {
        libc::raise(libc::SIGTSTP);
    }

    info!("resumed");
    use crossterm::terminal::{EnterAlternateScreen, enable_raw_mode};
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    input.resume();
    terminal.clear()
}

#[cfg(not(unix))]
fn suspend(_terminal: &mut DefaultTerminal, _input: &InputReader) -> io::Result<()> {
    warn!("suspend is not supported on this platform");
    Ok(())
}
