//! # Dispatcher
//!
//! The plumbing between `AppController::update` and the tokio runtime.
//!
//! ```text
//!   input thread ─┐
//!                 ├─► mpsc ─► next() ─► AppController::update ─► launch()
//!   tokio tasks ──┘                                                  │
//!        ▲                                                           │
//!        └──────────────── Command::execute() ◄──────────────────────┘
//! ```
//!
//! Messages are handed to the controller one at a time. Each background
//! command is spawned as its own task and sends its single result back over
//! the channel; nothing is assumed about the order those results arrive in.
//! Terminal commands (`Quit`, `Suspend`, `ClearScreen`) are returned to the
//! caller, which owns the terminal.

use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::tui::app::AppController;
use crate::tui::command::Command;
use crate::tui::message::Message;

pub struct Dispatcher {
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Sender for producers outside the runtime (the input thread).
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Spawn every background command. Terminal commands are returned in
    /// the order they were produced.
    pub fn launch(&self, commands: Vec<Command>) -> Vec<Command> {
        let mut terminal = Vec::new();
        for command in commands {
            if command.is_terminal() {
                terminal.push(command);
                continue;
            }
            debug!("spawning {command:?}");
            let tx = self.tx.clone();
            tokio::spawn(async move {
                if let Some(msg) = command.execute().await
                    && tx.send(msg).is_err()
                {
                    warn!("dropping command result: dispatcher is gone");
                }
            });
        }
        terminal
    }

    /// Hand one message to the controller and launch what it asks for.
    pub fn dispatch(&self, app: &mut AppController, msg: Message) -> Vec<Command> {
        self.launch(app.update(msg))
    }

    /// Wait for the next message.
    pub async fn next(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// The next message if one is already queued.
    pub fn try_next(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::message::StatusContext;
    use std::time::Duration;

    #[tokio::test]
    async fn terminal_commands_come_back_in_order() {
        let dispatcher = Dispatcher::new();
        let returned = dispatcher.launch(vec![
            Command::ClearScreen,
            Command::SpinnerTick {
                after: Duration::from_millis(1),
            },
            Command::Quit,
        ]);
        assert!(matches!(
            returned.as_slice(),
            [Command::ClearScreen, Command::Quit]
        ));
    }

    #[tokio::test]
    async fn background_results_are_fed_back() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.launch(vec![
            Command::StatusTimeout {
                context: StatusContext::List,
                seq: 1,
                after: Duration::from_millis(1),
            },
            Command::SpinnerTick {
                after: Duration::from_millis(1),
            },
        ]);

        let mut ticks = 0;
        let mut timeouts = 0;
        for _ in 0..2 {
            match dispatcher.next().await {
                Some(Message::SpinnerTick) => ticks += 1,
                Some(Message::StatusTimeout { seq: 1, .. }) => timeouts += 1,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!((ticks, timeouts), (1, 1));
        assert!(dispatcher.try_next().is_none());
    }

    #[tokio::test]
    async fn external_senders_share_the_queue() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .sender()
            .send(Message::Resize {
                width: 10,
                height: 5,
            })
            .unwrap();
        assert!(matches!(
            dispatcher.try_next(),
            Some(Message::Resize {
                width: 10,
                height: 5
            })
        ));
    }
}
