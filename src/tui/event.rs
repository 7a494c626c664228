use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::message::Message;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads terminal events on a dedicated thread and forwards them as
/// messages. Paused while the process is suspended so the shell gets the
/// keyboard.
pub struct InputReader {
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputReader {
    pub fn spawn(tx: UnboundedSender<Message>) -> Self {
        let paused = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let paused = paused.clone();
            let stop = stop.clone();
            thread::spawn(move || read_loop(&tx, &paused, &stop))
        };
        Self {
            paused,
            stop,
            thread: Some(thread),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("input thread panicked");
        }
    }
}

fn read_loop(tx: &UnboundedSender<Message>, paused: &AtomicBool, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        if paused.load(Ordering::SeqCst) {
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        match event::poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("failed to poll terminal events: {e}");
                return;
            }
        }
        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                warn!("failed to read terminal event: {e}");
                return;
            }
        };
        if let Some(msg) = translate(event)
            && tx.send(msg).is_err()
        {
            debug!("input thread exiting: dispatcher is gone");
            return;
        }
    }
}

/// Key presses and resizes become messages; everything else is dropped.
pub fn translate(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            debug!("key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            Some(Message::Key(key))
        }
        Event::Resize(width, height) => Some(Message::Resize { width, height }),
        _ => None,
    }
}
