//! # Messages
//!
//! Everything that can happen to the application becomes a `Message`.
//! Key presses and resizes come from the input thread; the rest are results
//! of background commands. Each message is handled to completion by
//! `AppController::update` before the next one is looked at.
//!
//! Messages produced by discovery, loading, rendering and filtering carry the
//! ticket (`run`, `seq`, `generation`) of the request that produced them, so a
//! result that arrives after its request was superseded can be dropped.

use std::path::PathBuf;

use crossterm::event::KeyEvent;
use ratatui::text::Text;

use crate::core::discovery::DiscoveryHandle;
use crate::core::document::{DiscoveredEntry, Document};
use crate::core::error::AppError;

/// Which view a status message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusContext {
    List,
    Pager,
}

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },

    /// A discovery run is producing; pull entries through `handle`.
    DiscoveryStarted {
        run: u64,
        root: PathBuf,
        handle: DiscoveryHandle,
    },
    EntryFound { run: u64, entry: DiscoveredEntry },
    DiscoveryFinished { run: u64 },

    /// A document's body has been read.
    ContentLoaded { seq: u64, document: Document },
    RenderFinished { seq: u64, text: Text<'static> },
    /// Ranked indices into the list's documents for a committed filter.
    FilterFinished { generation: u64, matches: Vec<usize> },

    SpinnerTick,
    StatusTimeout { context: StatusContext, seq: u64 },

    Error(AppError),
}
