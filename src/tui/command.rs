//! # Commands
//!
//! Deferred work returned by `AppController::update`. A command runs off the
//! dispatch loop and produces at most one `Message`; it never touches view
//! state. `Quit`, `Suspend` and `ClearScreen` act on the terminal and are
//! interpreted by the dispatcher itself instead of being executed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::core::config::StyleName;
use crate::core::discovery::{self, DiscoveryHandle, DiscoveryRequest};
use crate::core::document::Document;
use crate::core::error::AppError;
use crate::core::filter;
use crate::tui::markdown::Renderer;
use crate::tui::message::{Message, StatusContext};

pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// A full rescan of the listing against a committed filter term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub generation: u64,
    pub term: String,
    /// `(index into the listing, filter value)` for every document known
    /// at commit time.
    pub candidates: Vec<(usize, String)>,
}

pub enum Command {
    Quit,
    Suspend,
    ClearScreen,

    StartDiscovery {
        run: u64,
        request: DiscoveryRequest,
        cancel: CancellationToken,
    },
    /// Pull one entry from a running discovery.
    NextEntry { run: u64, handle: DiscoveryHandle },
    LoadContent { seq: u64, document: Document },
    Render {
        seq: u64,
        body: String,
        style: StyleName,
        renderer: Arc<dyn Renderer>,
    },
    Filter(FilterRequest),
    SpinnerTick { after: Duration },
    StatusTimeout {
        context: StatusContext,
        seq: u64,
        after: Duration,
    },
}

impl Command {
    pub fn spinner_tick() -> Self {
        Command::SpinnerTick {
            after: SPINNER_INTERVAL,
        }
    }

    pub fn status_timeout(context: StatusContext, seq: u64) -> Self {
        Command::StatusTimeout {
            context,
            seq,
            after: STATUS_TIMEOUT,
        }
    }

    /// Whether the dispatcher handles this command itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Command::Quit | Command::Suspend | Command::ClearScreen)
    }

    /// Run the command to completion. Terminal commands yield `None`.
    pub async fn execute(self) -> Option<Message> {
        match self {
            Command::Quit | Command::Suspend | Command::ClearScreen => None,

            Command::StartDiscovery {
                run,
                request,
                cancel,
            } => Some(match discovery::start(&request, cancel) {
                Ok((root, handle)) => Message::DiscoveryStarted { run, root, handle },
                Err(reason) => {
                    warn!("discovery run {run} failed to start: {reason}");
                    Message::Error(AppError::Discovery { run, reason })
                }
            }),

            Command::NextEntry { run, handle } => Some(match handle.next().await {
                Some(entry) => Message::EntryFound { run, entry },
                None => Message::DiscoveryFinished { run },
            }),

            Command::LoadContent { seq, mut document } => {
                if document.is_loaded() {
                    return Some(Message::ContentLoaded { seq, document });
                }
                let Some(path) = document.local_path.clone() else {
                    document.body = Some(String::new());
                    return Some(Message::ContentLoaded { seq, document });
                };
                Some(match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        debug!("read {} bytes from {}", bytes.len(), path.display());
                        document.body = Some(String::from_utf8_lossy(&bytes).into_owned());
                        Message::ContentLoaded { seq, document }
                    }
                    Err(e) => {
                        warn!("failed to read {}: {e}", path.display());
                        Message::Error(AppError::ContentRead {
                            seq,
                            path,
                            message: e.to_string(),
                        })
                    }
                })
            }

            Command::Render {
                seq,
                body,
                style,
                renderer,
            } => {
                let result =
                    tokio::task::spawn_blocking(move || renderer.render(&body, style)).await;
                Some(match result {
                    Ok(Ok(text)) => Message::RenderFinished { seq, text },
                    Ok(Err(e)) => Message::Error(AppError::Render {
                        seq,
                        message: e.to_string(),
                    }),
                    Err(join) => Message::Error(AppError::Render {
                        seq,
                        message: join.to_string(),
                    }),
                })
            }

            Command::Filter(request) => {
                let generation = request.generation;
                let matches = tokio::task::spawn_blocking(move || {
                    filter::rank(&request.term, &request.candidates)
                })
                .await
                .unwrap_or_else(|e| {
                    warn!("filter task failed: {e}");
                    Vec::new()
                });
                Some(Message::FilterFinished {
                    generation,
                    matches,
                })
            }

            Command::SpinnerTick { after } => {
                tokio::time::sleep(after).await;
                Some(Message::SpinnerTick)
            }

            Command::StatusTimeout {
                context,
                seq,
                after,
            } => {
                tokio::time::sleep(after).await;
                Some(Message::StatusTimeout { context, seq })
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Quit => f.write_str("Quit"),
            Command::Suspend => f.write_str("Suspend"),
            Command::ClearScreen => f.write_str("ClearScreen"),
            Command::StartDiscovery { run, request, .. } => f
                .debug_struct("StartDiscovery")
                .field("run", run)
                .field("root", &request.root)
                .field("mode", &request.mode)
                .finish_non_exhaustive(),
            Command::NextEntry { run, .. } => {
                f.debug_struct("NextEntry").field("run", run).finish_non_exhaustive()
            }
            Command::LoadContent { seq, document } => f
                .debug_struct("LoadContent")
                .field("seq", seq)
                .field("note", &document.note)
                .finish(),
            Command::Render { seq, style, .. } => f
                .debug_struct("Render")
                .field("seq", seq)
                .field("style", style)
                .finish_non_exhaustive(),
            Command::Filter(request) => f
                .debug_struct("Filter")
                .field("generation", &request.generation)
                .field("term", &request.term)
                .field("candidates", &request.candidates.len())
                .finish(),
            Command::SpinnerTick { after } => {
                f.debug_struct("SpinnerTick").field("after", after).finish()
            }
            Command::StatusTimeout {
                context,
                seq,
                after,
            } => f
                .debug_struct("StatusTimeout")
                .field("context", context)
                .field("seq", seq)
                .field("after", after)
                .finish(),
        }
    }
}
