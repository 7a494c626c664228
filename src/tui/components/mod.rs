//! # TUI Components
//!
//! The two views the controller switches between. Both are stateful: they
//! own their data, take key presses through `EventHandler`, and emit
//! high-level events for the controller to act on.
//!
//! - `ListView`: the file listing, its filter and busy spinner
//! - `DocumentView`: one rendered document in a scroll view
//!
//! Each component file keeps its state, events, rendering, key handling and
//! tests together.
//!
//! ```text
//! components/
//! ├── mod.rs    (this file)
//! ├── list.rs   (file listing)
//! └── pager.rs  (document view)
//! ```

pub mod list;
pub mod pager;

pub use list::{DiscoveryStatus, FilterState, ListEvent, ListMode, ListView};
pub use pager::{DocumentView, PagerEvent};
