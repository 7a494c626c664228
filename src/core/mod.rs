//! # Core
//!
//! Everything that doesn't touch the terminal: configuration, the document
//! model, discovery, frontmatter and path handling, and the error taxonomy.
//! Rendered output is carried as ratatui `Text` values, but nothing in here
//! draws or reads terminal events.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │          TUI            │
//!                    │  controller, views,     │
//!                    │  dispatcher, renderer   │
//!                    └───────────┬─────────────┘
//!                                │ uses
//!            ┌──────────┬────────┴──┬────────────┬──────────┐
//!            ▼          ▼           ▼            ▼          ▼
//!       ┌────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐
//!       │ config │ │ document │ │discovery│ │ filter  │ │ paths  │
//!       └────────┘ └──────────┘ └─────────┘ └─────────┘ └────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: sparse TOML config and its resolution into `ResolvedConfig`
//! - [`document`]: `Document` stubs and `DiscoveredEntry`
//! - [`discovery`]: the background file scan and its pull handle
//! - [`filter`]: fuzzy ranking of notes
//! - [`frontmatter`]: leading metadata block removal
//! - [`paths`]: path expansion and display helpers
//! - [`error`]: `AppError` and `DiscoveryError`

pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod filter;
pub mod frontmatter;
pub mod paths;
