//! # Jotter Architecture
//!
//! Jotter is a **UI-agnostic journaling library**: a tree of notes, each with
//! an append-only version history, plus a debounced autosave path for live
//! editing. The `jotter` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (cli/, wired by main.rs)                               │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) + Autosave (autosave.rs)                      │
//! │  - Resolves id prefixes, persists after mutations           │
//! │  - Collapses keystroke bursts into single commits           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store (store/)                                             │
//! │  - NoteStore aggregate: notes, selection, save status       │
//! │  - Hierarchy view: children, breadcrumbs, cycle checks      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (persist/)                                     │
//! │  - StorageBackend trait: JSON file (prod), memory (tests)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing writes to stdout or stderr and nothing exits
//! the process. Diagnostics go through `tracing`; installing a subscriber is
//! the client's job.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade UI clients talk to
//! - [`autosave`]: Debounced commits of editor content
//! - [`store`]: The note collection and its hierarchy queries
//! - [`model`]: `Note`, `NoteId`, `SaveStatus`, `PathSegment`
//! - [`ledger`]: Per-note version history
//! - [`persist`]: Storage backends and save-status reporting
//! - [`clock`], [`ids`]: Injectable time and identity sources
//! - [`config`]: Configuration loading
//! - [`error`]: Error types

pub mod api;
pub mod autosave;
pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod model;
pub mod persist;
pub mod store;
