//! # Examdesk Architecture
//!
//! Examdesk runs timed multiple-choice exams entirely on the local machine.
//! It is a library with a thin CLI on top: everything from `app.rs` inward
//! takes Rust arguments, returns Rust types and never prints.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, renders CmdResult, owns exit codes     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  App facade (app.rs)                                        │
//! │  - Startup: open store → migrate legacy → default settings  │
//! │  - Dispatches to commands                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs) + exam session (exam/)            │
//! │  - Business logic, session state machine, reports           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Data Manager (data.rs)                                     │
//! │  - Never-throw facade: defaults on read, bools on write     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record store (store/)                                      │
//! │  - Versioned partitions, StorageBackend trait               │
//! │  - FsBackend (production), MemBackend (tests, fallback)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence
//!
//! Four partitions (`userSettings`, `examData`, `examResults`, `images`) hold
//! records keyed by a string id. An exam in progress is a single
//! `examData.examState` checkpoint plus `examData.examMeta`, so any command
//! invocation can pick the attempt up where the last one left it.
//!
//! ## Testing
//!
//! Unit tests live next to the code and run against [`store::mem_backend`].
//! `tests/` drives the binary end to end in a temporary data root.
//!
//! ## Module Overview
//!
//! - [`app`]: Startup sequence and facade
//! - [`commands`]: One module per CLI command
//! - [`exam`]: Session state machine, events, reports
//! - [`data`]: The Data Manager
//! - [`store`]: Record store, partitions, backends
//! - [`import`]: Question-set validation and section selection
//! - [`migration`]: One-shot legacy store migration
//! - [`model`]: Partitions, well-known ids, `Question`
//! - [`config`]: `config.json` and data-root resolution
//! - [`logging`]: `tracing` subscriber setup for the binary
//! - [`error`]: Error types

pub mod app;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod exam;
pub mod import;
pub mod logging;
pub mod migration;
pub mod model;
pub mod store;
