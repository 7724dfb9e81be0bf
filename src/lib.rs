//! td - To-Do List Library
//!
//! This library provides the core functionality for the td CLI tool:
//! account and session handling, live-synced task data, and profile
//! management over a pluggable backend.
//!
//! # Core Concepts
//!
//! - **Backend**: the auth + document-store surface, with live snapshot
//!   subscriptions per collection
//! - **Session synchronizer**: tracks the signed-in identity and keeps
//!   uid-scoped task and profile caches current
//! - **Projector**: pure partitioning of a task snapshot into open and
//!   completed lists, with optional priority filtering
//! - **Actions**: validated writes; local validation failures guarantee
//!   no write was issued
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `td.toml`
//! - `error`: Error types and result aliases
//! - `model`: Task and profile data model
//! - `backend`: Backend trait and subscription types
//! - `store`: File-backed reference backend with file locking
//! - `session`: Session and live-data synchronizer
//! - `projector`: Task view projection
//! - `actions`: Validated mutating operations
//! - `events`: JSONL event emission
//! - `output`: Shared CLI output formatting

pub mod actions;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod output;
pub mod projector;
pub mod session;
pub mod store;

pub use error::{Error, Result};
