//! # `todo_reminder`
//!
//! A single-user to-do list served as a web page, with a background checker
//! that sends a desktop notification when a task's notify time or deadline
//! passes.

pub mod alerts;
pub mod app;
pub mod checker;
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod paths;
pub mod tasks;
pub mod templates;
pub mod testing;
pub mod traits;
pub mod web;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
