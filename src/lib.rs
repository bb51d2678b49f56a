//! bigview library - Core functionality for the large-file browser
//!
//! This library exposes the windowed line cache and its viewport controller
//! for use in the binary and in tests.

pub mod browser;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod extent;
pub mod logging;
pub mod session;
pub mod types;
pub mod ui;
pub mod viewport;
