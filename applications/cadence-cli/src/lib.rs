//! Cadence Console Library
//!
//! Drives the playback core from a terminal with a simulated decoder and
//! a JSON queue file.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod observers;
pub mod simulated;
pub mod store;

pub use app::App;
pub use error::{CliError, Result};
