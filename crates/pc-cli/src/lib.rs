//! Punch clock CLI library.
//!
//! This crate provides the CLI interface for the attendance punch clock.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, GeofenceAction, UserAction};
pub use config::Config;
