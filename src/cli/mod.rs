//! CLI module for chainrunner
//!
//! Handles command-line argument parsing and configuration management.

pub mod config;
pub mod args;

pub use config::{Config, LoggingConfig};
pub use args::{Args, Commands, Verbosity};
