//! Wakamonth CLI library.
//!
//! This crate provides the command-line interface and presentation for
//! monthly hour reports.

mod cli;
pub mod commands;
mod config;
pub mod sheet;
pub mod tree;

pub use cli::{Cli, Commands};
pub use config::{Autolink, Config};
