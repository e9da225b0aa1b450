//! tj-core - Core library for the trade journal
//!
//! This crate provides the `journal.yml` configuration model and the error
//! types shared by the storage engine and the CLI.

pub mod config;
pub mod error;

pub use config::{Config, DatabaseConfig, LogLevel};
pub use error::{CoreError, CoreResult};
