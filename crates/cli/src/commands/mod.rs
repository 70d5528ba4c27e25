//! Subcommand implementations.
//!
//! Each function drives one [`Storefront`](ecomweb_storefront::Storefront)
//! command, renders the outcome and returns the process exit code.

pub mod account;
pub mod admin;
pub mod shop;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the CLI itself, before any storefront command runs.
#[derive(Debug, Error)]
pub enum CliError {
    /// Storefront could not be set up.
    #[error(transparent)]
    Setup(#[from] ecomweb_storefront::error::ClientError),

    /// An input file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
