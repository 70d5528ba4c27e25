//! ecomweb Core - Shared types library.
//!
//! This crate provides common types used across all ecomweb components:
//! - `storefront` - REST client, cart mirror and command handlers
//! - `cli` - Terminal front end for the storefront
//! - `integration-tests` - Fake backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. It describes
//! the JSON shapes exchanged with the backend so that both the client and the
//! fake backend used in tests agree on the wire format.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, statuses, and wire models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
