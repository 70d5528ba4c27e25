//! ecomweb Storefront library.
//!
//! Client side of the ecomweb storefront: a REST client for the backend, a
//! cart mirror kept in step with the server cart, and command handlers a
//! front end drives.
//!
//! # Modules
//!
//! - [`api`] - `reqwest` client for every backend endpoint
//! - [`cart`] - Cart mirror synchronization and derived totals
//! - [`commands`] - One handler per user action, returning display outcomes
//! - [`config`] - Environment configuration
//! - [`error`] - Unified error type, user notices and Sentry helpers
//! - [`services`] - Catalog, auth, checkout and admin logic
//! - [`session`] - Persistence of the signed-in user
//! - [`state`] - Shared application state
//! - [`view`] - Pre-formatted display data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod view;

pub use commands::{Outcome, Page, Storefront};
