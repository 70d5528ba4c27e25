//! Core types for ecomweb.
//!
//! This module provides type-safe wrappers and wire models for the storefront.

pub mod id;
pub mod models;
pub mod price;
pub mod status;

pub use id::*;
pub use models::*;
pub use price::{Price, PriceError};
pub use status::*;
