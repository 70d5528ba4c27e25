//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - [`RestClient`] wraps `reqwest` and implements every endpoint the
//!   storefront consumes, all relative to one configured base URL
//! - The backend is the source of truth - NO local caching, every call is a
//!   round trip
//! - Cart endpoints are also exposed through the [`CartApi`] trait so the
//!   cart mirror can be driven by an in-memory fake in tests
//!
//! # Errors
//!
//! Non-2xx responses become [`ApiError::Rejected`] carrying the backend's
//! `{"error": "..."}` message when present. Anything that prevents a usable
//! response (connection failure, timeout, undecodable body) is
//! [`ApiError::Network`].

mod client;

use std::future::Future;

pub use client::{ImageUpload, ProductUpload, RestClient};

use ecomweb_core::{AddToCartRequest, CartItem, CartItemId, CartTotal, UserId};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never completed or the response could not be decoded.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// A request URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The backend-supplied message of a rejection, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of a rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for `ApiError`.
pub type ApiResult<T> = Result<T, ApiError>;

/// The cart endpoints the cart mirror depends on.
pub trait CartApi: Send + Sync {
    /// `GET /cart/user/{userId}` - the full cart of a user.
    fn list_cart(&self, user_id: UserId) -> impl Future<Output = ApiResult<Vec<CartItem>>> + Send;

    /// `GET /cart/total/{userId}` - the server-computed grand total.
    fn cart_total(&self, user_id: UserId) -> impl Future<Output = ApiResult<CartTotal>> + Send;

    /// `POST /cart/add`.
    fn add_to_cart(&self, request: AddToCartRequest)
    -> impl Future<Output = ApiResult<()>> + Send;

    /// `PUT /cart/update/{cartItemId}`.
    fn update_cart_item(
        &self,
        cart_item_id: CartItemId,
        quantity: i32,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// `DELETE /cart/remove/{cartItemId}`.
    fn remove_cart_item(&self, cart_item_id: CartItemId)
    -> impl Future<Output = ApiResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_with_message() {
        let err = ApiError::Rejected {
            status: 400,
            message: Some("Insufficient stock".to_string()),
        };
        assert_eq!(err.to_string(), "API error: 400 - Insufficient stock");
        assert_eq!(err.server_message(), Some("Insufficient stock"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_rejected_display_without_message() {
        let err = ApiError::Rejected {
            status: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 404 - (no message)");
        assert_eq!(err.server_message(), None);
    }
}
