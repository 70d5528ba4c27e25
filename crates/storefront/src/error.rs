//! Unified error handling with Sentry integration.
//!
//! Every layer has its own error enum. [`ClientError`] unifies them for the
//! command handlers, which turn each failure into a user-facing [`Notice`]
//! (and sometimes a redirect). Unexpected failures are captured to Sentry
//! before the notice is produced; rejections and precondition failures are
//! ordinary outcomes and are not reported.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::SyncError;
use crate::config::ConfigError;
use crate::services::{AdminError, AuthError, CheckoutError};
use crate::session::SessionError;
use crate::state::Section;

/// Message shown whenever the backend could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Message shown when a cart change went through but the cart could not be
/// reloaded afterwards.
pub const CART_RELOAD_MESSAGE: &str = "Cart updated; could not reload cart";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        })
    }
}

/// A short message for the user about the result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Client-level error type for the storefront.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend call failed outside any specific service.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Sync(#[from] SyncError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Admin operation failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Session record could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// The underlying backend error, if this failure came from the backend.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e)
            | Self::Sync(SyncError::Api(e))
            | Self::Auth(AuthError::Api(e))
            | Self::Checkout(CheckoutError::Api(e))
            | Self::Admin(AdminError::Api(e)) => Some(e),
            _ => None,
        }
    }

    /// Whether this is an unexpected failure worth reporting.
    ///
    /// Rejections by the backend and failed client-side checks are expected
    /// outcomes; transport failures and local I/O problems are not.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self.api_error() {
            Some(ApiError::Rejected { .. }) => false,
            Some(_) => true,
            None => matches!(
                self,
                Self::Session(_)
                    | Self::Config(_)
                    | Self::Auth(AuthError::Session(_))
                    | Self::Sync(SyncError::ReloadFailed(
                        ApiError::Network(_) | ApiError::InvalidUrl(_)
                    ))
            ),
        }
    }

    /// The user-facing notice for this error.
    ///
    /// `fallback` is shown when the backend rejected the request without a
    /// message. Internal details are never shown.
    #[must_use]
    pub fn notice(&self, fallback: &str) -> Notice {
        if let Self::Sync(SyncError::ReloadFailed(_)) = self {
            return Notice::info(CART_RELOAD_MESSAGE);
        }
        if let Some(api) = self.api_error() {
            return match api {
                ApiError::Rejected { .. } => {
                    Notice::error(api.server_message().unwrap_or(fallback))
                }
                ApiError::Network(_) => Notice::error(NETWORK_ERROR_MESSAGE),
                ApiError::InvalidUrl(_) => Notice::error(fallback),
            };
        }

        let message = match self {
            Self::Sync(SyncError::NotSignedIn) => "Please login to continue".to_string(),
            Self::Checkout(CheckoutError::NotSignedIn) => "Please login to checkout".to_string(),
            Self::Checkout(CheckoutError::EmptyCart) => "Your cart is empty".to_string(),
            Self::Checkout(CheckoutError::MissingAddress) => {
                "Please enter a shipping address".to_string()
            }
            Self::Admin(AdminError::AccessDenied) => "Access denied".to_string(),
            Self::Admin(AdminError::InvalidDraft(e)) => e.to_string(),
            Self::Auth(AuthError::MissingField(field)) => format!("Please enter your {field}"),
            _ => fallback.to_string(),
        };
        Notice::error(message)
    }

    /// Where the user should be sent after this error, if anywhere.
    #[must_use]
    pub const fn redirect(&self) -> Option<Section> {
        match self {
            Self::Sync(SyncError::NotSignedIn) | Self::Checkout(CheckoutError::NotSignedIn) => {
                Some(Section::Login)
            }
            Self::Admin(AdminError::AccessDenied) => Some(Section::Home),
            _ => None,
        }
    }

    /// Capture unexpected failures to Sentry and log them.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::debug!(error = %self, "command rejected");
        }
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
