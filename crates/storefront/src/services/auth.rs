//! Sign-in, registration and sign-out.
//!
//! The backend checks credentials; the client only remembers who signed in.
//! A successful login is written to the [`SessionStore`] and to
//! [`AppState`]; logout clears both.

use ecomweb_core::{LoginRequest, RegisterRequest, User};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, RestClient};
use crate::session::{SessionError, SessionStore};
use crate::state::AppState;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The session record could not be cleared.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The backend call failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Username and password entered on the login form.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from form input.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Fields of the registration form.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
}

impl Registration {
    fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        if self.email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if self.password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        if self.full_name.trim().is_empty() {
            return Err(AuthError::MissingField("full name"));
        }
        Ok(())
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.expose_secret().to_string(),
            full_name: self.full_name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a RestClient,
    sessions: &'a dyn SessionStore,
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        client: &'a RestClient,
        sessions: &'a dyn SessionStore,
        state: &'a AppState,
    ) -> Self {
        Self {
            client,
            sessions,
            state,
        }
    }

    /// Put the persisted user, if any, back into state.
    ///
    /// An unreadable record is treated as signed out and removed.
    pub async fn restore(&self) -> Option<User> {
        let user = match self.sessions.load() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session record");
                if let Err(e) = self.sessions.clear() {
                    warn!(error = %e, "failed to remove session record");
                }
                None
            }
        };

        self.state.set_user(user.clone()).await;
        user
    }

    /// Sign in with `credentials`.
    ///
    /// On success the user is stored in state and persisted. A failed write
    /// of the session record is logged; the user stays signed in for this
    /// run.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank username or password, otherwise
    /// the error of the login request.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let username = credentials.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        if credentials.password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: credentials.password.expose_secret().to_string(),
        };
        let response = self.client.login(&request).await?;
        let user = response.user;

        if let Err(e) = self.sessions.save(&user) {
            warn!(error = %e, "failed to persist session");
        }
        self.state.set_user(Some(user.clone())).await;

        info!(user_id = %user.id, role = %user.role, "signed in");
        Ok(user)
    }

    /// Create a new account. The user still has to sign in afterwards.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank required field, otherwise the
    /// error of the register request.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        registration.validate()?;
        self.client.register(&registration.to_request()).await?;
        info!("account registered");
        Ok(())
    }

    /// Sign out: forget the user and their cart mirror.
    ///
    /// State is cleared even if the session record cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns error if the session record exists but cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.state.set_user(None).await;
        self.sessions.clear()?;
        info!("signed out");
        Ok(())
    }
}
