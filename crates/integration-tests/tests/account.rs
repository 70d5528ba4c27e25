//! Integration tests for sign-in, registration and session persistence.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ecomweb_integration_tests::{FakeBackend, SHOPPER};
use ecomweb_storefront::services::{Credentials, Registration};
use ecomweb_storefront::session::{FileSessionStore, SessionStore};
use ecomweb_storefront::state::Section;

fn registration(username: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "hunter22".to_string().into(),
        full_name: "Meera Iyer".to_string(),
        address: "4 Park Street, Kolkata".to_string(),
        phone_number: "9811111111".to_string(),
    }
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let outcome = storefront.login(&Credentials::new(SHOPPER.0, SHOPPER.1)).await;

    assert_eq!(outcome.notice.clone().unwrap().message, "Login successful!");
    assert_eq!(outcome.redirect, Some(Section::Home));
    let user = outcome.value.unwrap();
    assert_eq!(user.username, SHOPPER.0);
    assert!(!user.is_admin());
    assert_eq!(storefront.current_user().await, Some(user));
    assert_eq!(storefront.state().section().await, Section::Home);
}

#[tokio::test]
async fn test_login_wrong_password_shows_server_message() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let outcome = storefront.login(&Credentials::new(SHOPPER.0, "nope")).await;

    assert!(!outcome.is_ok());
    assert_eq!(
        outcome.notice.unwrap().message,
        "Invalid username or password"
    );
    assert_eq!(storefront.current_user().await, None);
}

#[tokio::test]
async fn test_login_blank_password_is_not_sent() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let before = backend.requests();
    let outcome = storefront.login(&Credentials::new(SHOPPER.0, "")).await;

    assert_eq!(outcome.notice.unwrap().message, "Please enter your password");
    assert_eq!(backend.requests(), before);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let outcome = storefront.register(&registration("meera")).await;
    assert_eq!(
        outcome.notice.unwrap().message,
        "Registration successful! Please login."
    );
    assert_eq!(outcome.redirect, Some(Section::Login));
    // Registering does not sign in
    assert_eq!(storefront.current_user().await, None);

    let outcome = storefront
        .login(&Credentials::new("meera", "hunter22"))
        .await;
    let user = outcome.value.unwrap();
    assert_eq!(user.full_name, "Meera Iyer");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let outcome = storefront.register(&registration(SHOPPER.0)).await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.notice.unwrap().message, "Username already exists");
    assert_eq!(outcome.redirect, None);
}

// =============================================================================
// Session persistence
// =============================================================================

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = backend.storefront_with(Arc::new(FileSessionStore::new(&path)));
    first
        .login(&Credentials::new(SHOPPER.0, SHOPPER.1))
        .await;
    let kettle = backend.product_named("Copper Kettle").unwrap().id;
    first.add_to_cart(kettle, 2).await;
    drop(first);

    // A new process: same file, fresh state
    let second = backend.storefront_with(Arc::new(FileSessionStore::new(&path)));
    let user = second.resume().await.value.unwrap();

    assert_eq!(user.username, SHOPPER.0);
    assert_eq!(second.cart().await.item_count, 2);
}

#[tokio::test]
async fn test_logout_removes_session_file() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(FileSessionStore::new(&path));

    let storefront = backend.storefront_with(store.clone());
    storefront
        .login(&Credentials::new(SHOPPER.0, SHOPPER.1))
        .await;
    assert!(path.exists());

    let outcome = storefront.logout().await;

    assert_eq!(outcome.notice.unwrap().message, "Logged out successfully!");
    assert!(!path.exists());
    assert!(store.load().unwrap().is_none());
    assert_eq!(storefront.current_user().await, None);
}

#[tokio::test]
async fn test_corrupt_session_starts_signed_out() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let storefront = backend.storefront_with(Arc::new(FileSessionStore::new(&path)));
    let outcome = storefront.start().await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.value.unwrap().len(), 3);
    assert_eq!(storefront.current_user().await, None);
    assert!(!path.exists());
}
