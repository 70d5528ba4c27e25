//! Integration tests for an unreachable backend.
//!
//! Transport failures must surface as the generic network notice and leave
//! all state at its last known-good value.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ecomweb_core::{ProductId, Role, User, UserId};
use ecomweb_storefront::config::StorefrontConfig;
use ecomweb_storefront::error::{NETWORK_ERROR_MESSAGE, NoticeLevel};
use ecomweb_storefront::services::{Credentials, OrderForm};
use ecomweb_storefront::session::MemorySessionStore;
use ecomweb_storefront::state::Section;
use ecomweb_storefront::{Page, Storefront};

/// An API base on a local port nothing listens on.
async fn closed_api_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

async fn offline_storefront(user: Option<User>) -> Storefront {
    let config = StorefrontConfig::for_api_base(&closed_api_base().await).unwrap();
    let sessions = match user {
        Some(user) => MemorySessionStore::with_user(user),
        None => MemorySessionStore::new(),
    };
    Storefront::new(config, Arc::new(sessions)).unwrap()
}

fn shopper() -> User {
    User {
        id: UserId::new(2),
        username: "asha".to_string(),
        email: "asha@example.com".to_string(),
        full_name: "Asha Rao".to_string(),
        address: String::new(),
        phone_number: String::new(),
        role: Role::User,
    }
}

#[tokio::test]
async fn test_catalog_offline() {
    let storefront = offline_storefront(None).await;

    let outcome = storefront.start().await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.notice.unwrap().message, NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_login_offline() {
    let storefront = offline_storefront(None).await;

    let outcome = storefront.login(&Credentials::new("asha", "secret")).await;

    assert_eq!(outcome.notice.unwrap().message, NETWORK_ERROR_MESSAGE);
    assert_eq!(storefront.current_user().await, None);
}

#[tokio::test]
async fn test_restored_session_survives_offline_start() {
    let storefront = offline_storefront(Some(shopper())).await;

    // The user is restored even though their cart cannot be loaded
    let resumed = storefront.resume().await;
    assert_eq!(resumed.value.unwrap().username, "asha");
    assert_eq!(resumed.notice.unwrap().message, NETWORK_ERROR_MESSAGE);
    assert!(storefront.cart().await.is_empty());
    assert_eq!(storefront.cart_sync().snapshot().await.version, 0);
}

#[tokio::test]
async fn test_cart_section_offline_keeps_last_view() {
    let storefront = offline_storefront(Some(shopper())).await;
    storefront.resume().await;

    let outcome = storefront.show_section(Section::Cart).await;

    let notice = outcome.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, NETWORK_ERROR_MESSAGE);
    assert_eq!(outcome.redirect, Some(Section::Cart));
    let Some(Page::Cart(view)) = outcome.value else {
        panic!("expected the cart page");
    };
    assert_eq!(view, storefront.cart().await);
    assert_eq!(storefront.state().section().await, Section::Cart);
}

#[tokio::test]
async fn test_cart_mutation_offline() {
    let storefront = offline_storefront(Some(shopper())).await;
    storefront.resume().await;

    let outcome = storefront.add_to_cart(ProductId::new(3), 1).await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.notice.unwrap().message, NETWORK_ERROR_MESSAGE);
    assert_eq!(outcome.redirect, None);
    assert_eq!(storefront.cart_sync().status().in_flight, 0);
}

#[tokio::test]
async fn test_place_order_offline() {
    let storefront = offline_storefront(Some(shopper())).await;
    storefront.resume().await;

    let form = OrderForm {
        shipping_address: "12 MG Road".to_string(),
        payment_method: String::new(),
    };
    let outcome = storefront.place_order(&form).await;

    assert_eq!(outcome.notice.unwrap().message, NETWORK_ERROR_MESSAGE);
}
