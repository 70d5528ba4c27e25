//! Integration tests for the cart mirror against the fake backend.
//!
//! Every test checks the mirror against the server cart after each command:
//! the mirror must equal the last successful listing, never a locally
//! patched copy.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use ecomweb_core::{CartItemId, ProductId};
use ecomweb_integration_tests::{FakeBackend, SHOPPER};
use ecomweb_storefront::cart::{MutationKind, MutationState};
use ecomweb_storefront::Page;
use ecomweb_storefront::error::{CART_RELOAD_MESSAGE, NoticeLevel};
use ecomweb_storefront::services::Credentials;
use ecomweb_storefront::state::Section;

fn kettle(backend: &FakeBackend) -> ProductId {
    backend.product_named("Copper Kettle").unwrap().id
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_login_loads_server_cart() {
    let backend = FakeBackend::start().await;

    // Fill the server cart from one client, then sign in from another
    let first = backend.signed_in(SHOPPER).await;
    assert!(first.add_to_cart(kettle(&backend), 2).await.is_ok());

    let second = backend.signed_in(SHOPPER).await;
    let snapshot = second.cart_sync().snapshot().await;
    assert_eq!(snapshot.items, backend.cart_of(SHOPPER.0));
    assert_eq!(snapshot.total.unwrap().to_fixed(), "20.00");
}

#[tokio::test]
async fn test_refresh_without_user_sends_nothing() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let before = backend.requests();
    assert!(storefront.cart_sync().refresh().await.is_err());
    let outcome = storefront.add_to_cart(kettle(&backend), 1).await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.redirect, Some(Section::Login));
    assert_eq!(
        outcome.notice.unwrap().message,
        "Please login to add items to cart"
    );
    assert_eq!(backend.requests(), before);
}

#[tokio::test]
async fn test_total_failure_keeps_listing() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    backend.fail_cart_total(true);

    let outcome = storefront.add_to_cart(kettle(&backend), 1).await;
    assert!(outcome.is_ok());

    let snapshot = storefront.cart_sync().snapshot().await;
    assert_eq!(snapshot.items, backend.cart_of(SHOPPER.0));
    assert_eq!(snapshot.total, None);
    assert_eq!(outcome.value.unwrap().total, None);

    backend.fail_cart_total(false);
    storefront.cart_sync().refresh().await.unwrap();
    let snapshot = storefront.cart_sync().snapshot().await;
    assert_eq!(snapshot.total.unwrap().to_fixed(), "10.00");
}

#[tokio::test]
async fn test_entering_cart_section_refreshes() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;

    // Another device changes the cart behind this client's back
    let other = backend.signed_in(SHOPPER).await;
    other.add_to_cart(kettle(&backend), 3).await;
    assert!(storefront.cart_sync().snapshot().await.items.is_empty());

    let outcome = storefront.show_section(Section::Cart).await;
    assert_eq!(outcome.redirect, Some(Section::Cart));
    assert_eq!(storefront.state().section().await, Section::Cart);
    assert_eq!(
        storefront.cart_sync().snapshot().await.items,
        backend.cart_of(SHOPPER.0)
    );
}

#[tokio::test]
async fn test_cart_section_listing_failure_keeps_last_view() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    storefront.add_to_cart(kettle(&backend), 2).await;
    let before = storefront.cart().await;

    let other = backend.signed_in(SHOPPER).await;
    other.add_to_cart(kettle(&backend), 1).await;
    backend.fail_cart_listing(true);

    let outcome = storefront.show_section(Section::Cart).await;

    let notice = outcome.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Cart unavailable");
    assert_eq!(outcome.value, Some(Page::Cart(before)));
    assert_eq!(outcome.redirect, Some(Section::Cart));
}

#[tokio::test]
async fn test_login_with_unloadable_cart() {
    let backend = FakeBackend::start().await;
    backend.fail_cart_listing(true);
    let storefront = backend.storefront();

    let outcome = storefront
        .login(&Credentials::new(SHOPPER.0, SHOPPER.1))
        .await;

    assert!(outcome.is_ok());
    let notice = outcome.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, "Login successful! Cart unavailable");
    assert_eq!(outcome.redirect, Some(Section::Home));
    assert!(storefront.current_user().await.is_some());
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_add_then_update_quantity() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;

    let outcome = storefront.add_to_cart(kettle(&backend), 2).await;
    let notice = outcome.notice.clone().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Product added to cart!");

    let view = outcome.value.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.item_count, 2);

    let line_id = view.items[0].id;
    let view = storefront.update_quantity(line_id, 3).await.value.unwrap();
    assert_eq!(view.item_count, 3);

    let summary = storefront.cart_sync().summary().await;
    assert_eq!(summary.lines[0].line_total.to_fixed(), "30.00");
    let snapshot = storefront.cart_sync().snapshot().await;
    assert_eq!(snapshot.total.unwrap().to_fixed(), "30.00");
    assert_eq!(snapshot.items, backend.cart_of(SHOPPER.0));
}

#[tokio::test]
async fn test_adding_same_product_merges_lines() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;

    storefront.add_to_cart(kettle(&backend), 1).await;
    storefront.add_to_cart(kettle(&backend), 4).await;

    let snapshot = storefront.cart_sync().snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].quantity, 5);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;

    let view = storefront
        .add_to_cart(kettle(&backend), 2)
        .await
        .value
        .unwrap();
    let view = storefront
        .update_quantity(view.items[0].id, 0)
        .await
        .value
        .unwrap();

    assert!(view.is_empty());
    assert!(backend.cart_of(SHOPPER.0).is_empty());
}

#[tokio::test]
async fn test_remove_line() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    let tumbler = backend.product_named("Steel Tumbler").unwrap().id;

    storefront.add_to_cart(kettle(&backend), 1).await;
    let view = storefront.add_to_cart(tumbler, 1).await.value.unwrap();
    assert_eq!(view.items.len(), 2);

    let kettle_line = view
        .items
        .iter()
        .find(|i| i.name == "Copper Kettle")
        .unwrap()
        .id;
    let outcome = storefront.remove_from_cart(kettle_line).await;
    assert_eq!(outcome.notice.unwrap().message, "Item removed from cart");

    let view = outcome.value.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, "Steel Tumbler");
    assert_eq!(
        storefront.cart_sync().snapshot().await.total.unwrap().to_fixed(),
        "250.00"
    );
}

#[tokio::test]
async fn test_rejected_add_leaves_mirror_untouched() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    storefront.add_to_cart(kettle(&backend), 1).await;
    let before = storefront.cart_sync().snapshot().await;

    // Garden Hose is out of stock
    let hose = backend.product_named("Garden Hose").unwrap().id;
    let outcome = storefront.add_to_cart(hose, 1).await;

    assert!(!outcome.is_ok());
    let notice = outcome.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Insufficient stock");
    assert_eq!(storefront.cart_sync().snapshot().await, before);

    let status = storefront.cart_sync().status();
    assert_eq!(status.in_flight, 0);
    assert_eq!(
        status.last_outcome,
        Some((MutationKind::Add, MutationState::Failed))
    );
}

#[tokio::test]
async fn test_accepted_change_with_failed_reload() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    let view = storefront
        .add_to_cart(kettle(&backend), 1)
        .await
        .value
        .unwrap();
    backend.fail_cart_listing(true);

    let outcome = storefront.update_quantity(view.items[0].id, 4).await;

    // The server took the change; the notice must not claim it failed
    let notice = outcome.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, CART_RELOAD_MESSAGE);
    assert_eq!(outcome.value, Some(view));
    assert_eq!(backend.cart_of(SHOPPER.0)[0].quantity, 4);
    assert_eq!(
        storefront.cart_sync().status().last_outcome,
        Some((MutationKind::Update, MutationState::Applied))
    );

    backend.fail_cart_listing(false);
    storefront.show_section(Section::Cart).await;
    assert_eq!(storefront.cart().await.item_count, 4);
}

#[tokio::test]
async fn test_update_of_unknown_line_shows_server_message() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;

    let outcome = storefront.update_quantity(CartItemId::new(9999), 2).await;
    assert_eq!(outcome.notice.unwrap().message, "Cart item not found");
}

#[tokio::test]
async fn test_logout_drops_mirror() {
    let backend = FakeBackend::start().await;
    let storefront = backend.signed_in(SHOPPER).await;
    storefront.add_to_cart(kettle(&backend), 2).await;

    storefront.logout().await;

    assert!(storefront.cart().await.is_empty());
    // The server cart survives for the next sign-in
    assert_eq!(backend.cart_of(SHOPPER.0).len(), 1);
}
