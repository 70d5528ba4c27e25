//! Integration tests for browsing the catalog.

#![allow(clippy::unwrap_used)]

use ecomweb_integration_tests::FakeBackend;

#[tokio::test]
async fn test_categories_span_whole_catalog() {
    let backend = FakeBackend::start().await;
    backend.add_product("Clay Lamp", "49.00", 4, "Decor");
    let storefront = backend.storefront();

    let outcome = storefront.categories().await;

    assert_eq!(outcome.value.unwrap(), vec!["Decor", "Garden", "Kitchen"]);
    assert_eq!(outcome.notice, None);
}

#[tokio::test]
async fn test_category_filter_is_case_insensitive() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let kitchen = storefront.products(Some("kitchen")).await.value.unwrap();
    assert_eq!(kitchen.len(), 2);
    assert!(kitchen.iter().all(|p| p.category == "Kitchen"));

    let all = storefront.products(Some("All")).await.value.unwrap();
    assert_eq!(all.len(), 3);
}
