//! Catalog, cart and checkout commands.

use std::process::ExitCode;

use ecomweb_core::{CartItemId, ProductId};
use ecomweb_storefront::services::OrderForm;
use ecomweb_storefront::state::Section;
use ecomweb_storefront::{Page, Storefront};

use crate::render;

pub async fn home(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.start().await;
    render::outcome(&outcome, |p| render::products(p))
}

pub async fn products(storefront: &Storefront, category: Option<&str>) -> ExitCode {
    let outcome = storefront.products(category).await;
    render::outcome(&outcome, |p| render::products(p))
}

pub async fn categories(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.categories().await;
    render::outcome(&outcome, |c| render::categories(c))
}

pub async fn search(storefront: &Storefront, keyword: &str) -> ExitCode {
    let outcome = storefront.search(keyword).await;
    render::outcome(&outcome, |p| render::products(p))
}

pub async fn show_cart(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.show_section(Section::Cart).await;
    render::outcome(&outcome, |page| {
        if let Page::Cart(cart) = page {
            render::cart(cart);
        }
    })
}

pub async fn add(storefront: &Storefront, product_id: ProductId, quantity: i32) -> ExitCode {
    let outcome = storefront.add_to_cart(product_id, quantity).await;
    render::outcome(&outcome, render::cart)
}

pub async fn update(storefront: &Storefront, cart_item_id: CartItemId, quantity: i32) -> ExitCode {
    let outcome = storefront.update_quantity(cart_item_id, quantity).await;
    render::outcome(&outcome, render::cart)
}

pub async fn remove(storefront: &Storefront, cart_item_id: CartItemId) -> ExitCode {
    let outcome = storefront.remove_from_cart(cart_item_id).await;
    render::outcome(&outcome, render::cart)
}

/// Open checkout and, if its preconditions hold, place the order.
pub async fn checkout(storefront: &Storefront, form: &OrderForm) -> ExitCode {
    let opened = storefront.begin_checkout().await;
    if !opened.is_ok() {
        return render::outcome(&opened, render::nothing);
    }
    render::outcome(&opened, render::cart);

    let outcome = storefront.place_order(form).await;
    render::outcome(&outcome, render::order_created)
}
