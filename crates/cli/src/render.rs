//! Plain-text rendering of command outcomes.

#![allow(clippy::print_stdout)]

use std::process::ExitCode;

use ecomweb_core::{OrderCreated, User};
use ecomweb_storefront::Outcome;
use ecomweb_storefront::commands::AdminDashboard;
use ecomweb_storefront::error::{Notice, NoticeLevel};
use ecomweb_storefront::view::{CartView, OrderView, ProductView, StatsView};

pub fn notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
        NoticeLevel::Info => "i",
    };
    println!("{marker} {}", notice.message);
}

/// Print the notice and, on success, the value. Failed commands exit 1.
pub fn outcome<T>(outcome: &Outcome<T>, show: impl FnOnce(&T)) -> ExitCode {
    if let Some(n) = &outcome.notice {
        notice(n);
    }

    match &outcome.value {
        Some(value) => {
            show(value);
            ExitCode::SUCCESS
        }
        None => {
            if let Some(section) = outcome.redirect {
                println!("  -> {section}");
            }
            ExitCode::FAILURE
        }
    }
}

pub fn products(products: &[ProductView]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }

    for p in products {
        println!("#{} {}  {}", p.id, p.name, p.price);
        println!("       {} | {} | {}", p.category, p.brand, p.stock);
        println!("       {}", p.description);
    }
}

pub fn categories(categories: &[String]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    println!("Categories: {}", categories.join(", "));
}

pub fn product(product: &ProductView) {
    products(std::slice::from_ref(product));
}

pub fn cart(cart: &CartView) {
    if cart.is_empty() {
        println!("Your cart is empty");
        println!("Browse our products and add items to your cart!");
        return;
    }

    for item in &cart.items {
        println!(
            "[{}] {} x{} @ {} = {}",
            item.id, item.name, item.quantity, item.price, item.line_price
        );
    }
    println!("Items: {}", cart.item_count);
    match &cart.total {
        Some(total) => println!("Total: {total}"),
        None => println!("Total: unavailable"),
    }
}

pub fn user(user: &User) {
    println!("{} (#{}, {})", user.username, user.id, user.role);
    if !user.full_name.is_empty() {
        println!("{} <{}>", user.full_name, user.email);
    }
}

pub fn order_created(created: &OrderCreated) {
    if let Some(total) = created.total_amount {
        println!("Total: {total}");
    }
}

pub fn stats(stats: &StatsView) {
    for (label, value) in &stats.cards {
        println!("{label:<16} {value}");
    }
}

pub fn dashboard(dashboard: &AdminDashboard) {
    stats(&dashboard.stats);
    println!();
    products(&dashboard.products);
}

pub fn orders(orders: &[OrderView]) {
    if orders.is_empty() {
        println!("No orders found.");
        return;
    }

    for order in orders {
        println!("Order #{} - {} - {}", order.id, order.status_label, order.total);
        println!("  Customer: {}", order.customer);
        println!("  Date: {}", order.date);
        println!("  Shipping: {}", order.shipping_address);
    }
}

pub const fn nothing<T>(_: &T) {}
