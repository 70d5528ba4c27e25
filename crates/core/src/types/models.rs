//! Wire models exchanged with the storefront backend.
//!
//! Field names follow the backend's camelCase JSON. Optional profile and
//! catalog fields default when absent so older backends still decode.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, OrderId, ProductId, UserId};
use super::price::Price;
use super::status::{OrderStatus, Role};

// =============================================================================
// Users
// =============================================================================

/// A signed-in account as returned by the login endpoint.
///
/// This is the record the client persists between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Whether the user may open the admin dashboard.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Body of `POST /users/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /users/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product. Server-owned and read-only for shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Set when the backend stores uploaded image bytes for this product.
    #[serde(default)]
    pub has_image: bool,
}

// =============================================================================
// Cart
// =============================================================================

/// One line of a user's cart with its product embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub quantity: i32,
    pub product: Product,
}

impl CartItem {
    /// Unit price times quantity. Display-only; never sent back to the server.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Body of `POST /cart/add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `PUT /cart/update/{cartItemId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Response of `GET /cart/total/{userId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotal {
    pub total: Price,
    #[serde(default)]
    pub item_count: Option<i64>,
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub shipping_address: String,
    pub payment_method: String,
}

/// Response of `POST /orders/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    #[serde(default)]
    pub total_amount: Option<Price>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// The customer embedded in an admin order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

/// An order as listed on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Body of `PUT /orders/admin/status/{orderId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Response of `GET /dashboard/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Price,
    pub pending_orders: i64,
    pub low_stock_products: i64,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
