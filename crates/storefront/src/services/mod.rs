//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product listing, search and category filtering
//! - `auth` - Login, registration and logout against the backend
//! - `checkout` - Checkout preconditions and order placement
//! - `admin` - Access-gated dashboard, order and product management
//!
//! Services borrow the shared [`RestClient`](crate::api::RestClient) and
//! [`AppState`](crate::state::AppState); they are cheap to build per call.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod checkout;

pub use admin::{AdminError, AdminService, DraftError, ProductDraft};
pub use auth::{AuthError, AuthService, Credentials, Registration};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutService, OrderForm};
