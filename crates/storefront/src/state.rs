//! Application state shared by the cart mirror and the command handlers.
//!
//! One explicit state object replaces the page-level globals a browser
//! storefront would keep: the signed-in user, the cart mirror, and the
//! section currently shown. The cart mirror has a single writer, the cart
//! refresh completion, so its setter is crate-private.

use std::sync::Arc;

use ecomweb_core::{CartItem, Price, User, UserId};
use tokio::sync::RwLock;

/// Storefront sections a user can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Home,
    Products,
    Login,
    Register,
    Cart,
    Checkout,
    Admin,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Home => "home",
            Self::Products => "products",
            Self::Login => "login",
            Self::Register => "register",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// The local copy of the server cart.
///
/// `items` is always exactly the last successful server listing. `total` is
/// the server-computed grand total fetched alongside it, `None` when that
/// fetch failed. `version` counts how many refreshes have been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Option<Price>,
    pub version: u64,
}

/// Application state shared across the storefront.
///
/// This struct is cheaply cloneable via `Arc`; clones observe the same state.
#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<RwLock<AppStateInner>>,
}

#[derive(Default)]
struct AppStateInner {
    user: Option<User>,
    cart: CartSnapshot,
    section: Section,
}

impl AppState {
    /// Create empty state: nobody signed in, empty cart, home section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    /// Set or clear the signed-in user.
    ///
    /// Switching to a different user (or to nobody) drops the cart mirror,
    /// since it belonged to the previous account.
    pub async fn set_user(&self, user: Option<User>) {
        let mut inner = self.inner.write().await;
        let same_user = match (&inner.user, &user) {
            (Some(old), Some(new)) => old.id == new.id,
            _ => false,
        };
        if !same_user {
            inner.cart = CartSnapshot {
                version: inner.cart.version,
                ..CartSnapshot::default()
            };
        }
        inner.user = user;
    }

    /// A copy of the current cart mirror.
    pub async fn cart(&self) -> CartSnapshot {
        self.inner.read().await.cart.clone()
    }

    /// A copy of the mirrored cart lines.
    pub async fn cart_items(&self) -> Vec<CartItem> {
        self.inner.read().await.cart.items.clone()
    }

    /// The section currently shown.
    pub async fn section(&self) -> Section {
        self.inner.read().await.section
    }

    /// Record navigation to `section`.
    pub async fn set_section(&self, section: Section) {
        self.inner.write().await.section = section;
    }

    /// Replace the cart mirror wholesale. Only the cart refresh calls this.
    ///
    /// The listing is applied only if `owner` is still the signed-in user;
    /// a refresh that completes after logout or an account switch is
    /// discarded and `None` is returned. Otherwise returns the new version.
    pub(crate) async fn replace_cart(
        &self,
        owner: UserId,
        items: Vec<CartItem>,
        total: Option<Price>,
    ) -> Option<u64> {
        let mut inner = self.inner.write().await;
        if inner.user.as_ref().map(|u| u.id) != Some(owner) {
            return None;
        }

        let version = inner.cart.version + 1;
        inner.cart = CartSnapshot {
            items,
            total,
            version,
        };
        Some(version)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecomweb_core::{CartItemId, Product, ProductId, Role};

    use super::*;

    fn user(id: i64) -> User {
        User {
            id: UserId::new(id),
            username: format!("user{id}"),
            email: String::new(),
            full_name: String::new(),
            address: String::new(),
            phone_number: String::new(),
            role: Role::User,
        }
    }

    fn item() -> CartItem {
        CartItem {
            id: CartItemId::new(1),
            quantity: 2,
            product: Product {
                id: ProductId::new(42),
                name: "Kettle".to_string(),
                description: None,
                price: "10".parse().unwrap(),
                stock_quantity: 5,
                category: None,
                brand: None,
                image_url: None,
                has_image: false,
            },
        }
    }

    #[tokio::test]
    async fn test_replace_cart_bumps_version() {
        let state = AppState::new();
        state.set_user(Some(user(1))).await;
        assert_eq!(state.cart().await.version, 0);

        let v1 = state.replace_cart(UserId::new(1), vec![item()], None).await;
        let v2 = state
            .replace_cart(UserId::new(1), Vec::new(), Some(Price::ZERO))
            .await;
        assert_eq!((v1, v2), (Some(1), Some(2)));
        assert!(state.cart_items().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_cart_for_other_user_is_discarded() {
        let state = AppState::new();
        state.set_user(Some(user(1))).await;

        let applied = state.replace_cart(UserId::new(2), vec![item()], None).await;
        assert!(applied.is_none());
        assert!(state.cart_items().await.is_empty());

        state.set_user(None).await;
        let applied = state.replace_cart(UserId::new(1), vec![item()], None).await;
        assert!(applied.is_none());
    }

    #[tokio::test]
    async fn test_switching_user_drops_cart() {
        let state = AppState::new();
        state.set_user(Some(user(1))).await;
        state.replace_cart(UserId::new(1), vec![item()], None).await;

        // Same account again keeps the mirror
        state.set_user(Some(user(1))).await;
        assert_eq!(state.cart_items().await.len(), 1);

        state.set_user(Some(user(2))).await;
        assert!(state.cart_items().await.is_empty());

        state.replace_cart(UserId::new(2), vec![item()], None).await;
        state.set_user(None).await;
        assert!(state.cart_items().await.is_empty());
        assert!(state.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = AppState::new();
        let clone = state.clone();
        clone.set_section(Section::Cart).await;
        assert_eq!(state.section().await, Section::Cart);
    }
}
