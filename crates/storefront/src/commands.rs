//! Command handlers: one method per user action.
//!
//! [`Storefront`] is the seam between a front end (the CLI, a TUI, tests)
//! and the storefront logic. Every command returns an [`Outcome`] carrying
//! the data to show, an optional [`Notice`], and an optional section to
//! navigate to. Failures never escape as `Err`: they become error notices,
//! and the state stays at its last known-good value.

use std::sync::Arc;

use ecomweb_core::{CartItemId, OrderCreated, OrderId, OrderStatus, ProductId, User};
use tracing::{info, instrument};

use crate::api::RestClient;
use crate::cart::{CartSync, SyncError, SyncResult};
use crate::config::StorefrontConfig;
use crate::error::{ClientError, Notice, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::services::catalog::{categories, filter_by_category};
use crate::services::{
    AdminService, AuthService, CatalogService, CheckoutService, Credentials, OrderForm,
    ProductDraft, Registration,
};
use crate::session::{FileSessionStore, SessionStore};
use crate::state::{AppState, Section};
use crate::view::{CartView, OrderView, ProductView, StatsView};

/// Result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Data to display; `None` when the command failed.
    pub value: Option<T>,
    pub notice: Option<Notice>,
    /// Section the user was sent to, if the command navigated.
    pub redirect: Option<Section>,
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            notice: None,
            redirect: None,
        }
    }

    /// No value and nothing to tell the user.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            value: None,
            notice: None,
            redirect: None,
        }
    }

    /// A failed command: the error's notice and redirect, no value.
    ///
    /// Unexpected errors are reported to Sentry here.
    #[must_use]
    pub fn failed(err: impl Into<ClientError>, fallback: &str) -> Self {
        let err = err.into();
        err.report();
        Self {
            value: None,
            notice: Some(err.notice(fallback)),
            redirect: err.redirect(),
        }
    }

    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    #[must_use]
    pub const fn redirect_to(mut self, section: Section) -> Self {
        self.redirect = Some(section);
        self
    }

    /// Whether the command succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

/// Content of a storefront section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home(Vec<ProductView>),
    Products(Vec<ProductView>),
    Login,
    Register,
    Cart(CartView),
    Checkout(CartView),
    Admin(AdminDashboard),
}

/// The admin landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDashboard {
    pub stats: StatsView,
    pub products: Vec<ProductView>,
}

/// The storefront client: configuration, backend client, shared state and
/// cart mirror.
pub struct Storefront {
    config: StorefrontConfig,
    client: RestClient,
    cart: CartSync<RestClient>,
    sessions: Arc<dyn SessionStore>,
}

impl Storefront {
    /// Create a storefront with fresh state.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let client = RestClient::new(&config)?;
        let cart = CartSync::new(client.clone(), AppState::new());
        Ok(Self {
            config,
            client,
            cart,
            sessions,
        })
    }

    /// Create a storefront from environment configuration, persisting the
    /// session to the configured file.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = StorefrontConfig::from_env()?;
        let sessions = Arc::new(FileSessionStore::new(config.session_file.clone()));
        Self::new(config, sessions)
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn client(&self) -> &RestClient {
        &self.client
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        self.cart.state()
    }

    /// The cart mirror.
    #[must_use]
    pub const fn cart_sync(&self) -> &CartSync<RestClient> {
        &self.cart
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.state().current_user().await
    }

    fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.client, &self.config.placeholder_image)
    }

    fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.client, self.sessions.as_ref(), self.state())
    }

    fn admin(&self) -> AdminService<'_> {
        AdminService::new(&self.client, self.state())
    }

    fn checkout(&self) -> CheckoutService<'_, RestClient> {
        CheckoutService::new(&self.client, &self.cart)
    }

    /// Apply the outcome's navigation to state.
    async fn finish<T>(&self, outcome: Outcome<T>) -> Outcome<T> {
        if let Some(section) = outcome.redirect {
            self.state().set_section(section).await;
        }
        outcome
    }

    /// Refresh the mirror, turning a failure into a notice. The last
    /// known-good mirror stays in place when the refresh fails.
    async fn refresh_cart(&self) -> Option<Notice> {
        match self.cart.refresh().await {
            Ok(()) | Err(SyncError::NotSignedIn) => None,
            Err(e) => {
                let err = ClientError::from(e);
                err.report();
                Some(err.notice("Failed to load cart"))
            }
        }
    }

    async fn cart_view(&self) -> CartView {
        CartView::new(&self.cart.snapshot().await, &self.catalog())
    }

    /// The mirrored cart after a mutation.
    ///
    /// A change the server accepted but that could not be reloaded still
    /// yields the (older) mirror, with a notice saying so.
    async fn cart_outcome(
        &self,
        result: SyncResult<()>,
        success: Option<&str>,
        fallback: &str,
    ) -> Outcome<CartView> {
        match result {
            Ok(()) => {
                let outcome = Outcome::ok(self.cart_view().await);
                match success {
                    Some(message) => outcome.with_notice(Notice::success(message)),
                    None => outcome,
                }
            }
            Err(e @ SyncError::ReloadFailed(_)) => {
                let err = ClientError::from(e);
                err.report();
                Outcome::ok(self.cart_view().await).with_notice(err.notice(fallback))
            }
            Err(e) => Outcome::failed(e, fallback),
        }
    }

    // =========================================================================
    // Startup & navigation
    // =========================================================================

    /// Restore the persisted user, load their cart and the home products.
    ///
    /// A failed catalog load takes precedence over a failed cart load when
    /// both produce a notice.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Outcome<Vec<ProductView>> {
        let resumed = self.resume().await;
        let mut outcome = self.show_home().await;
        if outcome.notice.is_none() {
            outcome.notice = resumed.notice;
        }
        outcome
    }

    /// Restore the persisted user and load their cart, without touching
    /// the catalog.
    ///
    /// The value is the restored user, or `None` when no session was
    /// stored. A cart that could not be loaded leaves the user signed in
    /// and adds a notice.
    pub async fn resume(&self) -> Outcome<User> {
        let Some(user) = self.auth().restore().await else {
            return Outcome::none();
        };
        info!(user_id = %user.id, "session restored");
        set_sentry_user(&user.id, &user.username);
        Outcome {
            value: Some(user),
            notice: self.refresh_cart().await,
            redirect: None,
        }
    }

    async fn show_home(&self) -> Outcome<Vec<ProductView>> {
        let outcome = self.products(None).await;
        self.finish(outcome.redirect_to(Section::Home)).await
    }

    /// Navigate to `section` and load what it shows.
    ///
    /// Entering the cart refreshes the mirror; entering checkout checks its
    /// preconditions; entering admin runs the access gate.
    #[instrument(skip(self))]
    pub async fn show_section(&self, section: Section) -> Outcome<Page> {
        let name = section.to_string();
        add_breadcrumb("navigation", "show section", Some(&[("section", name.as_str())]));

        let outcome = match section {
            Section::Home => map_value(self.show_home().await, Page::Home),
            Section::Products => {
                map_value(self.products(None).await, Page::Products).redirect_to(section)
            }
            Section::Login => Outcome::ok(Page::Login).redirect_to(section),
            Section::Register => Outcome::ok(Page::Register).redirect_to(section),
            Section::Cart => {
                let notice = self.refresh_cart().await;
                Outcome {
                    value: Some(Page::Cart(self.cart_view().await)),
                    notice,
                    redirect: Some(section),
                }
            }
            Section::Checkout => map_value(self.begin_checkout().await, Page::Checkout),
            Section::Admin => map_value(self.admin_dashboard().await, Page::Admin),
        };
        self.finish(outcome).await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Sign in, then load the user's cart.
    ///
    /// The sign-in stands even if the cart cannot be loaded; the notice
    /// then says so.
    pub async fn login(&self, credentials: &Credentials) -> Outcome<User> {
        let outcome = match self.auth().login(credentials).await {
            Ok(user) => {
                set_sentry_user(&user.id, &user.username);
                let notice = match self.refresh_cart().await {
                    None => Notice::success("Login successful!"),
                    Some(failed) => Notice::info(format!("Login successful! {}", failed.message)),
                };
                Outcome::ok(user)
                    .with_notice(notice)
                    .redirect_to(Section::Home)
            }
            Err(e) => Outcome::failed(e, "Login failed"),
        };
        self.finish(outcome).await
    }

    /// Create an account and send the user to the login form.
    pub async fn register(&self, registration: &Registration) -> Outcome<()> {
        let outcome = match self.auth().register(registration).await {
            Ok(()) => Outcome::ok(())
                .with_notice(Notice::success("Registration successful! Please login."))
                .redirect_to(Section::Login),
            Err(e) => Outcome::failed(e, "Registration failed"),
        };
        self.finish(outcome).await
    }

    /// Sign out and forget the cart mirror.
    pub async fn logout(&self) -> Outcome<()> {
        clear_sentry_user();
        let outcome = match self.auth().logout().await {
            Ok(()) => Outcome::ok(())
                .with_notice(Notice::success("Logged out successfully!"))
                .redirect_to(Section::Home),
            Err(e) => Outcome::failed(e, "Logout failed").redirect_to(Section::Home),
        };
        self.finish(outcome).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, optionally restricted to one category.
    pub async fn products(&self, category: Option<&str>) -> Outcome<Vec<ProductView>> {
        let catalog = self.catalog();
        match catalog.list().await {
            Ok(products) => {
                let products = match category {
                    Some(category) => filter_by_category(&products, category),
                    None => products,
                };
                Outcome::ok(ProductView::list(&products, &catalog))
            }
            Err(e) => Outcome::failed(e, "Failed to load products"),
        }
    }

    /// Distinct categories across the catalog, for a category filter.
    pub async fn categories(&self) -> Outcome<Vec<String>> {
        match self.catalog().list().await {
            Ok(products) => Outcome::ok(categories(&products)),
            Err(e) => Outcome::failed(e, "Failed to load categories"),
        }
    }

    /// Search products by keyword; a blank keyword lists everything.
    pub async fn search(&self, keyword: &str) -> Outcome<Vec<ProductView>> {
        add_breadcrumb("catalog", "search", Some(&[("keyword", keyword)]));
        let catalog = self.catalog();
        let outcome = match catalog.search(keyword).await {
            Ok(products) => {
                Outcome::ok(ProductView::list(&products, &catalog)).redirect_to(Section::Products)
            }
            Err(e) => Outcome::failed(e, "Search failed"),
        };
        self.finish(outcome).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The cart as currently mirrored, without contacting the backend.
    pub async fn cart(&self) -> CartView {
        self.cart_view().await
    }

    /// Add `quantity` of a product to the cart.
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: i32) -> Outcome<CartView> {
        let id = product_id.to_string();
        add_breadcrumb("cart", "add to cart", Some(&[("product_id", id.as_str())]));

        let outcome = match self.cart.add_item(product_id, quantity).await {
            Err(SyncError::NotSignedIn) => Outcome::failed(SyncError::NotSignedIn, "")
                .with_notice(Notice::error("Please login to add items to cart")),
            result => {
                self.cart_outcome(result, Some("Product added to cart!"), "Failed to add to cart")
                    .await
            }
        };
        self.finish(outcome).await
    }

    /// Set the quantity of a cart line. Zero or less removes it server-side.
    pub async fn update_quantity(
        &self,
        cart_item_id: CartItemId,
        quantity: i32,
    ) -> Outcome<CartView> {
        let result = self.cart.update_quantity(cart_item_id, quantity).await;
        let outcome = self
            .cart_outcome(result, None, "Failed to update quantity")
            .await;
        self.finish(outcome).await
    }

    /// Remove a cart line.
    pub async fn remove_from_cart(&self, cart_item_id: CartItemId) -> Outcome<CartView> {
        let result = self.cart.remove_item(cart_item_id).await;
        let outcome = self
            .cart_outcome(result, Some("Item removed from cart"), "Failed to remove item")
            .await;
        self.finish(outcome).await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Open checkout if someone is signed in and the cart has items.
    pub async fn begin_checkout(&self) -> Outcome<CartView> {
        let outcome = match self.checkout().begin().await {
            Ok(()) => Outcome::ok(self.cart_view().await).redirect_to(Section::Checkout),
            Err(e) => Outcome::failed(e, "Checkout unavailable"),
        };
        self.finish(outcome).await
    }

    /// Place the order and return home.
    pub async fn place_order(&self, form: &OrderForm) -> Outcome<OrderCreated> {
        let outcome = match self.checkout().place_order(form).await {
            Ok(created) => {
                let notice = Notice::success(format!(
                    "Order placed successfully! Order ID: {}",
                    created.order_id
                ));
                Outcome::ok(created)
                    .with_notice(notice)
                    .redirect_to(Section::Home)
            }
            Err(e) => Outcome::failed(e, "Failed to place order"),
        };
        self.finish(outcome).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Dashboard counters and the product management list.
    pub async fn admin_dashboard(&self) -> Outcome<AdminDashboard> {
        let admin = self.admin();
        let stats = match admin.stats().await {
            Ok(stats) => stats,
            Err(e) => return self.finish(Outcome::failed(e, "Failed to load dashboard")).await,
        };
        let products = match admin.products().await {
            Ok(products) => products,
            Err(e) => return self.finish(Outcome::failed(e, "Failed to load products")).await,
        };

        let dashboard = AdminDashboard {
            stats: StatsView::from(&stats),
            products: ProductView::list(&products, &self.catalog()),
        };
        self.finish(Outcome::ok(dashboard).redirect_to(Section::Admin))
            .await
    }

    /// Every order, newest first as the backend returns them.
    pub async fn admin_orders(&self) -> Outcome<Vec<OrderView>> {
        let outcome = match self.admin().orders().await {
            Ok(orders) => Outcome::ok(orders.iter().map(OrderView::from).collect()),
            Err(e) => Outcome::failed(e, "Failed to load orders"),
        };
        self.finish(outcome).await
    }

    /// Move an order to a new status.
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Outcome<()> {
        let outcome = match self.admin().update_order_status(order_id, status).await {
            Ok(()) => {
                Outcome::ok(()).with_notice(Notice::success("Order status updated successfully!"))
            }
            Err(e) => Outcome::failed(e, "Failed to update order status"),
        };
        self.finish(outcome).await
    }

    /// Validate and upload a new product.
    pub async fn add_product(&self, draft: ProductDraft) -> Outcome<ProductView> {
        let outcome = match self.admin().add_product(draft).await {
            Ok(product) => Outcome::ok(ProductView::new(&product, &self.catalog()))
                .with_notice(Notice::success("Product added successfully!")),
            Err(e) => Outcome::failed(e, "Failed to add product"),
        };
        self.finish(outcome).await
    }

    /// Delete a product.
    pub async fn delete_product(&self, product_id: ProductId) -> Outcome<()> {
        let outcome = match self.admin().delete_product(product_id).await {
            Ok(()) => Outcome::ok(()).with_notice(Notice::success("Product deleted successfully!")),
            Err(e) => Outcome::failed(e, "Failed to delete product"),
        };
        self.finish(outcome).await
    }
}

fn map_value<T, U>(outcome: Outcome<T>, f: impl FnOnce(T) -> U) -> Outcome<U> {
    Outcome {
        value: outcome.value.map(f),
        notice: outcome.notice,
        redirect: outcome.redirect,
    }
}
