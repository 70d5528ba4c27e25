//! Integration tests for ecomweb.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecomweb-integration-tests
//! ```
//!
//! No external services are needed: every test starts a [`FakeBackend`], an
//! in-memory implementation of the storefront REST API served by `axum` on
//! an ephemeral local port, and points a real
//! [`Storefront`](ecomweb_storefront::Storefront) at it.
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart mirror against the server cart
//! - `account` - Login, registration, logout and session persistence
//! - `checkout` - Order placement
//! - `admin` - Access gate, dashboard, orders and product management
//! - `network` - Behavior when the backend is unreachable

#![allow(clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use ecomweb_core::{
    AddToCartRequest, CartItem, CartItemId, CartTotal, CreateOrderRequest, DashboardStats,
    LoginRequest, Order, OrderCustomer, OrderId, OrderStatus, Price, Product, ProductId,
    RegisterRequest, Role, UpdateOrderStatusRequest, UpdateQuantityRequest, User, UserId,
};
use ecomweb_storefront::Storefront;
use ecomweb_storefront::config::StorefrontConfig;
use ecomweb_storefront::services::Credentials;
use ecomweb_storefront::session::{MemorySessionStore, SessionStore};
use serde::Deserialize;
use serde_json::json;

/// Stock at or below which a product counts as low on the dashboard.
const LOW_STOCK_THRESHOLD: i32 = 10;

/// Username and password of the seeded administrator.
pub const ADMIN: (&str, &str) = ("admin", "admin123");

/// Username and password of the seeded shopper.
pub const SHOPPER: (&str, &str) = ("asha", "password1");

/// An image stored with a product.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct CartLine {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
}

#[derive(Debug, Default)]
struct Store {
    users: Vec<(User, String)>,
    products: BTreeMap<ProductId, Product>,
    images: BTreeMap<ProductId, StoredImage>,
    cart: Vec<CartLine>,
    orders: Vec<(UserId, Order)>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.iter().map(|(u, _)| u).find(|u| u.id == user_id)
    }

    fn cart_items(&self, user_id: UserId) -> Vec<CartItem> {
        self.cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                Some(CartItem {
                    id: l.id,
                    quantity: l.quantity,
                    product: self.products.get(&l.product_id)?.clone(),
                })
            })
            .collect()
    }
}

#[derive(Clone, Default)]
struct Backend {
    store: Arc<Mutex<Store>>,
    requests: Arc<AtomicUsize>,
    fail_cart_total: Arc<AtomicBool>,
    fail_cart_listing: Arc<AtomicBool>,
}

impl Backend {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory storefront backend listening on `127.0.0.1`.
///
/// Seeded with an administrator, a shopper and three products. Non-2xx
/// answers carry an `{"error": "..."}` body like the real backend.
pub struct FakeBackend {
    addr: SocketAddr,
    backend: Backend,
}

impl FakeBackend {
    /// Seed the store and start serving.
    pub async fn start() -> Self {
        let backend = Backend::default();
        seed(&mut backend.store());

        let app = router(backend.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

        Self { addr, backend }
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// A storefront talking to this backend with the given session store.
    #[must_use]
    pub fn storefront_with(&self, sessions: Arc<dyn SessionStore>) -> Storefront {
        let config = StorefrontConfig::for_api_base(&self.api_base()).expect("valid api base");
        Storefront::new(config, sessions).expect("build storefront")
    }

    /// A storefront with an in-memory session store and nobody signed in.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(Arc::new(MemorySessionStore::new()))
    }

    /// A storefront signed in as `(username, password)`.
    pub async fn signed_in(&self, (username, password): (&str, &str)) -> Storefront {
        let storefront = self.storefront();
        let outcome = storefront
            .login(&Credentials::new(username, password))
            .await;
        assert!(outcome.is_ok(), "login as {username} failed: {:?}", outcome.notice);
        storefront
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.backend.requests.load(Ordering::SeqCst)
    }

    /// Make `GET /cart/total/{userId}` answer 500 until turned off again.
    pub fn fail_cart_total(&self, fail: bool) {
        self.backend.fail_cart_total.store(fail, Ordering::SeqCst);
    }

    /// Make `GET /cart/user/{userId}` answer 503 until turned off again.
    pub fn fail_cart_listing(&self, fail: bool) {
        self.backend.fail_cart_listing.store(fail, Ordering::SeqCst);
    }

    /// Add a product directly to the store.
    pub fn add_product(&self, name: &str, price: &str, stock: i32, category: &str) -> ProductId {
        let mut store = self.backend.store();
        let id = ProductId::new(store.next_id());
        store
            .products
            .insert(id, product(id, name, price, stock, category));
        id
    }

    /// A product as currently stored.
    #[must_use]
    pub fn product(&self, product_id: ProductId) -> Option<Product> {
        self.backend.store().products.get(&product_id).cloned()
    }

    /// The product with this name.
    #[must_use]
    pub fn product_named(&self, name: &str) -> Option<Product> {
        self.backend
            .store()
            .products
            .values()
            .find(|p| p.name == name)
            .cloned()
    }

    /// The image stored for a product.
    #[must_use]
    pub fn image(&self, product_id: ProductId) -> Option<StoredImage> {
        self.backend.store().images.get(&product_id).cloned()
    }

    /// The server-side cart of `username`.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<CartItem> {
        let store = self.backend.store();
        store
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(u, _)| store.cart_items(u.id))
            .unwrap_or_default()
    }

    /// Every order placed so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.backend
            .store()
            .orders
            .iter()
            .map(|(_, o)| o.clone())
            .collect()
    }
}

fn product(id: ProductId, name: &str, price: &str, stock: i32, category: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: Some(format!("{name} for everyday use")),
        price: price.parse().expect("valid price"),
        stock_quantity: stock,
        category: Some(category.to_string()),
        brand: Some("Acme".to_string()),
        image_url: None,
        has_image: false,
    }
}

fn seed(store: &mut Store) {
    for (username, password, role) in [
        (ADMIN.0, ADMIN.1, Role::Admin),
        (SHOPPER.0, SHOPPER.1, Role::User),
    ] {
        let id = UserId::new(store.next_id());
        let user = User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} tester"),
            address: "12 MG Road, Bengaluru".to_string(),
            phone_number: "9800000000".to_string(),
            role,
        };
        store.users.push((user, password.to_string()));
    }

    for (name, price, stock, category) in [
        ("Copper Kettle", "10.00", 20, "Kitchen"),
        ("Steel Tumbler", "250.00", 5, "Kitchen"),
        ("Garden Hose", "1499.50", 0, "Garden"),
    ] {
        let id = ProductId::new(store.next_id());
        store
            .products
            .insert(id, product(id, name, price, stock, category));
    }
}

// =============================================================================
// Routes
// =============================================================================

fn router(backend: Backend) -> Router {
    let api = Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/with-image", post(create_product))
        .route("/products/{id}", delete(delete_product))
        .route("/images/product/{id}", get(product_image))
        .route("/users/login", post(login))
        .route("/users/register", post(register))
        .route("/cart/user/{user_id}", get(list_cart))
        .route("/cart/total/{user_id}", get(cart_total))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update/{id}", put(update_cart_item))
        .route("/cart/remove/{id}", delete(remove_cart_item))
        .route("/orders/create", post(create_order))
        .route("/orders/admin/all", get(all_orders))
        .route("/orders/admin/status/{id}", put(update_order_status))
        .route("/dashboard/stats", get(dashboard_stats));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), count_requests))
        .with_state(backend)
}

async fn count_requests(State(backend): State<Backend>, request: Request, next: Next) -> Response {
    backend.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    keyword: String,
}

async fn list_products(State(backend): State<Backend>) -> Json<Vec<Product>> {
    Json(backend.store().products.values().cloned().collect())
}

async fn search_products(
    State(backend): State<Backend>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Product>> {
    let keyword = query.keyword.to_lowercase();
    let products = backend
        .store()
        .products
        .values()
        .filter(|p| {
            p.name.to_lowercase().contains(&keyword)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&keyword))
        })
        .cloned()
        .collect();
    Json(products)
}

async fn create_product(State(backend): State<Backend>, mut multipart: Multipart) -> Response {
    let mut fields = BTreeMap::new();
    let mut image = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let Ok(bytes) = field.bytes().await else {
                return reject(StatusCode::BAD_REQUEST, "Invalid image");
            };
            image = Some(StoredImage {
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let Ok(text) = field.text().await else {
                return reject(StatusCode::BAD_REQUEST, "Invalid form field");
            };
            fields.insert(name, text);
        }
    }

    let text = |key: &str| fields.get(key).cloned().unwrap_or_default();
    let Ok(price) = text("price").parse::<Price>() else {
        return reject(StatusCode::BAD_REQUEST, "Invalid price");
    };
    let Ok(stock_quantity) = text("stockQuantity").parse::<i32>() else {
        return reject(StatusCode::BAD_REQUEST, "Invalid stock quantity");
    };

    let mut store = backend.store();
    let id = ProductId::new(store.next_id());
    let created = Product {
        id,
        name: text("name"),
        description: Some(text("description")),
        price,
        stock_quantity,
        category: Some(text("category")),
        brand: Some(text("brand")),
        image_url: None,
        has_image: image.is_some(),
    };
    store.products.insert(id, created.clone());
    if let Some(image) = image {
        store.images.insert(id, image);
    }

    Json(json!({ "message": "Product created successfully", "product": created })).into_response()
}

async fn delete_product(State(backend): State<Backend>, Path(id): Path<ProductId>) -> Response {
    let mut store = backend.store();
    if store.products.remove(&id).is_none() {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    }
    store.images.remove(&id);
    store.cart.retain(|l| l.product_id != id);
    Json(json!({ "message": "Product deleted successfully" })).into_response()
}

async fn product_image(State(backend): State<Backend>, Path(id): Path<ProductId>) -> Response {
    match backend.store().images.get(&id) {
        Some(image) => (
            [(header::CONTENT_TYPE, image.content_type.clone())],
            image.bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn login(State(backend): State<Backend>, Json(request): Json<LoginRequest>) -> Response {
    let store = backend.store();
    let found = store
        .users
        .iter()
        .find(|(u, password)| u.username == request.username && *password == request.password);

    match found {
        Some((user, _)) => {
            Json(json!({ "message": "Login successful", "user": user })).into_response()
        }
        None => reject(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn register(State(backend): State<Backend>, Json(request): Json<RegisterRequest>) -> Response {
    let mut store = backend.store();
    if store.users.iter().any(|(u, _)| u.username == request.username) {
        return reject(StatusCode::BAD_REQUEST, "Username already exists");
    }

    let id = UserId::new(store.next_id());
    let user = User {
        id,
        username: request.username,
        email: request.email,
        full_name: request.full_name,
        address: request.address,
        phone_number: request.phone_number,
        role: Role::User,
    };
    store.users.push((user, request.password));
    Json(json!({ "message": "User registered successfully" })).into_response()
}

async fn list_cart(State(backend): State<Backend>, Path(user_id): Path<UserId>) -> Response {
    if backend.fail_cart_listing.load(Ordering::SeqCst) {
        return reject(StatusCode::SERVICE_UNAVAILABLE, "Cart unavailable");
    }
    Json(backend.store().cart_items(user_id)).into_response()
}

async fn cart_total(State(backend): State<Backend>, Path(user_id): Path<UserId>) -> Response {
    if backend.fail_cart_total.load(Ordering::SeqCst) {
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "Total unavailable");
    }

    let items = backend.store().cart_items(user_id);
    let total = CartTotal {
        total: items.iter().map(CartItem::line_total).sum(),
        item_count: Some(items.iter().map(|i| i64::from(i.quantity)).sum()),
    };
    Json(total).into_response()
}

async fn add_to_cart(
    State(backend): State<Backend>,
    Json(request): Json<AddToCartRequest>,
) -> Response {
    let mut store = backend.store();
    if store.user(request.user_id).is_none() {
        return reject(StatusCode::BAD_REQUEST, "User not found");
    }
    let Some(stock) = store.products.get(&request.product_id).map(|p| p.stock_quantity) else {
        return reject(StatusCode::BAD_REQUEST, "Product not found");
    };

    let existing = store
        .cart
        .iter()
        .position(|l| l.user_id == request.user_id && l.product_id == request.product_id);
    let current = existing
        .and_then(|i| store.cart.get(i))
        .map_or(0, |l| l.quantity);

    if current + request.quantity > stock {
        return reject(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    match existing.and_then(|i| store.cart.get_mut(i)) {
        Some(line) => line.quantity += request.quantity,
        None => {
            let id = CartItemId::new(store.next_id());
            store.cart.push(CartLine {
                id,
                user_id: request.user_id,
                product_id: request.product_id,
                quantity: request.quantity,
            });
        }
    }

    Json(json!({ "message": "Item added to cart" })).into_response()
}

async fn update_cart_item(
    State(backend): State<Backend>,
    Path(id): Path<CartItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Response {
    let mut store = backend.store();
    let Some(index) = store.cart.iter().position(|l| l.id == id) else {
        return reject(StatusCode::BAD_REQUEST, "Cart item not found");
    };

    if request.quantity <= 0 {
        store.cart.remove(index);
        return Json(json!({ "message": "Item removed from cart" })).into_response();
    }

    let product_id = store.cart.get(index).map(|l| l.product_id);
    let stock = product_id
        .and_then(|p| store.products.get(&p))
        .map_or(0, |p| p.stock_quantity);
    if request.quantity > stock {
        return reject(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    if let Some(line) = store.cart.get_mut(index) {
        line.quantity = request.quantity;
    }
    Json(json!({ "message": "Cart updated" })).into_response()
}

async fn remove_cart_item(State(backend): State<Backend>, Path(id): Path<CartItemId>) -> Response {
    let mut store = backend.store();
    let before = store.cart.len();
    store.cart.retain(|l| l.id != id);
    if store.cart.len() == before {
        return reject(StatusCode::BAD_REQUEST, "Cart item not found");
    }
    Json(json!({ "message": "Item removed from cart" })).into_response()
}

async fn create_order(
    State(backend): State<Backend>,
    Json(request): Json<CreateOrderRequest>,
) -> Response {
    let mut store = backend.store();
    let Some(user) = store.user(request.user_id).cloned() else {
        return reject(StatusCode::BAD_REQUEST, "User not found");
    };

    let items = store.cart_items(user.id);
    if items.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Cart is empty");
    }
    if let Some(short) = items.iter().find(|i| i.quantity > i.product.stock_quantity) {
        let message = format!("Insufficient stock for {}", short.product.name);
        return reject(StatusCode::BAD_REQUEST, &message);
    }

    for item in &items {
        if let Some(p) = store.products.get_mut(&item.product.id) {
            p.stock_quantity -= item.quantity;
        }
    }
    store.cart.retain(|l| l.user_id != user.id);

    let id = OrderId::new(store.next_id());
    let total: Price = items.iter().map(CartItem::line_total).sum();
    let order = Order {
        id,
        user: Some(OrderCustomer {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }),
        order_date: NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap_or_default(),
        status: OrderStatus::Pending,
        total_amount: total,
        shipping_address: request.shipping_address,
        payment_method: Some(request.payment_method),
    };
    store.orders.push((user.id, order));

    Json(json!({
        "message": "Order created successfully",
        "orderId": id,
        "totalAmount": total,
        "status": OrderStatus::Pending,
    }))
    .into_response()
}

async fn all_orders(State(backend): State<Backend>) -> Json<Vec<Order>> {
    let mut orders: Vec<Order> = backend
        .store()
        .orders
        .iter()
        .map(|(_, o)| o.clone())
        .collect();
    orders.reverse();
    Json(orders)
}

async fn update_order_status(
    State(backend): State<Backend>,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Response {
    let mut store = backend.store();
    match store.orders.iter_mut().find(|(_, o)| o.id == id) {
        Some((_, order)) => {
            order.status = request.status;
            Json(json!({ "message": "Order status updated" })).into_response()
        }
        None => reject(StatusCode::BAD_REQUEST, "Order not found"),
    }
}

async fn dashboard_stats(State(backend): State<Backend>) -> Json<DashboardStats> {
    let store = backend.store();
    let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);

    Json(DashboardStats {
        total_users: count(store.users.len()),
        total_products: count(store.products.len()),
        total_orders: count(store.orders.len()),
        total_revenue: store
            .orders
            .iter()
            .filter(|(_, o)| o.status != OrderStatus::Cancelled)
            .map(|(_, o)| o.total_amount)
            .sum(),
        pending_orders: count(
            store
                .orders
                .iter()
                .filter(|(_, o)| o.status == OrderStatus::Pending)
                .count(),
        ),
        low_stock_products: count(
            store
                .products
                .values()
                .filter(|p| p.stock_quantity <= LOW_STOCK_THRESHOLD)
                .count(),
        ),
    })
}
