//! `reqwest` implementation of the storefront REST API.

use std::sync::Arc;

use ecomweb_core::{
    AddToCartRequest, CartItem, CartItemId, CartTotal, CreateOrderRequest, DashboardStats,
    ErrorBody, LoginRequest, LoginResponse, Order, OrderCreated, OrderId, OrderStatus, Price,
    Product, ProductId, RegisterRequest, UpdateOrderStatusRequest, UpdateQuantityRequest, UserId,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, ApiResult, CartApi};
use crate::config::StorefrontConfig;

// =============================================================================
// Upload types
// =============================================================================

/// Image file attached to a new product.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Validated fields of `POST /products/with-image`.
#[derive(Debug, Clone)]
pub struct ProductUpload {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock_quantity: i32,
    pub category: String,
    pub brand: String,
    pub image: Option<ImageUpload>,
}

impl ProductUpload {
    fn into_form(self) -> ApiResult<Form> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("description", self.description)
            .text("price", self.price.amount().to_string())
            .text("stockQuantity", self.stock_quantity.to_string())
            .text("category", self.category)
            .text("brand", self.brand);

        if let Some(image) = self.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

/// The create endpoint answers with the product itself or wrapped in
/// `{"product": ...}` depending on the backend version.
#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedProduct {
    Wrapped { product: Product },
    Bare(Product),
}

impl From<CreatedProduct> for Product {
    fn from(created: CreatedProduct) -> Self {
        match created {
            CreatedProduct::Wrapped { product } | CreatedProduct::Bare(product) => product,
        }
    }
}

// =============================================================================
// RestClient
// =============================================================================

/// Client for the storefront REST backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base: Url,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base: config.api_base.clone(),
            }),
        })
    }

    /// URL of the stored image bytes of a product.
    ///
    /// # Errors
    ///
    /// Returns error if the URL cannot be built from the base.
    pub fn product_image_url(&self, product_id: ProductId) -> ApiResult<Url> {
        self.url(&format!("images/product/{product_id}"))
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn url(&self, path: &str) -> ApiResult<Url> {
        Ok(self.inner.base.join(path)?)
    }

    /// Send a request and turn any non-2xx status into `ApiError::Rejected`.
    async fn send(request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // Body may be empty or not JSON at all; a missing message is fine
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.or(b.message))
                .filter(|m| !m.trim().is_empty());

            debug!(status = status.as_u16(), ?message, "request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = Self::send(self.inner.client.get(url)).await?;
        Ok(response.json().await?)
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// `GET /products`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.get_json("products").await
    }

    /// `GET /products/search?keyword=`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn search_products(&self, keyword: &str) -> ApiResult<Vec<Product>> {
        self.get_json(&format!(
            "products/search?keyword={}",
            urlencoding::encode(keyword)
        ))
        .await
    }

    /// `POST /products/with-image` as a multipart form.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self, upload), fields(name = %upload.name))]
    pub async fn add_product(&self, upload: ProductUpload) -> ApiResult<Product> {
        let url = self.url("products/with-image")?;
        debug!(%url, "POST multipart");
        let form = upload.into_form()?;
        let response = Self::send(self.inner.client.post(url).multipart(form)).await?;
        let created: CreatedProduct = response.json().await?;
        Ok(created.into())
    }

    /// `DELETE /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> ApiResult<()> {
        let url = self.url(&format!("products/{product_id}"))?;
        debug!(%url, "DELETE");
        Self::send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// `POST /users/login`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credentials are rejected.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let url = self.url("users/login")?;
        debug!(%url, "POST");
        let response = Self::send(self.inner.client.post(url).json(request)).await?;
        Ok(response.json().await?)
    }

    /// `POST /users/register`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        let url = self.url("users/register")?;
        debug!(%url, "POST");
        Self::send(self.inner.client.post(url).json(request)).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// `POST /orders/create`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> ApiResult<OrderCreated> {
        let url = self.url("orders/create")?;
        debug!(%url, "POST");
        let response = Self::send(self.inner.client.post(url).json(request)).await?;
        Ok(response.json().await?)
    }

    /// `GET /orders/admin/all`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> ApiResult<Vec<Order>> {
        self.get_json("orders/admin/all").await
    }

    /// `PUT /orders/admin/status/{orderId}`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> ApiResult<()> {
        let url = self.url(&format!("orders/admin/status/{order_id}"))?;
        debug!(%url, "PUT");
        let body = UpdateOrderStatusRequest { status };
        Self::send(self.inner.client.put(url).json(&body)).await?;
        Ok(())
    }

    /// `GET /dashboard/stats`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get_json("dashboard/stats").await
    }
}

impl CartApi for RestClient {
    #[instrument(skip(self))]
    async fn list_cart(&self, user_id: UserId) -> ApiResult<Vec<CartItem>> {
        self.get_json(&format!("cart/user/{user_id}")).await
    }

    #[instrument(skip(self))]
    async fn cart_total(&self, user_id: UserId) -> ApiResult<CartTotal> {
        self.get_json(&format!("cart/total/{user_id}")).await
    }

    #[instrument(skip(self))]
    async fn add_to_cart(&self, request: AddToCartRequest) -> ApiResult<()> {
        let url = self.url("cart/add")?;
        debug!(%url, "POST");
        Self::send(self.inner.client.post(url).json(&request)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_cart_item(&self, cart_item_id: CartItemId, quantity: i32) -> ApiResult<()> {
        let url = self.url(&format!("cart/update/{cart_item_id}"))?;
        debug!(%url, "PUT");
        let body = UpdateQuantityRequest { quantity };
        Self::send(self.inner.client.put(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_cart_item(&self, cart_item_id: CartItemId) -> ApiResult<()> {
        let url = self.url(&format!("cart/remove/{cart_item_id}"))?;
        debug!(%url, "DELETE");
        Self::send(self.inner.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        let config = StorefrontConfig::for_api_base("http://localhost:8080/api").unwrap();
        RestClient::new(&config).unwrap()
    }

    #[test]
    fn test_urls_are_relative_to_base_path() {
        let client = client();
        assert_eq!(
            client.url("cart/user/7").unwrap().as_str(),
            "http://localhost:8080/api/cart/user/7"
        );
    }

    #[test]
    fn test_product_image_url() {
        let url = client().product_image_url(ProductId::new(12)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/images/product/12");
    }

    #[test]
    fn test_created_product_accepts_both_shapes() {
        let bare = r#"{"id": 1, "name": "Mug", "price": 250}"#;
        let wrapped = r#"{"message": "ok", "product": {"id": 1, "name": "Mug", "price": 250}}"#;

        let a: Product = serde_json::from_str::<CreatedProduct>(bare).unwrap().into();
        let b: Product = serde_json::from_str::<CreatedProduct>(wrapped)
            .unwrap()
            .into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_upload_with_invalid_mime_is_rejected() {
        let upload = ProductUpload {
            name: "Mug".to_string(),
            description: String::new(),
            price: "250".parse().unwrap(),
            stock_quantity: 3,
            category: String::new(),
            brand: String::new(),
            image: Some(ImageUpload {
                file_name: "mug.png".to_string(),
                content_type: "not a mime".to_string(),
                bytes: vec![1, 2, 3],
            }),
        };
        assert!(matches!(upload.into_form(), Err(ApiError::Network(_))));
    }
}
