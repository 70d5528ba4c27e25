//! Admin dashboard operations.
//!
//! Every operation first runs the access gate: only a signed-in user with
//! the `ADMIN` role gets through. The gate is a client-side courtesy; the
//! backend is still responsible for enforcing access.

use ecomweb_core::{
    DashboardStats, Order, OrderId, OrderStatus, Price, PriceError, Product, ProductId, User,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiError, ImageUpload, ProductUpload, RestClient};
use crate::state::AppState;

/// Largest image accepted for upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur on the admin dashboard.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The current user is not an administrator; nothing was sent.
    #[error("access denied")]
    AccessDenied,

    /// The product form failed validation; nothing was sent.
    #[error(transparent)]
    InvalidDraft(#[from] DraftError),

    /// The backend call failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Reasons a product form is rejected before upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Product name is required")]
    MissingName,

    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    #[error("Stock quantity must be a whole number of 0 or more")]
    InvalidStock,

    #[error("Please select an image file")]
    NotAnImage,

    #[error("Image size must be less than 5MB")]
    ImageTooLarge { size: usize },
}

/// The add-product form as entered.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock_quantity: String,
    pub category: String,
    pub brand: String,
    pub image: Option<ImageUpload>,
}

impl ProductDraft {
    /// Validate the form and turn it into an upload.
    ///
    /// # Errors
    ///
    /// Returns the first problem found with the form.
    pub fn validate(self) -> Result<ProductUpload, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }

        let price = Price::parse_positive(self.price.trim())?;

        let stock_quantity = self
            .stock_quantity
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|q| *q >= 0)
            .ok_or(DraftError::InvalidStock)?;

        if let Some(image) = &self.image {
            validate_image(image)?;
        }

        Ok(ProductUpload {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            stock_quantity,
            category: self.category.trim().to_string(),
            brand: self.brand.trim().to_string(),
            image: self.image,
        })
    }
}

/// Check an image attachment: `image/*` content type and at most 5 MiB.
///
/// # Errors
///
/// Returns `NotAnImage` or `ImageTooLarge`.
pub fn validate_image(image: &ImageUpload) -> Result<(), DraftError> {
    let is_image = image
        .content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/");
    if !is_image {
        return Err(DraftError::NotAnImage);
    }
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(DraftError::ImageTooLarge {
            size: image.bytes.len(),
        });
    }
    Ok(())
}

/// Admin dashboard service.
pub struct AdminService<'a> {
    client: &'a RestClient,
    state: &'a AppState,
}

impl<'a> AdminService<'a> {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(client: &'a RestClient, state: &'a AppState) -> Self {
        Self { client, state }
    }

    /// The signed-in administrator.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` when nobody is signed in or the user lacks the
    /// `ADMIN` role.
    pub async fn gate(&self) -> Result<User, AdminError> {
        self.state
            .current_user()
            .await
            .filter(User::is_admin)
            .ok_or(AdminError::AccessDenied)
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or the error of the request.
    pub async fn stats(&self) -> Result<DashboardStats, AdminError> {
        self.gate().await?;
        Ok(self.client.dashboard_stats().await?)
    }

    /// Every product, for the management list.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or the error of the request.
    pub async fn products(&self) -> Result<Vec<Product>, AdminError> {
        self.gate().await?;
        Ok(self.client.list_products().await?)
    }

    /// Every order of every customer.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or the error of the request.
    pub async fn orders(&self) -> Result<Vec<Order>, AdminError> {
        self.gate().await?;
        Ok(self.client.all_orders().await?)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or the error of the request.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), AdminError> {
        let admin = self.gate().await?;
        self.client.update_order_status(order_id, status).await?;
        info!(%order_id, %status, admin_id = %admin.id, "order status updated");
        Ok(())
    }

    /// Validate and upload a new product.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or `InvalidDraft` without a network call,
    /// otherwise the error of the upload.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product, AdminError> {
        let admin = self.gate().await?;
        let upload = draft.validate()?;
        let product = self.client.add_product(upload).await?;
        info!(product_id = %product.id, admin_id = %admin.id, "product added");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` or the error of the request.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), AdminError> {
        let admin = self.gate().await?;
        self.client.delete_product(product_id).await?;
        info!(%product_id, admin_id = %admin.id, "product deleted");
        Ok(())
    }
}
