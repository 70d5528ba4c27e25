//! Admin dashboard commands.
//!
//! # Usage
//!
//! ```bash
//! ecomweb admin stats
//! ecomweb admin orders
//! ecomweb admin order-status 12 shipped
//! ecomweb admin add-product --name "Copper Kettle" --price 1499 --stock 12 --image kettle.png
//! ecomweb admin delete-product 7
//! ```
//!
//! Every command requires a signed-in user with the `ADMIN` role.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ecomweb_core::{OrderId, OrderStatus, ProductId};
use ecomweb_storefront::Storefront;
use ecomweb_storefront::api::ImageUpload;
use ecomweb_storefront::services::ProductDraft;

use super::CliError;
use crate::render;

pub async fn stats(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.admin_dashboard().await;
    render::outcome(&outcome, render::dashboard)
}

pub async fn orders(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.admin_orders().await;
    render::outcome(&outcome, |o| render::orders(o))
}

pub async fn order_status(
    storefront: &Storefront,
    order_id: OrderId,
    status: OrderStatus,
) -> ExitCode {
    let outcome = storefront.update_order_status(order_id, status).await;
    render::outcome(&outcome, render::nothing)
}

/// Fields of `admin add-product`.
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: String,
    pub brand: String,
    pub image: Option<PathBuf>,
}

/// Read the image (if any) and upload the product.
///
/// # Errors
///
/// Returns error if the image file cannot be read.
pub async fn add_product(
    storefront: &Storefront,
    product: NewProduct,
) -> Result<ExitCode, CliError> {
    let image = product.image.as_deref().map(read_image).transpose()?;

    let draft = ProductDraft {
        name: product.name,
        description: product.description,
        price: product.price,
        stock_quantity: product.stock,
        category: product.category,
        brand: product.brand,
        image,
    };

    let outcome = storefront.add_product(draft).await;
    Ok(render::outcome(&outcome, render::product))
}

pub async fn delete_product(storefront: &Storefront, product_id: ProductId) -> ExitCode {
    let outcome = storefront.delete_product(product_id).await;
    render::outcome(&outcome, render::nothing)
}

fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

    Ok(ImageUpload {
        content_type: content_type_for(path).to_string(),
        file_name,
        bytes,
    })
}

/// Content type guessed from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
