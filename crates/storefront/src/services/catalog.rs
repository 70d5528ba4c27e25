//! Product catalog browsing.

use ecomweb_core::Product;
use tracing::instrument;

use crate::api::{ApiResult, RestClient};

/// Category value that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Read-only access to the product catalog.
pub struct CatalogService<'a> {
    client: &'a RestClient,
    placeholder_image: &'a str,
}

impl<'a> CatalogService<'a> {
    /// Create a catalog service.
    #[must_use]
    pub const fn new(client: &'a RestClient, placeholder_image: &'a str) -> Self {
        Self {
            client,
            placeholder_image,
        }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn list(&self) -> ApiResult<Vec<Product>> {
        self.client.list_products().await
    }

    /// Products matching `keyword`. A blank keyword lists everything.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> ApiResult<Vec<Product>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list().await;
        }
        self.client.search_products(keyword).await
    }

    /// Where to load the image of `product` from.
    ///
    /// Stored image bytes win over an external URL; products with neither
    /// get the placeholder.
    #[must_use]
    pub fn image_url(&self, product: &Product) -> String {
        if product.has_image
            && let Ok(url) = self.client.product_image_url(product.id)
        {
            return url.into();
        }

        product
            .image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(self.placeholder_image)
            .to_string()
    }
}

/// Keep the products in `category`, case-insensitively.
///
/// `all` or a blank category keeps everything.
#[must_use]
pub fn filter_by_category(products: &[Product], category: &str) -> Vec<Product> {
    let category = category.trim();
    if category.is_empty() || category.eq_ignore_ascii_case(ALL_CATEGORIES) {
        return products.to_vec();
    }

    products
        .iter()
        .filter(|p| {
            p.category
                .as_deref()
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(category))
        })
        .cloned()
        .collect()
}

/// Distinct categories present in `products`, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut categories: Vec<String> = products
        .iter()
        .filter_map(|p| p.category.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    categories.sort_unstable_by_key(|c| c.to_lowercase());
    categories.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    categories
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecomweb_core::ProductId;

    use super::*;
    use crate::config::StorefrontConfig;

    fn product(id: i64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price: "10".parse().unwrap(),
            stock_quantity: 1,
            category: category.map(String::from),
            brand: None,
            image_url: None,
            has_image: false,
        }
    }

    #[test]
    fn test_filter_by_category() {
        let products = vec![
            product(1, Some("Kitchen")),
            product(2, Some("garden")),
            product(3, None),
        ];

        let kitchen = filter_by_category(&products, "kitchen");
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].id, ProductId::new(1));

        assert_eq!(filter_by_category(&products, "All").len(), 3);
        assert_eq!(filter_by_category(&products, "  ").len(), 3);
        assert!(filter_by_category(&products, "Toys").is_empty());
    }

    #[test]
    fn test_categories_are_distinct_and_sorted() {
        let products = vec![
            product(1, Some("Kitchen")),
            product(2, Some("garden")),
            product(3, Some("kitchen")),
            product(4, None),
        ];
        assert_eq!(categories(&products), vec!["garden", "Kitchen"]);
    }

    #[test]
    fn test_image_url_resolution() {
        let config = StorefrontConfig::for_api_base("http://localhost:8080/api").unwrap();
        let client = RestClient::new(&config).unwrap();
        let catalog = CatalogService::new(&client, "placeholder.svg");

        let mut stored = product(5, None);
        stored.has_image = true;
        stored.image_url = Some("https://cdn.example.com/5.jpg".to_string());
        assert_eq!(
            catalog.image_url(&stored),
            "http://localhost:8080/api/images/product/5"
        );

        let mut external = product(6, None);
        external.image_url = Some("https://cdn.example.com/6.jpg".to_string());
        assert_eq!(catalog.image_url(&external), "https://cdn.example.com/6.jpg");

        assert_eq!(catalog.image_url(&product(7, None)), "placeholder.svg");
    }
}
