//! Display data for the storefront sections.
//!
//! Views are plain, pre-formatted snapshots; building one never touches the
//! network. Money is formatted as rupees with Indian digit grouping.

use ecomweb_core::{CartItemId, DashboardStats, Order, OrderId, OrderStatus, Product, ProductId};

use crate::cart::derive;
use crate::services::CatalogService;
use crate::state::CartSnapshot;

// =============================================================================
// Products
// =============================================================================

/// Product card display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub brand: String,
    pub stock: String,
    pub in_stock: bool,
    pub image_url: String,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, catalog: &CatalogService<'_>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: non_blank(product.description.as_deref())
                .unwrap_or("No description available")
                .to_string(),
            price: product.price.to_string(),
            category: non_blank(product.category.as_deref())
                .unwrap_or("Uncategorized")
                .to_string(),
            brand: non_blank(product.brand.as_deref())
                .unwrap_or("N/A")
                .to_string(),
            stock: if product.stock_quantity > 0 {
                format!("{} in stock", product.stock_quantity)
            } else {
                "Out of stock".to_string()
            },
            in_stock: product.stock_quantity > 0,
            image_url: catalog.image_url(product),
        }
    }

    /// Views for a product listing, in order.
    #[must_use]
    pub fn list(products: &[Product], catalog: &CatalogService<'_>) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, catalog)).collect()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    /// Upper bound offered for the quantity input.
    pub max_quantity: i32,
    pub price: String,
    pub line_price: String,
    pub image_url: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: i64,
    /// Server-computed grand total, `None` when it could not be fetched.
    pub total: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build the cart view from the mirror.
    ///
    /// Line totals are recomputed from price and quantity; the grand total
    /// is the one the server reported.
    #[must_use]
    pub fn new(snapshot: &CartSnapshot, catalog: &CatalogService<'_>) -> Self {
        let summary = derive(&snapshot.items);

        let items = snapshot
            .items
            .iter()
            .zip(&summary.lines)
            .map(|(item, line)| CartItemView {
                id: item.id,
                product_id: item.product.id,
                name: item.product.name.clone(),
                category: non_blank(item.product.category.as_deref())
                    .unwrap_or("Uncategorized")
                    .to_string(),
                quantity: line.quantity,
                max_quantity: item.product.stock_quantity.max(line.quantity),
                price: line.unit_price.to_string(),
                line_price: line.line_total.to_string(),
                image_url: catalog.image_url(&item.product),
            })
            .collect();

        Self {
            items,
            item_count: summary.item_count,
            total: snapshot.total.map(|t| t.to_string()),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Admin order listing display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: OrderId,
    pub customer: String,
    pub date: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub total: String,
    pub shipping_address: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let customer = order.user.as_ref().map_or_else(
            || "Unknown customer".to_string(),
            |c| format!("{} ({})", c.full_name, c.email),
        );

        Self {
            id: order.id,
            customer,
            date: order.order_date.format("%d/%m/%Y").to_string(),
            status: order.status,
            status_label: order.status.label(),
            total: order.total_amount.to_string(),
            shipping_address: order.shipping_address.clone(),
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard counters display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub cards: Vec<(&'static str, String)>,
}

impl From<&DashboardStats> for StatsView {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            cards: vec![
                ("Total Users", stats.total_users.to_string()),
                ("Total Products", stats.total_products.to_string()),
                ("Total Orders", stats.total_orders.to_string()),
                ("Total Revenue", stats.total_revenue.to_string()),
                ("Pending Orders", stats.pending_orders.to_string()),
                ("Low Stock Items", stats.low_stock_products.to_string()),
            ],
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;
    use ecomweb_core::{CartItem, OrderCustomer};

    use super::*;
    use crate::api::RestClient;
    use crate::config::StorefrontConfig;

    fn client() -> RestClient {
        let config = StorefrontConfig::for_api_base("http://localhost:8080/api").unwrap();
        RestClient::new(&config).unwrap()
    }

    fn product(stock: i32) -> Product {
        Product {
            id: ProductId::new(42),
            name: "Kettle".to_string(),
            description: None,
            price: "1250.5".parse().unwrap(),
            stock_quantity: stock,
            category: Some(" ".to_string()),
            brand: Some("Prestige".to_string()),
            image_url: None,
            has_image: false,
        }
    }

    #[test]
    fn test_product_view_defaults() {
        let client = client();
        let catalog = CatalogService::new(&client, "placeholder.svg");

        let view = ProductView::new(&product(0), &catalog);
        assert_eq!(view.description, "No description available");
        assert_eq!(view.category, "Uncategorized");
        assert_eq!(view.price, "₹1,250.50");
        assert_eq!(view.stock, "Out of stock");
        assert!(!view.in_stock);
        assert_eq!(view.image_url, "placeholder.svg");
    }

    #[test]
    fn test_cart_view_line_totals_and_server_total() {
        let client = client();
        let catalog = CatalogService::new(&client, "placeholder.svg");
        let snapshot = CartSnapshot {
            items: vec![CartItem {
                id: CartItemId::new(1),
                quantity: 2,
                product: product(5),
            }],
            total: Some("2501".parse().unwrap()),
            version: 1,
        };

        let view = CartView::new(&snapshot, &catalog);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.items[0].line_price, "₹2,501.00");
        assert_eq!(view.items[0].max_quantity, 5);
        assert_eq!(view.total.as_deref(), Some("₹2,501.00"));
        assert!(!view.is_empty());
    }

    #[test]
    fn test_cart_view_unknown_total() {
        let client = client();
        let catalog = CatalogService::new(&client, "placeholder.svg");
        let view = CartView::new(&CartSnapshot::default(), &catalog);
        assert!(view.is_empty());
        assert_eq!(view.total, None);
    }

    #[test]
    fn test_order_view() {
        let order = Order {
            id: OrderId::new(9),
            user: Some(OrderCustomer {
                full_name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
            }),
            order_date: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            status: OrderStatus::Shipped,
            total_amount: "150000".parse().unwrap(),
            shipping_address: "12 MG Road".to_string(),
            payment_method: None,
        };

        let view = OrderView::from(&order);
        assert_eq!(view.customer, "Asha Rao (asha@example.com)");
        assert_eq!(view.date, "05/03/2024");
        assert_eq!(view.total, "₹1,50,000.00");
        assert_eq!(view.status_label, OrderStatus::Shipped.label());
    }

    #[test]
    fn test_stats_view() {
        let stats = DashboardStats {
            total_users: 4,
            pending_orders: 2,
            ..DashboardStats::default()
        };
        let view = StatsView::from(&stats);
        assert_eq!(view.cards.len(), 6);
        assert_eq!(view.cards[0], ("Total Users", "4".to_string()));
        assert_eq!(view.cards[3].1, "₹0.00");
    }
}
