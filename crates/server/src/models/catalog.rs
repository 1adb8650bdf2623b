//! Catalog and order models.
//!
//! Products, orders and order items are loaded out-of-band. The assistant only
//! ever reads them, and only through the summaries below, which are also the
//! shapes handed to the model as tool output.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopchat_core::{DistributionCenterId, OrderId, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub retail_price: Decimal,
    pub department: Option<String>,
    pub sku: Option<String>,
    pub cost: Option<Decimal>,
    pub distribution_center_id: Option<DistributionCenterId>,
}

/// Product facts exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Decimal,
    pub department: Option<String>,
    pub sku: Option<String>,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name,
            category: product.category,
            brand: product.brand,
            price: product.retail_price,
            department: product.department,
            sku: product.sku,
        }
    }
}

/// One line of an order as exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemSummary {
    pub product_name: String,
    pub status: String,
    pub sale_price: Decimal,
}

/// Order facts exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub num_of_item: i32,
    pub items: Vec<LineItemSummary>,
}

impl OrderSummary {
    /// Sum of the sale prices of all line items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.sale_price).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_summary_from_product() {
        let product = Product {
            id: ProductId::new(9),
            name: "Classic Denim Jacket".to_string(),
            category: Some("Outerwear & Coats".to_string()),
            brand: Some("Levi's".to_string()),
            retail_price: Decimal::new(8950, 2),
            department: Some("Men".to_string()),
            sku: Some("SKU-9".to_string()),
            cost: Some(Decimal::new(4000, 2)),
            distribution_center_id: Some(DistributionCenterId::new(1)),
        };

        let summary = ProductSummary::from(product);
        assert_eq!(summary.product_id, ProductId::new(9));
        assert_eq!(summary.price, Decimal::new(8950, 2));
    }

    #[test]
    fn test_order_total_sums_items() {
        let summary = OrderSummary {
            order_id: OrderId::new(1),
            status: "Shipped".to_string(),
            created_at: None,
            shipped_at: None,
            delivered_at: None,
            returned_at: None,
            num_of_item: 2,
            items: vec![
                LineItemSummary {
                    product_name: "Socks".to_string(),
                    status: "Shipped".to_string(),
                    sale_price: Decimal::new(999, 2),
                },
                LineItemSummary {
                    product_name: "Cap".to_string(),
                    status: "Processing".to_string(),
                    sale_price: Decimal::new(1501, 2),
                },
            ],
        };

        assert_eq!(summary.total(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_price_serializes_as_string() {
        let item = LineItemSummary {
            product_name: "Socks".to_string(),
            status: "Complete".to_string(),
            sale_price: Decimal::new(999, 2),
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"sale_price\":\"9.99\""));
    }
}
