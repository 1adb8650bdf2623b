//! Read-only catalog and order lookups backing the assistant's tools.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shopchat_core::{DistributionCenterId, OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{LineItemSummary, OrderSummary, Product};

/// How to find a single product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductQuery {
    /// Exact product ID.
    ById(ProductId),
    /// Case-insensitive substring of the product name. When several
    /// products match, the one with the lowest ID wins.
    ByName(String),
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category: Option<String>,
    brand: Option<String>,
    retail_price: Decimal,
    department: Option<String>,
    sku: Option<String>,
    cost: Option<Decimal>,
    distribution_center_id: Option<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            brand: row.brand,
            retail_price: row.retail_price,
            department: row.department,
            sku: row.sku,
            cost: row.cost,
            distribution_center_id: row.distribution_center_id.map(DistributionCenterId::new),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: i32,
    status: String,
    created_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    returned_at: Option<DateTime<Utc>>,
    num_of_item: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    product_name: Option<String>,
    status: String,
    sale_price: Decimal,
}

impl From<LineItemRow> for LineItemSummary {
    fn from(row: LineItemRow) -> Self {
        Self {
            product_name: row
                .product_name
                .unwrap_or_else(|| "Unknown product".to_string()),
            status: row.status,
            sale_price: row.sale_price,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

const PRODUCT_COLUMNS: &str =
    "id, name, category, brand, retail_price, department, sku, cost, distribution_center_id";

/// Repository for catalog and order lookups.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_product(
        &self,
        query: &ProductQuery,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = match query {
            ProductQuery::ById(id) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
                ))
                .bind(*id)
                .fetch_optional(self.pool)
                .await?
            }
            ProductQuery::ByName(name) => {
                // Plain substring match; `%` and `_` in names are literal
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE strpos(LOWER(name), LOWER($1)) > 0 \
                     ORDER BY id ASC \
                     LIMIT 1"
                ))
                .bind(name.as_str())
                .fetch_optional(self.pool)
                .await?
            }
        };

        Ok(row.map(Into::into))
    }

    /// Get an order with its line items, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        let Some(order) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, status, created_at, shipped_at, delivered_at,
                   returned_at, num_of_item
            FROM orders
            WHERE order_id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, LineItemRow>(
            r"
            SELECT p.name AS product_name, oi.status, oi.sale_price
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderSummary {
            order_id: OrderId::new(order.order_id),
            status: order.status,
            created_at: order.created_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            returned_at: order.returned_at,
            num_of_item: order.num_of_item,
            items: items.into_iter().map(Into::into).collect(),
        }))
    }
}
