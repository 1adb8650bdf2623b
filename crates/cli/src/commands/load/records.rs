//! CSV row types and their column bindings.
//!
//! Each record mirrors one table from the initial migration. Empty cells
//! deserialize to `None` and are inserted as `NULL`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use sqlx::Postgres;
use sqlx::query_builder::Separated;

/// A CSV row that maps onto one database table.
pub trait TableRecord: DeserializeOwned {
    /// Target table.
    const TABLE: &'static str;
    /// Source file name inside the load directory.
    const FILE: &'static str;
    /// Insert columns, in bind order.
    const COLUMNS: &'static [&'static str];

    /// Bind this row's values, one per entry in [`Self::COLUMNS`].
    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>);
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionCenterRecord {
    pub id: i32,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TableRecord for DistributionCenterRecord {
    const TABLE: &'static str = "distribution_centers";
    const FILE: &'static str = "distribution_centers.csv";
    const COLUMNS: &'static [&'static str] = &["id", "name", "latitude", "longitude"];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.name.clone())
            .push_bind(self.latitude)
            .push_bind(self.longitude);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: i32,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub cost: Option<Decimal>,
    pub category: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    #[serde(deserialize_with = "decimal")]
    pub retail_price: Decimal,
    pub department: Option<String>,
    pub sku: Option<String>,
    pub distribution_center_id: Option<i32>,
}

impl TableRecord for ProductRecord {
    const TABLE: &'static str = "products";
    const FILE: &'static str = "products.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "cost",
        "category",
        "name",
        "brand",
        "retail_price",
        "department",
        "sku",
        "distribution_center_id",
    ];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.cost)
            .push_bind(self.category.clone())
            .push_bind(self.name.clone())
            .push_bind(self.brand.clone())
            .push_bind(self.retail_price)
            .push_bind(self.department.clone())
            .push_bind(self.sku.clone())
            .push_bind(self.distribution_center_id);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub traffic_source: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TableRecord for UserRecord {
    const TABLE: &'static str = "users";
    const FILE: &'static str = "users.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "email",
        "age",
        "gender",
        "state",
        "street_address",
        "postal_code",
        "city",
        "country",
        "latitude",
        "longitude",
        "traffic_source",
        "created_at",
    ];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.first_name.clone())
            .push_bind(self.last_name.clone())
            .push_bind(self.email.clone())
            .push_bind(self.age)
            .push_bind(self.gender.clone())
            .push_bind(self.state.clone())
            .push_bind(self.street_address.clone())
            .push_bind(self.postal_code.clone())
            .push_bind(self.city.clone())
            .push_bind(self.country.clone())
            .push_bind(self.latitude)
            .push_bind(self.longitude)
            .push_bind(self.traffic_source.clone())
            .push_bind(self.created_at);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub order_id: i32,
    pub user_id: i32,
    pub status: String,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub num_of_item: i32,
}

impl TableRecord for OrderRecord {
    const TABLE: &'static str = "orders";
    const FILE: &'static str = "orders.csv";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "user_id",
        "status",
        "gender",
        "created_at",
        "returned_at",
        "shipped_at",
        "delivered_at",
        "num_of_item",
    ];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.order_id)
            .push_bind(self.user_id)
            .push_bind(self.status.clone())
            .push_bind(self.gender.clone())
            .push_bind(self.created_at)
            .push_bind(self.returned_at)
            .push_bind(self.shipped_at)
            .push_bind(self.delivered_at)
            .push_bind(self.num_of_item);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryItemRecord {
    pub id: i32,
    pub product_id: i32,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub sold_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub cost: Option<Decimal>,
    pub product_category: Option<String>,
    pub product_name: Option<String>,
    pub product_brand: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub product_retail_price: Option<Decimal>,
    pub product_department: Option<String>,
    pub product_sku: Option<String>,
    pub product_distribution_center_id: Option<i32>,
}

impl TableRecord for InventoryItemRecord {
    const TABLE: &'static str = "inventory_items";
    const FILE: &'static str = "inventory_items.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "product_id",
        "created_at",
        "sold_at",
        "cost",
        "product_category",
        "product_name",
        "product_brand",
        "product_retail_price",
        "product_department",
        "product_sku",
        "product_distribution_center_id",
    ];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.product_id)
            .push_bind(self.created_at)
            .push_bind(self.sold_at)
            .push_bind(self.cost)
            .push_bind(self.product_category.clone())
            .push_bind(self.product_name.clone())
            .push_bind(self.product_brand.clone())
            .push_bind(self.product_retail_price)
            .push_bind(self.product_department.clone())
            .push_bind(self.product_sku.clone())
            .push_bind(self.product_distribution_center_id);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRecord {
    pub id: i32,
    pub order_id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub inventory_item_id: Option<i32>,
    pub status: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "decimal")]
    pub sale_price: Decimal,
}

impl TableRecord for OrderItemRecord {
    const TABLE: &'static str = "order_items";
    const FILE: &'static str = "order_items.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "order_id",
        "user_id",
        "product_id",
        "inventory_item_id",
        "status",
        "created_at",
        "shipped_at",
        "delivered_at",
        "returned_at",
        "sale_price",
    ];

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.order_id)
            .push_bind(self.user_id)
            .push_bind(self.product_id)
            .push_bind(self.inventory_item_id)
            .push_bind(self.status.clone())
            .push_bind(self.created_at)
            .push_bind(self.shipped_at)
            .push_bind(self.delivered_at)
            .push_bind(self.returned_at)
            .push_bind(self.sale_price);
    }
}

/// Parse an export timestamp.
///
/// Accepts RFC 3339, `2023-01-01 12:00:00+00:00` and the `2023-01-01 12:00:00 UTC`
/// form. Naive values are taken as UTC. Anything else is `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix("UTC").map_or(raw, str::trim_end);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|parsed| parsed.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw))
}

fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_decimal(&raw).map_err(D::Error::custom)
}

fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_decimal(value).map(Some).map_err(D::Error::custom),
    }
}
