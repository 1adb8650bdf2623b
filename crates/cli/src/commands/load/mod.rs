//! Bulk load CSV exports into `PostgreSQL`.
//!
//! # Usage
//!
//! ```bash
//! shopchat load --dir ./data
//! ```
//!
//! Tables load in dependency order: distribution centers, products, users,
//! orders, inventory items, order items. Rows whose foreign keys point at
//! records that never made it into the database are dropped before insert.
//! Each batch is inserted in its own transaction; a failed batch is rolled
//! back and the rest of that table is abandoned.

mod records;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use sqlx::{PgPool, QueryBuilder};
use thiserror::Error;
use tracing::{error, info, warn};

use records::{
    DistributionCenterRecord, InventoryItemRecord, OrderItemRecord, OrderRecord, ProductRecord,
    TableRecord, UserRecord,
};

use super::{MissingDatabaseUrl, database_url};

/// Rows per insert transaction.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// `PostgreSQL` caps a single statement at this many bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

/// Errors that abort the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    MissingDatabaseUrl(#[from] MissingDatabaseUrl),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Outcome of loading one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub table: &'static str,
    /// Rows read from the file.
    pub read: usize,
    /// Rows dropped as malformed, duplicate, or orphaned.
    pub skipped: usize,
    /// Rows committed.
    pub inserted: u64,
    /// False if the file was missing or a batch failed.
    pub complete: bool,
}

impl LoadReport {
    const fn missing(table: &'static str) -> Self {
        Self {
            table,
            read: 0,
            skipped: 0,
            inserted: 0,
            complete: false,
        }
    }
}

/// Rows accepted from one CSV file.
#[derive(Debug)]
struct Parsed<T> {
    rows: Vec<T>,
    read: usize,
    skipped: usize,
}

/// Load every CSV file in `dir`.
///
/// # Errors
///
/// Returns an error if the directory is invalid, the database is unreachable,
/// or a CSV file cannot be opened. Failed batches are reported, not returned.
pub async fn run(dir: &Path, batch_size: usize) -> Result<Vec<LoadReport>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let url = database_url()?;
    let pool = shopchat_server::db::create_pool(&url).await?;
    info!(dir = %dir.display(), batch_size, "Connected to database, starting load");

    let loader = Loader {
        pool: &pool,
        dir,
        batch_size: batch_size.max(1),
    };

    let mut reports = Vec::with_capacity(6);

    reports.push(loader.load::<DistributionCenterRecord>(|_| true).await?);
    reports.push(loader.load::<ProductRecord>(|_| true).await?);

    let mut emails = HashSet::new();
    reports.push(
        loader
            .load::<UserRecord>(|user| emails.insert(user.email.clone()))
            .await?,
    );

    let user_ids = existing_ids(&pool, "users", "id").await?;
    info!(count = user_ids.len(), "Known user ids");
    reports.push(
        loader
            .load::<OrderRecord>(|order| user_ids.contains(&order.user_id))
            .await?,
    );

    let product_ids = existing_ids(&pool, "products", "id").await?;
    reports.push(
        loader
            .load::<InventoryItemRecord>(|item| product_ids.contains(&item.product_id))
            .await?,
    );

    let keys = OrderItemKeys {
        orders: existing_ids(&pool, "orders", "order_id").await?,
        users: user_ids,
        products: product_ids,
        inventory_items: existing_ids(&pool, "inventory_items", "id").await?,
    };
    info!(
        orders = keys.orders.len(),
        products = keys.products.len(),
        inventory_items = keys.inventory_items.len(),
        "Known order item keys"
    );
    reports.push(
        loader
            .load::<OrderItemRecord>(|item| keys.links(item))
            .await?,
    );

    pool.close().await;
    Ok(reports)
}

/// Foreign keys an order item must resolve against.
#[derive(Debug, Default)]
struct OrderItemKeys {
    orders: HashSet<i32>,
    users: HashSet<i32>,
    products: HashSet<i32>,
    inventory_items: HashSet<i32>,
}

impl OrderItemKeys {
    fn links(&self, item: &OrderItemRecord) -> bool {
        self.orders.contains(&item.order_id)
            && self.users.contains(&item.user_id)
            && self.products.contains(&item.product_id)
            && item
                .inventory_item_id
                .is_none_or(|id| self.inventory_items.contains(&id))
    }
}

struct Loader<'a> {
    pool: &'a PgPool,
    dir: &'a Path,
    batch_size: usize,
}

impl Loader<'_> {
    async fn load<T: TableRecord>(
        &self,
        keep: impl FnMut(&T) -> bool,
    ) -> Result<LoadReport, LoadError> {
        let path = self.dir.join(T::FILE);
        if !path.is_file() {
            warn!(table = T::TABLE, path = %path.display(), "CSV file not found, skipping table");
            return Ok(LoadReport::missing(T::TABLE));
        }

        info!(table = T::TABLE, path = %path.display(), "Loading table");
        let reader = csv::Reader::from_path(&path)?;
        let parsed = parse_rows(reader, keep);
        if parsed.skipped > 0 {
            info!(table = T::TABLE, skipped = parsed.skipped, "Dropped rows before insert");
        }

        let (inserted, complete) = insert_batches(self.pool, &parsed.rows, self.batch_size).await;

        Ok(LoadReport {
            table: T::TABLE,
            read: parsed.read,
            skipped: parsed.skipped,
            inserted,
            complete,
        })
    }
}

/// Deserialize every row, keeping those `keep` accepts.
fn parse_rows<T, R>(mut reader: csv::Reader<R>, mut keep: impl FnMut(&T) -> bool) -> Parsed<T>
where
    T: TableRecord,
    R: io::Read,
{
    let mut parsed = Parsed {
        rows: Vec::new(),
        read: 0,
        skipped: 0,
    };

    for (line, result) in reader.deserialize::<T>().enumerate() {
        parsed.read += 1;
        match result {
            Ok(row) if keep(&row) => parsed.rows.push(row),
            Ok(_) => parsed.skipped += 1,
            Err(e) => {
                warn!(table = T::TABLE, row = line + 1, error = %e, "Malformed row");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Insert rows in transactional batches. Returns rows committed and whether
/// every batch succeeded.
async fn insert_batches<T: TableRecord>(pool: &PgPool, rows: &[T], batch_size: usize) -> (u64, bool) {
    let mut inserted = 0;

    for (index, batch) in rows.chunks(batch_size).enumerate() {
        match insert_batch(pool, batch).await {
            Ok(count) => {
                inserted += count;
                info!(table = T::TABLE, batch = index + 1, rows = count, "Inserted batch");
            }
            Err(e) => {
                error!(
                    table = T::TABLE,
                    batch = index + 1,
                    error = %e,
                    "Batch failed, rolled back; stopping this table"
                );
                return (inserted, false);
            }
        }
    }

    info!(table = T::TABLE, inserted, "Table done");
    (inserted, true)
}

/// Insert one batch inside a transaction.
///
/// Dropping the transaction on error rolls it back.
async fn insert_batch<T: TableRecord>(pool: &PgPool, batch: &[T]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for statement_rows in batch.chunks(rows_per_statement(T::COLUMNS.len())) {
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        builder.push_values(statement_rows, |mut row, record| record.push_binds(&mut row));

        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

const fn rows_per_statement(columns: usize) -> usize {
    if columns == 0 {
        return 1;
    }
    let rows = MAX_BIND_PARAMS / columns;
    if rows == 0 { 1 } else { rows }
}

async fn existing_ids(
    pool: &PgPool,
    table: &'static str,
    column: &'static str,
) -> Result<HashSet<i32>, sqlx::Error> {
    let ids: Vec<i32> = sqlx::query_scalar(&format!("SELECT {column} FROM {table}"))
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().collect())
}
