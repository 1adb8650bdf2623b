//! Database operations for customer accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopchat_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Default page size for user listings.
pub const DEFAULT_USER_PAGE_SIZE: i64 = 100;

/// Upper bound for a single user listing page.
pub const MAX_USER_PAGE_SIZE: i64 = 1000;

/// Normalize a `(skip, limit)` page request.
///
/// Negative values become zero, so `limit = 0` yields an empty page. `limit`
/// is capped at [`MAX_USER_PAGE_SIZE`].
#[must_use]
pub const fn page_bounds(skip: i64, limit: i64) -> (i64, i64) {
    let skip = if skip < 0 { 0 } else { skip };
    let limit = if limit < 0 {
        0
    } else if limit > MAX_USER_PAGE_SIZE {
        MAX_USER_PAGE_SIZE
    } else {
        limit
    };
    (skip, limit)
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, age, gender, state, \
     street_address, postal_code, city, country, latitude, longitude, \
     traffic_source, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    age: Option<i32>,
    gender: Option<String>,
    state: Option<String>,
    street_address: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    traffic_source: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            age: row.age,
            gender: row.gender,
            state: row.state,
            street_address: row.street_address,
            postal_code: row.postal_code,
            city: row.city,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            traffic_source: row.traffic_source,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer lookups.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List users ordered by ID.
    ///
    /// The page is normalized by [`page_bounds`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let (skip, limit) = page_bounds(skip, limit);
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
