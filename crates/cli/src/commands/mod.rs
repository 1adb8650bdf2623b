//! CLI subcommands.

pub mod load;
pub mod migrate;

use secrecy::SecretString;

/// Error returned when no database URL is configured.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: SHOPCHAT_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Database URL from `SHOPCHAT_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var("SHOPCHAT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
