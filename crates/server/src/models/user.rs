//! Customer accounts.
//!
//! Users are provisioned by the bulk loader and are read-only to the chat
//! subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopchat_core::UserId;

/// A customer who can chat with the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
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
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name used to greet the customer in the system prompt.
    ///
    /// Falls back to a neutral form of address when the loader stored an
    /// empty first name.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        let trimmed = self.first_name.trim();
        if trimmed.is_empty() { "there" } else { trimmed }
    }
}
