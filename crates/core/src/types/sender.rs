//! Who wrote a persisted chat message.

use serde::{Deserialize, Serialize};

/// Sender of a persisted message.
///
/// Only the customer and the assistant ever author stored messages. Tool
/// results live in the prompt for a single turn and are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "message_sender", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Assistant,
}
