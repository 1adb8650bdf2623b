//! Domain models for the assistant.
//!
//! Models are validated domain objects; the `db` module owns the row types
//! and converts them into these.

pub mod catalog;
pub mod conversation;
pub mod user;

pub use catalog::{LineItemSummary, OrderSummary, Product, ProductSummary};
pub use conversation::{Conversation, Message};
pub use user::User;
