//! shopchat core - shared types library.
//!
//! This crate provides common types used across all shopchat components:
//! - `server` - Chat API and turn orchestration
//! - `cli` - Command-line tools for migrations and bulk loading
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the message sender role

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
