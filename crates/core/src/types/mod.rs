//! Core types for shopchat.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod sender;

pub use id::*;
pub use sender::MessageSender;
