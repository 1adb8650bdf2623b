//! shopchat server library.
//!
//! The chat API as a library, so the binary, the CLI and the integration
//! tests share one implementation.
//!
//! # Layout
//!
//! - [`services::chat`] - The turn orchestrator (two-pass completion protocol)
//! - [`tools`] - Tool-call directive parsing and execution
//! - [`completion`] / [`claude`] - Completion seam and its Claude implementation
//! - [`db`] - `PostgreSQL` repositories and the storage seams
//! - [`routes`] - Axum handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod tools;
