//! REST API client module for the ScriptHive backend.
//!
//! This module provides the `ApiClient` for logging in, resetting passwords,
//! and reading or editing users, projects, transactions and fee limits.
//!
//! Authenticated calls carry the session token as a bearer token.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
