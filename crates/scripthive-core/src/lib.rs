//! Core library for the ScriptHive admin portal.
//!
//! Holds everything that is not terminal code: the REST client, the domain
//! models, the persisted session and the route guard, form validation and
//! configuration. The `scripthive` binary is its only consumer.

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod models;
pub mod requests;
pub mod utils;

pub use config::Config;
