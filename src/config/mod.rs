//! Configuration module for the sitebake build
//!
//! Provides types and parsing for `bake.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
