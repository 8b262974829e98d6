//! # Catalog Service
//!
//! REST API for a library catalog (books, authors, categories, publishers),
//! protected by JWT bearer authentication.
//!
//! ## Architecture
//!
//! - **config**: process configuration, read from the environment once at startup
//! - **auth**: password hashing, token issuance/verification, request middleware
//! - **db**: SeaORM entities and migrations
//! - **api**: axum handlers and router with Swagger documentation

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use api::create_api_router;
pub use config::AppConfig;
pub use db::{init_database, DatabaseConfig};
