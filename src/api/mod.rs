//! HTTP REST API
//!
//! - `common`: response envelope, validated JSON extractor, serde helpers
//! - `handlers`: request handlers for auth and the four catalog resources
//! - `router`: route table with Swagger documentation

pub mod common;
pub mod handlers;
pub mod router;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::TokenService;

pub use router::create_api_router;

/// Shared state for all handlers: persistence plus the token service.
#[derive(Clone)]
pub struct ApiContext {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
}
