//! SeaORM entities for the catalog schema

pub mod author;
pub mod book;
pub mod category;
pub mod publisher;
pub mod user;
