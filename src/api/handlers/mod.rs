//! REST API request handlers

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod health;
pub mod publishers;
