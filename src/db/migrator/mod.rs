//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_authors;
mod m20250101_000003_create_categories;
mod m20250101_000004_create_publishers;
mod m20250101_000005_create_books;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_authors::Migration),
            Box::new(m20250101_000003_create_categories::Migration),
            Box::new(m20250101_000004_create_publishers::Migration),
            Box::new(m20250101_000005_create_books::Migration),
        ]
    }
}
