//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_note_table;
mod m20250101_000002_create_note_favorite_table;
mod m20250101_000003_create_reaction_table;
mod m20250101_000004_create_note_history_table;
mod m20250101_000005_create_following_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_note_table::Migration),
            Box::new(m20250101_000002_create_note_favorite_table::Migration),
            Box::new(m20250101_000003_create_reaction_table::Migration),
            Box::new(m20250101_000004_create_note_history_table::Migration),
            Box::new(m20250101_000005_create_following_table::Migration),
        ]
    }
}
