//! Database migrations.

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_followers_table;
mod m20250101_000003_create_posts_table;
mod m20250101_000004_create_comments_table;
mod m20250101_000005_create_user_invitations_table;

/// Migrator applying every schema migration in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_followers_table::Migration),
            Box::new(m20250101_000003_create_posts_table::Migration),
            Box::new(m20250101_000004_create_comments_table::Migration),
            Box::new(m20250101_000005_create_user_invitations_table::Migration),
        ]
    }
}
