pub use sea_orm_migration::prelude::*;

mod m20251020_000000_bootstrap;
mod m20251020_000001_create_users;
mod m20251020_000002_create_projects;
mod m20251020_000003_create_project_taxonomy;
mod m20251020_000004_create_project_likes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000000_bootstrap::Migration),
            Box::new(m20251020_000001_create_users::Migration),
            Box::new(m20251020_000002_create_projects::Migration),
            Box::new(m20251020_000003_create_project_taxonomy::Migration),
            Box::new(m20251020_000004_create_project_likes::Migration),
        ]
    }
}
