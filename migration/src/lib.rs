pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_taxonomy_tables;
mod m20240601_000002_create_agents_table;
mod m20240601_000003_create_projects_table;
mod m20240601_000004_create_properties_tables;
mod m20240601_000005_create_media_tables;
mod m20240601_000006_create_content_tables;
mod m20240601_000007_create_accounts_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_taxonomy_tables::Migration),
            Box::new(m20240601_000002_create_agents_table::Migration),
            Box::new(m20240601_000003_create_projects_table::Migration),
            Box::new(m20240601_000004_create_properties_tables::Migration),
            Box::new(m20240601_000005_create_media_tables::Migration),
            Box::new(m20240601_000006_create_content_tables::Migration),
            Box::new(m20240601_000007_create_accounts_tables::Migration),
        ]
    }
}
