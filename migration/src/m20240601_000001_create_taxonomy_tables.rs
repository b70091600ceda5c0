use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Title-only lookup tables share the same shape.
const TABLES: [&str; 4] = ["categories", "property_types", "views", "amenities"];

fn title_table(name: &str) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(name))
        .if_not_exists()
        .col(
            ColumnDef::new(Lookup::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Lookup::Title).string().not_null().unique_key())
        .col(ColumnDef::new(Lookup::CreatedAt).timestamp().not_null())
        .col(ColumnDef::new(Lookup::UpdatedAt).timestamp().not_null())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in TABLES {
            manager.create_table(title_table(name)).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in TABLES.iter().rev() {
            manager
                .drop_table(Table::drop().table(Alias::new(*name)).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Lookup {
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
}
