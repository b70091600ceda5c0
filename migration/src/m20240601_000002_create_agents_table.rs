use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Agent::Agents)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Agent::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Agent::Name).string().not_null())
                    .col(ColumnDef::new(Agent::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Agent::Phone).string())
                    .col(ColumnDef::new(Agent::ImageUrl).string())
                    .col(ColumnDef::new(Agent::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Agent::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Agent::Agents).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Agent {
    Agents,
    Id,
    Name,
    Email,
    Phone,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}
