use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Article::Articles)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Article::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Article::Title).string().not_null().unique_key())
                    .col(ColumnDef::new(Article::Description).text().not_null())
                    .col(ColumnDef::new(Article::Body).text().not_null())
                    .col(ColumnDef::new(Article::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Article::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Message::Messages)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::Name).string().not_null())
                    .col(ColumnDef::new(Message::Phone).string())
                    .col(ColumnDef::new(Message::Email).string().not_null())
                    .col(ColumnDef::new(Message::Text).text().not_null())
                    .col(ColumnDef::new(Message::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Message::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Messages).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Article::Articles).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Article {
    Articles,
    Id,
    Title,
    Description,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Message {
    Messages,
    Id,
    Name,
    Phone,
    Email,
    Text,
    CreatedAt,
    UpdatedAt,
}
