use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Owner columns are polymorphic (owner_kind, owner_id), so no foreign keys here.
        manager
            .create_table(
                Table::create()
                    .table(Image::Images)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Image::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Image::OwnerKind).string().not_null())
                    .col(ColumnDef::new(Image::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Image::Url).string().not_null())
                    .col(ColumnDef::new(Image::Position).integer().not_null())
                    .col(ColumnDef::new(Image::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_images_owner")
                    .table(Image::Images)
                    .col(Image::OwnerKind)
                    .col(Image::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Feature::Features)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feature::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feature::OwnerKind).string().not_null())
                    .col(ColumnDef::new(Feature::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Feature::Kind).string().not_null())
                    .col(ColumnDef::new(Feature::Title).string().not_null())
                    .col(ColumnDef::new(Feature::Position).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_features_owner")
                    .table(Feature::Features)
                    .col(Feature::OwnerKind)
                    .col(Feature::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feature::Features).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Image::Images).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Image {
    Images,
    Id,
    OwnerKind,
    OwnerId,
    Url,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Feature {
    Features,
    Id,
    OwnerKind,
    OwnerId,
    Kind,
    Title,
    Position,
}
