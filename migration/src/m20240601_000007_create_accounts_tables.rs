use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Users)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Username).string().not_null())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::ImageUrl).string())
                    .col(ColumnDef::new(User::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(User::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Admin::Admins)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Admin::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Admin::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Admin::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Admin::Password).string().not_null())
                    .col(
                        ColumnDef::new(Admin::Role)
                            .string()
                            .not_null()
                            .default("admin"),
                    )
                    .col(ColumnDef::new(Admin::ImageUrl).string())
                    .col(ColumnDef::new(Admin::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Admin::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Favorite::Favorites)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Favorite::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Favorite::UserId).uuid().not_null())
                    .col(ColumnDef::new(Favorite::UnitId).uuid().not_null())
                    .col(ColumnDef::new(Favorite::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_user")
                            .from(Favorite::Favorites, Favorite::UserId)
                            .to(User::Users, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_unit")
                            .from(Favorite::Favorites, Favorite::UnitId)
                            .to(Unit::Units, Unit::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_favorite_user_unit")
                    .table(Favorite::Favorites)
                    .col(Favorite::UserId)
                    .col(Favorite::UnitId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Favorite::Favorites).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admin::Admins).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Users).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Users,
    Id,
    Username,
    Email,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Admin {
    Admins,
    Id,
    Username,
    Email,
    Password,
    Role,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Favorite {
    Favorites,
    Id,
    UserId,
    UnitId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Unit {
    Units,
    Id,
}
