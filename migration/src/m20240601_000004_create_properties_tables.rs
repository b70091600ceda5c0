use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Property::Properties)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Property::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Property::Title).string().not_null().unique_key())
                    .col(ColumnDef::new(Property::Listing).string().not_null())
                    .col(ColumnDef::new(Property::Owner).string().not_null())
                    .col(ColumnDef::new(Property::City).string().not_null())
                    .col(ColumnDef::new(Property::Country).string().not_null())
                    .col(ColumnDef::new(Property::Location).string().not_null())
                    .col(ColumnDef::new(Property::PropertyType).string().not_null())
                    .col(ColumnDef::new(Property::UnitNo).string())
                    .col(ColumnDef::new(Property::Floor).string().not_null())
                    .col(ColumnDef::new(Property::Area).double().not_null())
                    .col(ColumnDef::new(Property::PricePerSqft).double())
                    .col(ColumnDef::new(Property::TotalPrice).double().not_null())
                    .col(ColumnDef::new(Property::Bedrooms).integer().not_null())
                    .col(ColumnDef::new(Property::Bathrooms).integer().not_null())
                    .col(ColumnDef::new(Property::ParkingCount).integer().not_null())
                    .col(ColumnDef::new(Property::MapUrl).string().not_null())
                    .col(ColumnDef::new(Property::Description).text().not_null())
                    .col(ColumnDef::new(Property::PdfUrl).string())
                    .col(ColumnDef::new(Property::BlueprintUrl).string())
                    .col(ColumnDef::new(Property::AgentId).uuid().not_null())
                    .col(ColumnDef::new(Property::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Property::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_agent")
                            .from(Property::Properties, Property::AgentId)
                            .to(Agent::Agents, Agent::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Unit::Units)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Unit::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Unit::PropertyId).uuid().not_null())
                    .col(ColumnDef::new(Unit::Listing).string().not_null())
                    .col(ColumnDef::new(Unit::Title).string().not_null().unique_key())
                    .col(ColumnDef::new(Unit::PropertyType).string().not_null())
                    .col(ColumnDef::new(Unit::UnitNo).string().not_null())
                    .col(ColumnDef::new(Unit::Floor).string().not_null())
                    .col(ColumnDef::new(Unit::Area).double().not_null())
                    .col(ColumnDef::new(Unit::PricePerSqft).double())
                    .col(ColumnDef::new(Unit::TotalPrice).double())
                    .col(ColumnDef::new(Unit::RentPrice).double())
                    .col(ColumnDef::new(Unit::Bedrooms).integer().not_null())
                    .col(ColumnDef::new(Unit::Bathrooms).integer().not_null())
                    .col(ColumnDef::new(Unit::ParkingCount).integer().not_null())
                    .col(ColumnDef::new(Unit::Description).text().not_null())
                    .col(ColumnDef::new(Unit::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Unit::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_property")
                            .from(Unit::Units, Unit::PropertyId)
                            .to(Property::Properties, Property::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Unit::Units).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Property::Properties).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Property {
    Properties,
    Id,
    Title,
    Listing,
    Owner,
    City,
    Country,
    Location,
    PropertyType,
    UnitNo,
    Floor,
    Area,
    PricePerSqft,
    TotalPrice,
    Bedrooms,
    Bathrooms,
    ParkingCount,
    MapUrl,
    Description,
    PdfUrl,
    BlueprintUrl,
    AgentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Unit {
    Units,
    Id,
    PropertyId,
    Listing,
    Title,
    PropertyType,
    UnitNo,
    Floor,
    Area,
    PricePerSqft,
    TotalPrice,
    RentPrice,
    Bedrooms,
    Bathrooms,
    ParkingCount,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Agent {
    Agents,
    Id,
}
