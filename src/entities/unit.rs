use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::Listing;

/// Sale and rent units share this table; `listing` tells them apart.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "units")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub property_id: Uuid,
    pub listing: Listing,
    #[sea_orm(unique)]
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub unit_no: String,
    pub floor: String,
    pub area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sqft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_price: Option<f64>,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub parking_count: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Restrict"
    )]
    Property,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorite,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
