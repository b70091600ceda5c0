use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::Listing;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "properties")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub title: String,
    pub listing: Listing,
    pub owner: String,
    pub city: String,
    pub country: String,
    pub location: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub unit_no: Option<String>,
    pub floor: String,
    pub area: f64,
    pub price_per_sqft: Option<f64>,
    pub total_price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub parking_count: i32,
    pub map_url: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub pdf_url: Option<String>,
    pub blueprint_url: Option<String>,
    pub agent_id: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agent::Entity",
        from = "Column::AgentId",
        to = "super::agent::Column::Id",
        on_delete = "Restrict"
    )]
    Agent,
    #[sea_orm(has_many = "super::unit::Entity")]
    Unit,
}

impl Related<super::agent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
