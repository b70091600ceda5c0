use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered view/amenity title attached to a listing.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "features")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_kind: String,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    #[serde(skip_serializing)]
    pub kind: FeatureKind,
    pub title: String,
    pub position: i32,
}

#[derive(EnumIter, DeriveActiveEnum, Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    #[sea_orm(string_value = "view")]
    View,
    #[sea_orm(string_value = "amenity")]
    Amenity,
}

impl FeatureKind {
    /// Input field and response key holding the list.
    pub fn field(self) -> &'static str {
        match self {
            FeatureKind::View => "views",
            FeatureKind::Amenity => "amenities",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
