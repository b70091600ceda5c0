use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a property or unit is offered for sale or for rent.
#[derive(EnumIter, DeriveActiveEnum, Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    #[sea_orm(string_value = "sale")]
    Sale,
    #[sea_orm(string_value = "rent")]
    Rent,
}

impl Listing {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" | "sales" => Some(Listing::Sale),
            "rent" | "rents" => Some(Listing::Rent),
            _ => None,
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            Listing::Sale => "sale",
            Listing::Rent => "rent",
        }
    }
}
