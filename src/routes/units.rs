//! Sale and rent units. Both live in the `units` table; each route family
//! only ever sees rows of its own listing kind.

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Select, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::Api;
use crate::entities::{favorite, feature::FeatureKind, listing::Listing, property, unit};
use crate::error::AppError;
use crate::resource::{
    attach, base_expand, FeatureSlot, FormInput, Intent, MediaUrls, Resource, SearchField, Slot,
};

pub trait UnitListing: Send + Sync + 'static {
    const LISTING: Listing;
    const NAME: &'static str;
    const PLURAL: &'static str;
    const KIND: &'static str;
    /// Route segment, e.g. `sale-units`.
    const SEGMENT: &'static str;

    fn read_prices(input: &FormInput) -> Result<Prices, AppError>;
    fn price_fields() -> Vec<SearchField<unit::Column>>;
}

pub struct Sale;
pub struct Rent;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Prices {
    price_per_sqft: Option<f64>,
    total_price: Option<f64>,
    rent_price: Option<f64>,
}

impl UnitListing for Sale {
    const LISTING: Listing = Listing::Sale;
    const NAME: &'static str = "Sale unit";
    const PLURAL: &'static str = "sale units";
    const KIND: &'static str = "saleUnits";
    const SEGMENT: &'static str = "sale-units";

    fn read_prices(input: &FormInput) -> Result<Prices, AppError> {
        Ok(Prices {
            price_per_sqft: Some(input.required_number("pricePerSqft")?),
            total_price: Some(input.required_number("totalPrice")?),
            rent_price: None,
        })
    }

    fn price_fields() -> Vec<SearchField<unit::Column>> {
        vec![
            SearchField::at_least("minPrice", unit::Column::TotalPrice),
            SearchField::at_most("maxPrice", unit::Column::TotalPrice),
        ]
    }
}

impl UnitListing for Rent {
    const LISTING: Listing = Listing::Rent;
    const NAME: &'static str = "Rent unit";
    const PLURAL: &'static str = "rent units";
    const KIND: &'static str = "rentUnits";
    const SEGMENT: &'static str = "rent-units";

    fn read_prices(input: &FormInput) -> Result<Prices, AppError> {
        Ok(Prices {
            rent_price: Some(input.required_number("rentPrice")?),
            ..Default::default()
        })
    }

    fn price_fields() -> Vec<SearchField<unit::Column>> {
        vec![
            SearchField::at_least("minRent", unit::Column::RentPrice),
            SearchField::at_most("maxRent", unit::Column::RentPrice),
        ]
    }
}

pub struct Units<L>(PhantomData<L>);

pub struct UnitDraft {
    property_id: Option<Uuid>,
    title: String,
    property_type: String,
    unit_no: String,
    floor: String,
    area: f64,
    prices: Prices,
    bedrooms: i32,
    bathrooms: i32,
    parking_count: i32,
    description: String,
}

#[async_trait]
impl<L: UnitListing> Resource for Units<L> {
    type Entity = unit::Entity;
    type Model = unit::Model;
    type Draft = UnitDraft;

    const NAME: &'static str = L::NAME;
    const PLURAL: &'static str = L::PLURAL;
    const KIND: &'static str = L::KIND;
    const GALLERY: Slot = Slot::Required;
    const FEATURES: &'static [FeatureSlot] = &[FeatureSlot {
        kind: FeatureKind::View,
        required: true,
    }];

    fn id_column() -> unit::Column {
        unit::Column::Id
    }

    fn updated_at_column() -> unit::Column {
        unit::Column::UpdatedAt
    }

    fn id_of(model: &unit::Model) -> Uuid {
        model.id
    }

    fn label(model: &unit::Model) -> String {
        model.title.clone()
    }

    fn search_fields() -> Vec<SearchField<unit::Column>> {
        let mut fields = vec![
            SearchField::contains("title", unit::Column::Title),
            SearchField::contains("type", unit::Column::PropertyType),
            SearchField::contains("unitNo", unit::Column::UnitNo),
            SearchField::contains("floor", unit::Column::Floor),
            SearchField::at_least("minArea", unit::Column::Area),
            SearchField::at_most("maxArea", unit::Column::Area),
            SearchField::at_least("bedrooms", unit::Column::Bedrooms),
            SearchField::at_least("bathrooms", unit::Column::Bathrooms),
        ];
        fields.extend(L::price_fields());
        fields
    }

    fn parent_column() -> Option<unit::Column> {
        Some(unit::Column::PropertyId)
    }

    fn scope(select: Select<unit::Entity>) -> Select<unit::Entity> {
        select.filter(unit::Column::Listing.eq(L::LISTING))
    }

    fn draft(input: &FormInput, intent: Intent) -> Result<UnitDraft, AppError> {
        let property_id = match intent.parent() {
            Some(parent) => Some(parent),
            None if intent.creating() => Some(input.required_uuid("propertyId")?),
            None => input.uuid("propertyId")?,
        };
        Ok(UnitDraft {
            property_id,
            title: input.required("title")?,
            property_type: input.required("type")?,
            unit_no: input.required("unitNo")?,
            floor: input.required("floor")?,
            area: input.required_number("area")?,
            prices: L::read_prices(input)?,
            bedrooms: input.required_number("bedrooms")?,
            bathrooms: input.required_number("bathrooms")?,
            parking_count: input.required_number("parkingCount")?,
            description: input.required("description")?,
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &UnitDraft,
        existing: Option<&unit::Model>,
    ) -> Result<bool, DbErr> {
        // Titles are unique across both listing kinds.
        let mut query = unit::Entity::find().filter(unit::Column::Title.eq(draft.title.as_str()));
        if let Some(existing) = existing {
            query = query.filter(unit::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn check_references<C: ConnectionTrait>(
        db: &C,
        draft: &UnitDraft,
        _existing: Option<&unit::Model>,
    ) -> Result<(), AppError> {
        let Some(property_id) = draft.property_id else {
            return Ok(());
        };
        let parent = property::Entity::find_by_id(property_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found!".to_string()))?;
        if parent.listing != L::LISTING {
            return Err(AppError::BadRequest(format!(
                "Property '{}' is not listed for {}",
                parent.title,
                L::LISTING.word()
            )));
        }
        Ok(())
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: UnitDraft,
        _media: &MediaUrls,
    ) -> Result<unit::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let property_id = draft
            .property_id
            .ok_or_else(|| DbErr::Custom("unit without property".to_string()))?;
        unit::ActiveModel {
            id: Set(id),
            property_id: Set(property_id),
            listing: Set(L::LISTING),
            title: Set(draft.title),
            property_type: Set(draft.property_type),
            unit_no: Set(draft.unit_no),
            floor: Set(draft.floor),
            area: Set(draft.area),
            price_per_sqft: Set(draft.prices.price_per_sqft),
            total_price: Set(draft.prices.total_price),
            rent_price: Set(draft.prices.rent_price),
            bedrooms: Set(draft.bedrooms),
            bathrooms: Set(draft.bathrooms),
            parking_count: Set(draft.parking_count),
            description: Set(draft.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: unit::Model,
        draft: UnitDraft,
        _media: &MediaUrls,
    ) -> Result<unit::Model, DbErr> {
        let mut active = existing.into_active_model();
        if let Some(property_id) = draft.property_id {
            active.property_id = Set(property_id);
        }
        active.title = Set(draft.title);
        active.property_type = Set(draft.property_type);
        active.unit_no = Set(draft.unit_no);
        active.floor = Set(draft.floor);
        active.area = Set(draft.area);
        active.price_per_sqft = Set(draft.prices.price_per_sqft);
        active.total_price = Set(draft.prices.total_price);
        active.rent_price = Set(draft.prices.rent_price);
        active.bedrooms = Set(draft.bedrooms);
        active.bathrooms = Set(draft.bathrooms);
        active.parking_count = Set(draft.parking_count);
        active.description = Set(draft.description);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }

    async fn cascade<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        favorite::Entity::delete_many()
            .filter(favorite::Column::UnitId.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    async fn expand<C: ConnectionTrait>(db: &C, model: unit::Model) -> Result<Value, AppError> {
        let mut value = base_expand::<Self, C>(db, &model).await?;
        let parent = property::Entity::find_by_id(model.property_id).one(db).await?;
        let summary = parent.map(|p| {
            serde_json::json!({
                "id": p.id,
                "title": p.title,
                "city": p.city,
                "location": p.location,
            })
        });
        attach(&mut value, "property", &summary)?;
        Ok(value)
    }
}

fn unit_routes<L: UnitListing>(api: Api) -> Api {
    let nested = format!("/api/properties/{{id}}/{}", L::SEGMENT);
    api.crud::<Units<L>>(&format!("/api/{}", L::SEGMENT), true)
        .nested::<Units<L>>(&nested)
        .route(
            super::Verb::Post,
            &nested,
            L::PLURAL,
            format!("Create a {} under a property", L::NAME.to_lowercase()),
            crate::resource::handlers::create_nested::<Units<L>>,
        )
}

pub fn routes(api: Api) -> Api {
    let api = unit_routes::<Sale>(api);
    unit_routes::<Rent>(api)
}
