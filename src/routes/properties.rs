use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::agents::{assign_agent, ensure_agent, AgentOwned};
use super::{Api, Verb};
use crate::entities::{agent, feature::FeatureKind, listing::Listing, property, unit};
use crate::error::AppError;
use crate::resource::{
    attach, base_expand, FeatureSlot, FormInput, Intent, MediaUrls, Resource, SearchField, Slot,
};

pub struct Properties;

pub struct PropertyDraft {
    title: String,
    listing: Listing,
    owner: String,
    city: String,
    country: String,
    location: String,
    property_type: String,
    unit_no: Option<String>,
    floor: String,
    area: f64,
    price_per_sqft: Option<f64>,
    total_price: f64,
    bedrooms: i32,
    bathrooms: i32,
    parking_count: i32,
    map_url: String,
    description: String,
    agent_id: Uuid,
}

pub(crate) fn read_listing(input: &FormInput) -> Result<Listing, AppError> {
    let raw = input.required("listing")?;
    Listing::parse(&raw)
        .ok_or_else(|| AppError::BadRequest("listing must be either sale or rent".to_string()))
}

#[async_trait]
impl Resource for Properties {
    type Entity = property::Entity;
    type Model = property::Model;
    type Draft = PropertyDraft;

    const NAME: &'static str = "Property";
    const PLURAL: &'static str = "properties";
    const KIND: &'static str = "properties";
    const GALLERY: Slot = Slot::Required;
    const FACT_SHEET: Slot = Slot::Optional;
    const BLUEPRINT: Slot = Slot::Optional;
    const FEATURES: &'static [FeatureSlot] = &[
        FeatureSlot {
            kind: FeatureKind::View,
            required: true,
        },
        FeatureSlot {
            kind: FeatureKind::Amenity,
            required: false,
        },
    ];

    fn id_column() -> property::Column {
        property::Column::Id
    }

    fn updated_at_column() -> property::Column {
        property::Column::UpdatedAt
    }

    fn id_of(model: &property::Model) -> Uuid {
        model.id
    }

    fn label(model: &property::Model) -> String {
        model.title.clone()
    }

    fn search_fields() -> Vec<SearchField<property::Column>> {
        vec![
            SearchField::contains("title", property::Column::Title),
            SearchField::contains("listing", property::Column::Listing),
            SearchField::contains("owner", property::Column::Owner),
            SearchField::contains("city", property::Column::City),
            SearchField::contains("country", property::Column::Country),
            SearchField::contains("location", property::Column::Location),
            SearchField::contains("type", property::Column::PropertyType),
            SearchField::contains("floor", property::Column::Floor),
            SearchField::at_least("minPrice", property::Column::TotalPrice),
            SearchField::at_most("maxPrice", property::Column::TotalPrice),
            SearchField::at_least("minArea", property::Column::Area),
            SearchField::at_most("maxArea", property::Column::Area),
            SearchField::at_least("bedrooms", property::Column::Bedrooms),
            SearchField::at_least("bathrooms", property::Column::Bathrooms),
        ]
    }

    fn media_urls(model: &property::Model) -> MediaUrls {
        MediaUrls {
            fact_sheet: model.pdf_url.clone(),
            blueprint: model.blueprint_url.clone(),
            ..Default::default()
        }
    }

    fn draft(input: &FormInput, _intent: Intent) -> Result<PropertyDraft, AppError> {
        Ok(PropertyDraft {
            title: input.required("title")?,
            listing: read_listing(input)?,
            owner: input.required("owner")?,
            city: input.required("city")?,
            country: input.required("country")?,
            location: input.required("location")?,
            property_type: input.required("type")?,
            unit_no: input.optional("unitNo"),
            floor: input.required("floor")?,
            area: input.required_number("area")?,
            price_per_sqft: input.number("pricePerSqft")?,
            total_price: input.required_number("totalPrice")?,
            bedrooms: input.required_number("bedrooms")?,
            bathrooms: input.required_number("bathrooms")?,
            parking_count: input.required_number("parkingCount")?,
            map_url: input.required("mapUrl")?,
            description: input.required("description")?,
            agent_id: input.required_uuid("agentId")?,
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &PropertyDraft,
        existing: Option<&property::Model>,
    ) -> Result<bool, DbErr> {
        let mut query =
            property::Entity::find().filter(property::Column::Title.eq(draft.title.as_str()));
        if let Some(existing) = existing {
            query = query.filter(property::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn check_references<C: ConnectionTrait>(
        db: &C,
        draft: &PropertyDraft,
        existing: Option<&property::Model>,
    ) -> Result<(), AppError> {
        ensure_agent(db, draft.agent_id).await?;
        let Some(existing) = existing.filter(|existing| existing.listing != draft.listing) else {
            return Ok(());
        };
        // Units keep the listing of their property.
        let units = unit::Entity::find()
            .filter(unit::Column::PropertyId.eq(existing.id))
            .filter(unit::Column::Listing.ne(draft.listing))
            .count(db)
            .await?;
        if units > 0 {
            return Err(AppError::BadRequest(format!(
                "Property '{}' still has {units} {} unit(s)!",
                existing.title,
                existing.listing.word()
            )));
        }
        Ok(())
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: PropertyDraft,
        media: &MediaUrls,
    ) -> Result<property::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        property::ActiveModel {
            id: Set(id),
            title: Set(draft.title),
            listing: Set(draft.listing),
            owner: Set(draft.owner),
            city: Set(draft.city),
            country: Set(draft.country),
            location: Set(draft.location),
            property_type: Set(draft.property_type),
            unit_no: Set(draft.unit_no),
            floor: Set(draft.floor),
            area: Set(draft.area),
            price_per_sqft: Set(draft.price_per_sqft),
            total_price: Set(draft.total_price),
            bedrooms: Set(draft.bedrooms),
            bathrooms: Set(draft.bathrooms),
            parking_count: Set(draft.parking_count),
            map_url: Set(draft.map_url),
            description: Set(draft.description),
            pdf_url: Set(media.fact_sheet.clone()),
            blueprint_url: Set(media.blueprint.clone()),
            agent_id: Set(draft.agent_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: property::Model,
        draft: PropertyDraft,
        media: &MediaUrls,
    ) -> Result<property::Model, DbErr> {
        let mut active = existing.into_active_model();
        active.title = Set(draft.title);
        active.listing = Set(draft.listing);
        active.owner = Set(draft.owner);
        active.city = Set(draft.city);
        active.country = Set(draft.country);
        active.location = Set(draft.location);
        active.property_type = Set(draft.property_type);
        active.unit_no = Set(draft.unit_no);
        active.floor = Set(draft.floor);
        active.area = Set(draft.area);
        active.price_per_sqft = Set(draft.price_per_sqft);
        active.total_price = Set(draft.total_price);
        active.bedrooms = Set(draft.bedrooms);
        active.bathrooms = Set(draft.bathrooms);
        active.parking_count = Set(draft.parking_count);
        active.map_url = Set(draft.map_url);
        active.description = Set(draft.description);
        active.agent_id = Set(draft.agent_id);
        if let Some(url) = &media.fact_sheet {
            active.pdf_url = Set(Some(url.clone()));
        }
        if let Some(url) = &media.blueprint {
            active.blueprint_url = Set(Some(url.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }

    async fn dependents<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<String>, DbErr> {
        let units = unit::Entity::find()
            .filter(unit::Column::PropertyId.eq(id))
            .count(db)
            .await?;
        Ok((units > 0).then(|| format!("Property still has {units} unit(s)!")))
    }

    async fn expand<C: ConnectionTrait>(db: &C, model: property::Model) -> Result<Value, AppError> {
        let mut value = base_expand::<Self, C>(db, &model).await?;
        let agent = agent::Entity::find_by_id(model.agent_id).one(db).await?;
        attach(&mut value, "agent", &agent)?;
        Ok(value)
    }
}

#[async_trait]
impl AgentOwned for Properties {
    async fn set_agent<C: ConnectionTrait>(
        db: &C,
        model: property::Model,
        agent_id: Uuid,
    ) -> Result<property::Model, DbErr> {
        let mut active = model.into_active_model();
        active.agent_id = Set(agent_id);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }
}

pub fn routes(api: Api) -> Api {
    api.crud::<Properties>("/api/properties", true).route(
        Verb::Patch,
        "/api/properties/{id}/agent",
        Properties::PLURAL,
        "Assign a property to another agent".to_string(),
        assign_agent::<Properties>,
    )
}
