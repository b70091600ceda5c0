//! Generic CRUD over the store.
//!
//! Every entity exposed by the API implements [`Resource`]: which fields it
//! reads, its natural key, its media and feature slots, and how its rows are
//! written. The handlers in [`handlers`] drive the shared flow (validate,
//! stage media, write in one transaction, respond) for all of them.

pub mod form;
pub mod handlers;
pub mod search;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, ModelTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{feature, feature::FeatureKind, image};
use crate::error::AppError;
use crate::media::{MediaBatch, BLUEPRINTS};
use crate::utils::capitalize;

pub use form::{FormInput, Upload};
pub use search::{Op, SearchField};

pub type Column<R> = <<R as Resource>::Entity as EntityTrait>::Column;

pub const GALLERY_FIELD: &str = "images";
pub const FACT_SHEET_FIELD: &str = "pdf";
pub const BLUEPRINT_FIELD: &str = "bluePrint";
pub const AVATAR_FIELD: &str = "image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Off,
    Optional,
    /// Required when the record is created. Updates may omit it.
    Required,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSlot {
    pub kind: FeatureKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create { parent: Option<Uuid> },
    Update,
}

impl Intent {
    pub fn creating(self) -> bool {
        matches!(self, Intent::Create { .. })
    }

    pub fn parent(self) -> Option<Uuid> {
        match self {
            Intent::Create { parent } => parent,
            Intent::Update => None,
        }
    }
}

/// Media URLs stored in a record's own columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrls {
    pub fact_sheet: Option<String>,
    pub blueprint: Option<String>,
    pub avatar: Option<String>,
}

impl MediaUrls {
    /// Old URLs that `new` replaces.
    pub fn superseded_by(&self, new: &MediaUrls) -> Vec<String> {
        [
            (&self.fact_sheet, &new.fact_sheet),
            (&self.blueprint, &new.blueprint),
            (&self.avatar, &new.avatar),
        ]
        .into_iter()
        .filter_map(|(old, new)| match (old, new) {
            (Some(old), Some(new)) if old != new => Some(old.clone()),
            _ => None,
        })
        .collect()
    }
}

#[async_trait]
pub trait Resource: Sized + Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + Serialize
        + Clone
        + Send
        + Sync
        + 'static;
    type Draft: Send + Sync;

    /// Singular display name, used in messages.
    const NAME: &'static str;
    const PLURAL: &'static str;
    /// Owner tag for image and feature rows, and the media folder name.
    const KIND: &'static str;

    const GALLERY: Slot = Slot::Off;
    const FACT_SHEET: Slot = Slot::Off;
    const BLUEPRINT: Slot = Slot::Off;
    const AVATAR: Slot = Slot::Off;
    const FEATURES: &'static [FeatureSlot] = &[];
    const CREATE_RETURNS_ENTITY: bool = false;

    fn id_column() -> Column<Self>;
    fn updated_at_column() -> Column<Self>;
    fn id_of(model: &Self::Model) -> Uuid;
    fn label(model: &Self::Model) -> String;

    /// The first field is also matched by `q`.
    fn search_fields() -> Vec<SearchField<Column<Self>>>;

    /// Column holding the parent id for nested routes.
    fn parent_column() -> Option<Column<Self>> {
        None
    }

    /// Restricts every query, e.g. to one listing kind.
    fn scope(select: Select<Self::Entity>) -> Select<Self::Entity> {
        select
    }

    fn media_urls(_model: &Self::Model) -> MediaUrls {
        MediaUrls::default()
    }

    fn draft(input: &FormInput, intent: Intent) -> Result<Self::Draft, AppError>;

    /// Whether another record already holds the draft's natural key.
    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &Self::Draft,
        existing: Option<&Self::Model>,
    ) -> Result<bool, DbErr>;

    /// Rules that involve other rows. `existing` is the stored record on update.
    async fn check_references<C: ConnectionTrait>(
        _db: &C,
        _draft: &Self::Draft,
        _existing: Option<&Self::Model>,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: Self::Draft,
        media: &MediaUrls,
    ) -> Result<Self::Model, DbErr>;

    /// Full-field replace. Media left `None` keeps the stored URL.
    /// Resources without an update route keep the default.
    async fn update<C: ConnectionTrait>(
        _db: &C,
        _existing: Self::Model,
        _draft: Self::Draft,
        _media: &MediaUrls,
    ) -> Result<Self::Model, DbErr> {
        Err(DbErr::Custom(format!("{} records are not updated in place", Self::NAME)))
    }

    /// Reason the record can't be deleted yet, if any.
    async fn dependents<C: ConnectionTrait>(_db: &C, _id: Uuid) -> Result<Option<String>, DbErr> {
        Ok(None)
    }

    /// Rows removed together with the record.
    async fn cascade<C: ConnectionTrait>(_db: &C, _id: Uuid) -> Result<(), DbErr> {
        Ok(())
    }

    async fn expand<C: ConnectionTrait>(db: &C, model: Self::Model) -> Result<Value, AppError> {
        base_expand::<Self, C>(db, &model).await
    }
}

pub fn not_found<R: Resource>() -> AppError {
    AppError::NotFound(format!("{} not found!", R::NAME))
}

/// Malformed ids can't match a row, so they are reported as not found.
pub fn parse_id<R: Resource>(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found::<R>())
}

pub async fn find_model<R: Resource, C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<R::Model>, DbErr> {
    R::scope(R::Entity::find())
        .filter(R::id_column().eq(id))
        .one(db)
        .await
}

/// The record as JSON with its gallery and feature lists attached.
pub async fn base_expand<R: Resource, C: ConnectionTrait>(
    db: &C,
    model: &R::Model,
) -> Result<Value, AppError> {
    let mut value = to_json(model)?;
    let id = R::id_of(model);
    if R::GALLERY != Slot::Off {
        let images = image::Entity::find()
            .filter(image::Column::OwnerKind.eq(R::KIND))
            .filter(image::Column::OwnerId.eq(id))
            .order_by_asc(image::Column::Position)
            .all(db)
            .await?;
        attach(&mut value, "images", &images)?;
    }
    for slot in R::FEATURES {
        let features = feature::Entity::find()
            .filter(feature::Column::OwnerKind.eq(R::KIND))
            .filter(feature::Column::OwnerId.eq(id))
            .filter(feature::Column::Kind.eq(slot.kind))
            .order_by_asc(feature::Column::Position)
            .all(db)
            .await?;
        attach(&mut value, slot.kind.field(), &features)?;
    }
    Ok(value)
}

pub fn to_json<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("serialization failed: {e}")))
}

pub fn attach<T: Serialize>(value: &mut Value, key: &str, child: &T) -> Result<(), AppError> {
    if let Value::Object(map) = value {
        map.insert(key.to_string(), to_json(child)?);
    }
    Ok(())
}

/// Feature lists read from the input. Optional lists absent from an update are skipped.
pub fn read_features<R: Resource>(
    input: &FormInput,
    intent: Intent,
) -> Result<Vec<(FeatureKind, Vec<String>)>, AppError> {
    let mut lists = Vec::new();
    for slot in R::FEATURES {
        let field = slot.kind.field();
        if !slot.required && !intent.creating() && !input.has(field) {
            continue;
        }
        let mut titles: Vec<String> = Vec::new();
        for title in input.list(field) {
            let title = capitalize(&title);
            if !titles.contains(&title) {
                titles.push(title);
            }
        }
        if slot.required && titles.is_empty() {
            return Err(AppError::BadRequest(format!("{field} are required!")));
        }
        lists.push((slot.kind, titles));
    }
    Ok(lists)
}

/// Uploads matched to a resource's media slots, before anything touches disk.
pub struct PendingMedia<'a> {
    gallery: Vec<&'a Upload>,
    fact_sheet: Option<&'a Upload>,
    blueprint: Option<&'a Upload>,
    avatar: Option<&'a Upload>,
}

pub struct StagedMedia {
    /// Gallery URLs in upload order; empty when no new gallery was sent.
    pub gallery: Vec<String>,
    pub urls: MediaUrls,
}

impl<'a> PendingMedia<'a> {
    pub fn collect<R: Resource>(input: &'a FormInput, intent: Intent) -> Result<Self, AppError> {
        let gallery: Vec<&Upload> = match R::GALLERY {
            Slot::Off => Vec::new(),
            _ => input.uploads(GALLERY_FIELD).collect(),
        };
        if R::GALLERY == Slot::Required && intent.creating() && gallery.is_empty() {
            return Err(AppError::BadRequest("At least one image required!".to_string()));
        }
        if gallery.iter().any(|upload| !upload.is_image()) {
            return Err(AppError::BadRequest("Only image files are allowed!".to_string()));
        }

        let pending = Self {
            gallery,
            fact_sheet: single(input, R::FACT_SHEET, FACT_SHEET_FIELD, intent)?,
            blueprint: single(input, R::BLUEPRINT, BLUEPRINT_FIELD, intent)?,
            avatar: single(input, R::AVATAR, AVATAR_FIELD, intent)?,
        };
        if pending.fact_sheet.is_some_and(|upload| !upload.is_pdf()) {
            return Err(AppError::BadRequest("Only PDF files are allowed!".to_string()));
        }
        if [pending.blueprint, pending.avatar]
            .into_iter()
            .flatten()
            .any(|upload| !upload.is_image())
        {
            return Err(AppError::BadRequest("Only image files are allowed!".to_string()));
        }
        Ok(pending)
    }

    pub async fn stage(
        self,
        batch: &mut MediaBatch,
        kind: &str,
        owner: Uuid,
    ) -> Result<StagedMedia, AppError> {
        let mut gallery = Vec::with_capacity(self.gallery.len());
        for upload in self.gallery {
            gallery.push(batch.stage_image(kind, owner, upload.data.clone()).await?);
        }
        let mut urls = MediaUrls::default();
        if let Some(upload) = self.fact_sheet {
            urls.fact_sheet = Some(batch.stage_pdf(owner, upload.data.clone()).await?);
        }
        if let Some(upload) = self.blueprint {
            urls.blueprint = Some(batch.stage_image(BLUEPRINTS, owner, upload.data.clone()).await?);
        }
        if let Some(upload) = self.avatar {
            urls.avatar = Some(batch.stage_image(kind, owner, upload.data.clone()).await?);
        }
        Ok(StagedMedia { gallery, urls })
    }
}

fn single<'a>(
    input: &'a FormInput,
    slot: Slot,
    field: &str,
    intent: Intent,
) -> Result<Option<&'a Upload>, AppError> {
    if slot == Slot::Off {
        return Ok(None);
    }
    let upload = input.upload(field);
    if slot == Slot::Required && intent.creating() && upload.is_none() {
        return Err(AppError::BadRequest(format!("{field} is required!")));
    }
    Ok(upload)
}

/// Replaces a record's gallery rows and returns the URLs that were dropped.
pub async fn replace_gallery<C: ConnectionTrait>(
    db: &C,
    kind: &str,
    owner: Uuid,
    urls: &[String],
) -> Result<Vec<String>, DbErr> {
    let old = image::Entity::find()
        .filter(image::Column::OwnerKind.eq(kind))
        .filter(image::Column::OwnerId.eq(owner))
        .all(db)
        .await?;
    image::Entity::delete_many()
        .filter(image::Column::OwnerKind.eq(kind))
        .filter(image::Column::OwnerId.eq(owner))
        .exec(db)
        .await?;

    if !urls.is_empty() {
        let now = chrono::Utc::now().naive_utc();
        let rows = urls.iter().enumerate().map(|(position, url)| image::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_kind: Set(kind.to_string()),
            owner_id: Set(owner),
            url: Set(url.clone()),
            position: Set(position as i32),
            created_at: Set(now),
        });
        image::Entity::insert_many(rows).exec_without_returning(db).await?;
    }

    Ok(old
        .into_iter()
        .map(|image| image.url)
        .filter(|url| !urls.contains(url))
        .collect())
}

pub async fn replace_features<C: ConnectionTrait>(
    db: &C,
    kind: &str,
    owner: Uuid,
    feature_kind: FeatureKind,
    titles: &[String],
) -> Result<(), DbErr> {
    feature::Entity::delete_many()
        .filter(feature::Column::OwnerKind.eq(kind))
        .filter(feature::Column::OwnerId.eq(owner))
        .filter(feature::Column::Kind.eq(feature_kind))
        .exec(db)
        .await?;

    if !titles.is_empty() {
        let rows = titles.iter().enumerate().map(|(position, title)| feature::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_kind: Set(kind.to_string()),
            owner_id: Set(owner),
            kind: Set(feature_kind),
            title: Set(title.clone()),
            position: Set(position as i32),
        });
        feature::Entity::insert_many(rows).exec_without_returning(db).await?;
    }
    Ok(())
}

/// Deletes image and feature rows owned by a record.
pub async fn remove_children<C: ConnectionTrait>(db: &C, kind: &str, owner: Uuid) -> Result<(), DbErr> {
    image::Entity::delete_many()
        .filter(image::Column::OwnerKind.eq(kind))
        .filter(image::Column::OwnerId.eq(owner))
        .exec(db)
        .await?;
    feature::Entity::delete_many()
        .filter(feature::Column::OwnerKind.eq(kind))
        .filter(feature::Column::OwnerId.eq(owner))
        .exec(db)
        .await?;
    Ok(())
}
