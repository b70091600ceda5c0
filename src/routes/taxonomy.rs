//! Title-only lookup tables: categories, types, views and amenities.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::Api;
use crate::entities::{amenity, category, property_type, view};
use crate::error::AppError;
use crate::resource::{FormInput, Intent, MediaUrls, Resource, SearchField};
use crate::utils::capitalize;

macro_rules! title_resource {
    ($resource:ident, $entity:ident, $name:literal, $plural:literal) => {
        pub struct $resource;

        #[async_trait]
        impl Resource for $resource {
            type Entity = $entity::Entity;
            type Model = $entity::Model;
            type Draft = String;

            const NAME: &'static str = $name;
            const PLURAL: &'static str = $plural;
            const KIND: &'static str = $plural;

            fn id_column() -> $entity::Column {
                $entity::Column::Id
            }

            fn updated_at_column() -> $entity::Column {
                $entity::Column::UpdatedAt
            }

            fn id_of(model: &$entity::Model) -> Uuid {
                model.id
            }

            fn label(model: &$entity::Model) -> String {
                model.title.clone()
            }

            fn search_fields() -> Vec<SearchField<$entity::Column>> {
                vec![SearchField::contains("title", $entity::Column::Title)]
            }

            fn draft(input: &FormInput, _intent: Intent) -> Result<String, AppError> {
                Ok(capitalize(&input.required("title")?))
            }

            async fn find_duplicate<C: ConnectionTrait>(
                db: &C,
                title: &String,
                existing: Option<&$entity::Model>,
            ) -> Result<bool, DbErr> {
                let mut query = $entity::Entity::find().filter($entity::Column::Title.eq(title.as_str()));
                if let Some(existing) = existing {
                    query = query.filter($entity::Column::Id.ne(existing.id));
                }
                Ok(query.count(db).await? > 0)
            }

            async fn insert<C: ConnectionTrait>(
                db: &C,
                id: Uuid,
                title: String,
                _media: &MediaUrls,
            ) -> Result<$entity::Model, DbErr> {
                let now = chrono::Utc::now().naive_utc();
                $entity::ActiveModel {
                    id: Set(id),
                    title: Set(title),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(db)
                .await
            }

            async fn update<C: ConnectionTrait>(
                db: &C,
                existing: $entity::Model,
                title: String,
                _media: &MediaUrls,
            ) -> Result<$entity::Model, DbErr> {
                let mut active = existing.into_active_model();
                active.title = Set(title);
                active.updated_at = Set(chrono::Utc::now().naive_utc());
                active.update(db).await
            }
        }
    };
}

title_resource!(Categories, category, "Category", "categories");
title_resource!(Types, property_type, "Type", "types");
title_resource!(Views, view, "View", "views");
title_resource!(Amenities, amenity, "Amenity", "amenities");

pub fn routes(api: Api) -> Api {
    api.crud::<Categories>("/api/categories", true)
        .crud::<Types>("/api/types", true)
        .crud::<Views>("/api/views", true)
        .bulk_delete::<Views>("/api/views")
        .crud::<Amenities>("/api/amenities", true)
        .bulk_delete::<Amenities>("/api/amenities")
}
