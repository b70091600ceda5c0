use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::Api;
use crate::entities::{favorite, unit, user};
use crate::error::AppError;
use crate::resource::{attach, base_expand, FormInput, Intent, MediaUrls, Resource, SearchField};

pub struct Users;

pub struct UserDraft {
    username: String,
    email: String,
    image_url: Option<String>,
}

#[async_trait]
impl Resource for Users {
    type Entity = user::Entity;
    type Model = user::Model;
    type Draft = UserDraft;

    const NAME: &'static str = "User";
    const PLURAL: &'static str = "users";
    const KIND: &'static str = "users";
    const CREATE_RETURNS_ENTITY: bool = true;

    fn id_column() -> user::Column {
        user::Column::Id
    }

    fn updated_at_column() -> user::Column {
        user::Column::UpdatedAt
    }

    fn id_of(model: &user::Model) -> Uuid {
        model.id
    }

    fn label(model: &user::Model) -> String {
        model.username.clone()
    }

    fn search_fields() -> Vec<SearchField<user::Column>> {
        vec![
            SearchField::contains("username", user::Column::Username),
            SearchField::contains("email", user::Column::Email),
        ]
    }

    /// Users sign in elsewhere; `imageUrl` is the profile picture URL they come with.
    fn draft(input: &FormInput, _intent: Intent) -> Result<UserDraft, AppError> {
        Ok(UserDraft {
            username: input.required("username")?,
            email: input.required("email")?.to_lowercase(),
            image_url: input.optional("imageUrl"),
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &UserDraft,
        existing: Option<&user::Model>,
    ) -> Result<bool, DbErr> {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(draft.email.as_str()));
        if let Some(existing) = existing {
            query = query.filter(user::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: UserDraft,
        _media: &MediaUrls,
    ) -> Result<user::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        user::ActiveModel {
            id: Set(id),
            username: Set(draft.username),
            email: Set(draft.email),
            image_url: Set(draft.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn cascade<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    async fn expand<C: ConnectionTrait>(db: &C, model: user::Model) -> Result<Value, AppError> {
        let mut value = base_expand::<Self, C>(db, &model).await?;
        let favorites: Vec<unit::Model> = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(model.id))
            .order_by_desc(favorite::Column::CreatedAt)
            .find_also_related(unit::Entity)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(_, unit)| unit)
            .collect();
        attach(&mut value, "favorites", &favorites)?;
        Ok(value)
    }
}

pub fn routes(api: Api) -> Api {
    api.crud::<Users>("/api/users", false)
}
