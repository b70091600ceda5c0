use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::Api;
use crate::entities::article;
use crate::error::AppError;
use crate::resource::{FormInput, Intent, MediaUrls, Resource, SearchField, Slot};

pub struct Articles;

pub struct ArticleDraft {
    title: String,
    description: String,
    body: String,
}

#[async_trait]
impl Resource for Articles {
    type Entity = article::Entity;
    type Model = article::Model;
    type Draft = ArticleDraft;

    const NAME: &'static str = "Article";
    const PLURAL: &'static str = "articles";
    const KIND: &'static str = "articles";
    const GALLERY: Slot = Slot::Optional;

    fn id_column() -> article::Column {
        article::Column::Id
    }

    fn updated_at_column() -> article::Column {
        article::Column::UpdatedAt
    }

    fn id_of(model: &article::Model) -> Uuid {
        model.id
    }

    fn label(model: &article::Model) -> String {
        model.title.clone()
    }

    fn search_fields() -> Vec<SearchField<article::Column>> {
        vec![
            SearchField::contains("title", article::Column::Title),
            SearchField::contains("description", article::Column::Description),
            SearchField::contains("body", article::Column::Body),
        ]
    }

    fn draft(input: &FormInput, _intent: Intent) -> Result<ArticleDraft, AppError> {
        Ok(ArticleDraft {
            title: input.required("title")?,
            description: input.required("description")?,
            body: input.required("body")?,
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &ArticleDraft,
        existing: Option<&article::Model>,
    ) -> Result<bool, DbErr> {
        let mut query = article::Entity::find().filter(article::Column::Title.eq(draft.title.as_str()));
        if let Some(existing) = existing {
            query = query.filter(article::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: ArticleDraft,
        _media: &MediaUrls,
    ) -> Result<article::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        article::ActiveModel {
            id: Set(id),
            title: Set(draft.title),
            description: Set(draft.description),
            body: Set(draft.body),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: article::Model,
        draft: ArticleDraft,
        _media: &MediaUrls,
    ) -> Result<article::Model, DbErr> {
        let mut active = existing.into_active_model();
        active.title = Set(draft.title);
        active.description = Set(draft.description);
        active.body = Set(draft.body);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }
}

pub fn routes(api: Api) -> Api {
    api.crud::<Articles>("/api/articles", true)
}
