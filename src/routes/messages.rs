use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use uuid::Uuid;

use super::Api;
use crate::entities::message;
use crate::error::AppError;
use crate::resource::{FormInput, Intent, MediaUrls, Resource, SearchField};

pub struct Messages;

pub struct MessageDraft {
    name: String,
    phone: Option<String>,
    email: String,
    text: String,
}

#[async_trait]
impl Resource for Messages {
    type Entity = message::Entity;
    type Model = message::Model;
    type Draft = MessageDraft;

    const NAME: &'static str = "Message";
    const PLURAL: &'static str = "messages";
    const KIND: &'static str = "messages";

    fn id_column() -> message::Column {
        message::Column::Id
    }

    fn updated_at_column() -> message::Column {
        message::Column::UpdatedAt
    }

    fn id_of(model: &message::Model) -> Uuid {
        model.id
    }

    fn label(model: &message::Model) -> String {
        format!("from {}", model.name)
    }

    fn search_fields() -> Vec<SearchField<message::Column>> {
        vec![
            SearchField::contains("name", message::Column::Name),
            SearchField::contains("email", message::Column::Email),
            SearchField::contains("phone", message::Column::Phone),
            SearchField::contains("text", message::Column::Text),
        ]
    }

    fn draft(input: &FormInput, _intent: Intent) -> Result<MessageDraft, AppError> {
        Ok(MessageDraft {
            name: input.required("name")?,
            phone: input.optional("phone"),
            email: input.required("email")?,
            text: input.required("text")?,
        })
    }

    /// Visitors may send the same message twice.
    async fn find_duplicate<C: ConnectionTrait>(
        _db: &C,
        _draft: &MessageDraft,
        _existing: Option<&message::Model>,
    ) -> Result<bool, DbErr> {
        Ok(false)
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: MessageDraft,
        _media: &MediaUrls,
    ) -> Result<message::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        message::ActiveModel {
            id: Set(id),
            name: Set(draft.name),
            phone: Set(draft.phone),
            email: Set(draft.email),
            text: Set(draft.text),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }
}

pub fn routes(api: Api) -> Api {
    api.crud::<Messages>("/api/messages", false)
        .bulk_delete::<Messages>("/api/messages")
}
