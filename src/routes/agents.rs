use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::Api;
use crate::entities::{agent, project, property};
use crate::error::AppError;
use crate::resource::{
    find_model, not_found, parse_id, FormInput, Intent, MediaUrls, Resource, SearchField, Slot,
};
use crate::state::AppState;

pub struct Agents;

pub struct AgentDraft {
    name: String,
    email: String,
    phone: Option<String>,
}

#[async_trait]
impl Resource for Agents {
    type Entity = agent::Entity;
    type Model = agent::Model;
    type Draft = AgentDraft;

    const NAME: &'static str = "Agent";
    const PLURAL: &'static str = "agents";
    const KIND: &'static str = "agents";
    const AVATAR: Slot = Slot::Optional;

    fn id_column() -> agent::Column {
        agent::Column::Id
    }

    fn updated_at_column() -> agent::Column {
        agent::Column::UpdatedAt
    }

    fn id_of(model: &agent::Model) -> Uuid {
        model.id
    }

    fn label(model: &agent::Model) -> String {
        model.name.clone()
    }

    fn search_fields() -> Vec<SearchField<agent::Column>> {
        vec![
            SearchField::contains("name", agent::Column::Name),
            SearchField::contains("email", agent::Column::Email),
            SearchField::contains("phone", agent::Column::Phone),
        ]
    }

    fn media_urls(model: &agent::Model) -> MediaUrls {
        MediaUrls {
            avatar: model.image_url.clone(),
            ..Default::default()
        }
    }

    fn draft(input: &FormInput, _intent: Intent) -> Result<AgentDraft, AppError> {
        Ok(AgentDraft {
            name: input.required("name")?,
            email: input.required("email")?.to_lowercase(),
            phone: input.optional("phone"),
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &AgentDraft,
        existing: Option<&agent::Model>,
    ) -> Result<bool, DbErr> {
        let mut query = agent::Entity::find().filter(agent::Column::Email.eq(draft.email.as_str()));
        if let Some(existing) = existing {
            query = query.filter(agent::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: AgentDraft,
        media: &MediaUrls,
    ) -> Result<agent::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        agent::ActiveModel {
            id: Set(id),
            name: Set(draft.name),
            email: Set(draft.email),
            phone: Set(draft.phone),
            image_url: Set(media.avatar.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: agent::Model,
        draft: AgentDraft,
        media: &MediaUrls,
    ) -> Result<agent::Model, DbErr> {
        let mut active = existing.into_active_model();
        active.name = Set(draft.name);
        active.email = Set(draft.email);
        active.phone = Set(draft.phone);
        if let Some(url) = &media.avatar {
            active.image_url = Set(Some(url.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }

    async fn dependents<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<String>, DbErr> {
        let (projects, properties) = tokio::try_join!(
            project::Entity::find()
                .filter(project::Column::AgentId.eq(id))
                .count(db),
            property::Entity::find()
                .filter(property::Column::AgentId.eq(id))
                .count(db),
        )?;
        if projects + properties == 0 {
            return Ok(None);
        }
        Ok(Some(format!(
            "Agent still has {projects} project(s) and {properties} property(ies) assigned!"
        )))
    }
}

pub async fn ensure_agent<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), AppError> {
    let found = agent::Entity::find()
        .filter(agent::Column::Id.eq(id))
        .count(db)
        .await?;
    if found == 0 {
        return Err(AppError::NotFound("Agent not found!".to_string()));
    }
    Ok(())
}

/// Listings that belong to an agent and can be handed to another one.
#[async_trait]
pub trait AgentOwned: Resource {
    async fn set_agent<C: ConnectionTrait>(
        db: &C,
        model: Self::Model,
        agent_id: Uuid,
    ) -> Result<Self::Model, DbErr>;
}

pub async fn assign_agent<R: AgentOwned>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: FormInput,
) -> Result<Json<Value>, AppError> {
    let id = parse_id::<R>(&id)?;
    let agent_id = input.required_uuid("agentId")?;

    let txn = state.db.begin().await?;
    let model = find_model::<R, _>(&txn, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    ensure_agent(&txn, agent_id).await?;
    let model = R::set_agent(&txn, model, agent_id).await?;
    txn.commit().await?;

    tracing::info!(resource = R::NAME, %id, %agent_id, "agent reassigned");
    Ok(Json(json!({
        "message": format!("Agent assigned to {} '{}'!", R::NAME.to_lowercase(), R::label(&model)),
    })))
}

pub fn routes(api: Api) -> Api {
    api.crud::<Agents>("/api/agents", true)
}
