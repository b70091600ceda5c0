use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::agents::{assign_agent, ensure_agent, AgentOwned};
use super::{Api, Verb};
use crate::entities::{agent, feature::FeatureKind, installment, project};
use crate::error::AppError;
use crate::resource::{
    attach, base_expand, FeatureSlot, FormInput, Intent, MediaUrls, Resource, SearchField, Slot,
};

pub struct Projects;

pub struct ProjectDraft {
    title: String,
    owner: String,
    city: String,
    country: String,
    location: String,
    category: String,
    map_url: String,
    agent_id: Uuid,
    off_plan: Option<bool>,
    completion_date: Option<String>,
    description: Option<String>,
}

#[async_trait]
impl Resource for Projects {
    type Entity = project::Entity;
    type Model = project::Model;
    type Draft = ProjectDraft;

    const NAME: &'static str = "Project";
    const PLURAL: &'static str = "projects";
    const KIND: &'static str = "projects";
    const GALLERY: Slot = Slot::Required;
    const FACT_SHEET: Slot = Slot::Optional;
    const FEATURES: &'static [FeatureSlot] = &[FeatureSlot {
        kind: FeatureKind::Amenity,
        required: true,
    }];

    fn id_column() -> project::Column {
        project::Column::Id
    }

    fn updated_at_column() -> project::Column {
        project::Column::UpdatedAt
    }

    fn id_of(model: &project::Model) -> Uuid {
        model.id
    }

    fn label(model: &project::Model) -> String {
        model.title.clone()
    }

    fn search_fields() -> Vec<SearchField<project::Column>> {
        vec![
            SearchField::contains("title", project::Column::Title),
            SearchField::contains("owner", project::Column::Owner),
            SearchField::contains("city", project::Column::City),
            SearchField::contains("country", project::Column::Country),
            SearchField::contains("location", project::Column::Location),
            SearchField::contains("category", project::Column::Category),
            SearchField::contains("completionDate", project::Column::CompletionDate),
        ]
    }

    fn media_urls(model: &project::Model) -> MediaUrls {
        MediaUrls {
            fact_sheet: model.pdf_url.clone(),
            ..Default::default()
        }
    }

    fn draft(input: &FormInput, _intent: Intent) -> Result<ProjectDraft, AppError> {
        Ok(ProjectDraft {
            title: input.required("title")?,
            owner: input.required("owner")?,
            city: input.required("city")?,
            country: input.required("country")?,
            location: input.required("location")?,
            category: input.required("category")?,
            map_url: input.required("mapUrl")?,
            agent_id: input.required_uuid("agentId")?,
            off_plan: input.boolean("offPlan")?,
            completion_date: input.optional("completionDate"),
            description: input.optional("description"),
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &ProjectDraft,
        existing: Option<&project::Model>,
    ) -> Result<bool, DbErr> {
        let mut query = project::Entity::find().filter(project::Column::Title.eq(draft.title.as_str()));
        if let Some(existing) = existing {
            query = query.filter(project::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn check_references<C: ConnectionTrait>(
        db: &C,
        draft: &ProjectDraft,
        _existing: Option<&project::Model>,
    ) -> Result<(), AppError> {
        ensure_agent(db, draft.agent_id).await
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: ProjectDraft,
        media: &MediaUrls,
    ) -> Result<project::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        project::ActiveModel {
            id: Set(id),
            title: Set(draft.title),
            owner: Set(draft.owner),
            city: Set(draft.city),
            country: Set(draft.country),
            location: Set(draft.location),
            category: Set(draft.category),
            map_url: Set(draft.map_url),
            off_plan: Set(draft.off_plan),
            completion_date: Set(draft.completion_date),
            description: Set(draft.description),
            pdf_url: Set(media.fact_sheet.clone()),
            agent_id: Set(draft.agent_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: project::Model,
        draft: ProjectDraft,
        media: &MediaUrls,
    ) -> Result<project::Model, DbErr> {
        let mut active = existing.into_active_model();
        active.title = Set(draft.title);
        active.owner = Set(draft.owner);
        active.city = Set(draft.city);
        active.country = Set(draft.country);
        active.location = Set(draft.location);
        active.category = Set(draft.category);
        active.map_url = Set(draft.map_url);
        active.off_plan = Set(draft.off_plan);
        active.completion_date = Set(draft.completion_date);
        active.description = Set(draft.description);
        active.agent_id = Set(draft.agent_id);
        if let Some(url) = &media.fact_sheet {
            active.pdf_url = Set(Some(url.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }

    async fn cascade<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        installment::Entity::delete_many()
            .filter(installment::Column::ProjectId.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    async fn expand<C: ConnectionTrait>(db: &C, model: project::Model) -> Result<Value, AppError> {
        let mut value = base_expand::<Self, C>(db, &model).await?;
        let agent = agent::Entity::find_by_id(model.agent_id).one(db).await?;
        let installments = installment::Entity::find()
            .filter(installment::Column::ProjectId.eq(model.id))
            .order_by_asc(installment::Column::CreatedAt)
            .all(db)
            .await?;
        attach(&mut value, "agent", &agent)?;
        attach(&mut value, "installments", &installments)?;
        Ok(value)
    }
}

#[async_trait]
impl AgentOwned for Projects {
    async fn set_agent<C: ConnectionTrait>(
        db: &C,
        model: project::Model,
        agent_id: Uuid,
    ) -> Result<project::Model, DbErr> {
        let mut active = model.into_active_model();
        active.agent_id = Set(agent_id);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }
}

pub fn routes(api: Api) -> Api {
    api.crud::<Projects>("/api/projects", true).route(
        Verb::Patch,
        "/api/projects/{id}/agent",
        Projects::PLURAL,
        "Assign a project to another agent".to_string(),
        assign_agent::<Projects>,
    )
}
