use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Api, Verb};
use crate::entities::{installment, project};
use crate::error::AppError;
use crate::resource::{FormInput, Intent, MediaUrls, Resource, SearchField};
use crate::state::AppState;

pub struct Installments;

pub struct InstallmentDraft {
    project_id: Option<Uuid>,
    title: String,
    percentage: f64,
}

#[async_trait]
impl Resource for Installments {
    type Entity = installment::Entity;
    type Model = installment::Model;
    type Draft = InstallmentDraft;

    const NAME: &'static str = "Installment";
    const PLURAL: &'static str = "installments";
    const KIND: &'static str = "installments";

    fn id_column() -> installment::Column {
        installment::Column::Id
    }

    fn updated_at_column() -> installment::Column {
        installment::Column::UpdatedAt
    }

    fn id_of(model: &installment::Model) -> Uuid {
        model.id
    }

    fn label(model: &installment::Model) -> String {
        model.title.clone()
    }

    fn search_fields() -> Vec<SearchField<installment::Column>> {
        vec![
            SearchField::contains("title", installment::Column::Title),
            SearchField::at_least("minPercentage", installment::Column::Percentage),
            SearchField::at_most("maxPercentage", installment::Column::Percentage),
        ]
    }

    fn parent_column() -> Option<installment::Column> {
        Some(installment::Column::ProjectId)
    }

    fn draft(input: &FormInput, intent: Intent) -> Result<InstallmentDraft, AppError> {
        let project_id = match intent.parent() {
            Some(parent) => Some(parent),
            None if intent.creating() => Some(input.required_uuid("projectId")?),
            None => input.uuid("projectId")?,
        };
        let percentage: f64 = input.required_number("percentage")?;
        if !(0.0..=100.0).contains(&percentage) {
            return Err(AppError::BadRequest(
                "percentage must be between 0 and 100".to_string(),
            ));
        }
        Ok(InstallmentDraft {
            project_id,
            title: input.required("title")?,
            percentage,
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &InstallmentDraft,
        existing: Option<&installment::Model>,
    ) -> Result<bool, DbErr> {
        let Some(project_id) = draft.project_id.or(existing.map(|e| e.project_id)) else {
            return Ok(false);
        };
        let mut query = installment::Entity::find()
            .filter(installment::Column::ProjectId.eq(project_id))
            .filter(installment::Column::Title.eq(draft.title.as_str()));
        if let Some(existing) = existing {
            query = query.filter(installment::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn check_references<C: ConnectionTrait>(
        db: &C,
        draft: &InstallmentDraft,
        _existing: Option<&installment::Model>,
    ) -> Result<(), AppError> {
        match draft.project_id {
            Some(project_id) => ensure_project(db, project_id).await,
            None => Ok(()),
        }
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: InstallmentDraft,
        _media: &MediaUrls,
    ) -> Result<installment::Model, DbErr> {
        let project_id = draft
            .project_id
            .ok_or_else(|| DbErr::Custom("installment without project".to_string()))?;
        let now = chrono::Utc::now().naive_utc();
        installment::ActiveModel {
            id: Set(id),
            project_id: Set(project_id),
            title: Set(draft.title),
            percentage: Set(draft.percentage),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: installment::Model,
        draft: InstallmentDraft,
        _media: &MediaUrls,
    ) -> Result<installment::Model, DbErr> {
        let mut active = existing.into_active_model();
        if let Some(project_id) = draft.project_id {
            active.project_id = Set(project_id);
        }
        active.title = Set(draft.title);
        active.percentage = Set(draft.percentage);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }
}

async fn ensure_project<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), AppError> {
    let found = project::Entity::find()
        .filter(project::Column::Id.eq(id))
        .count(db)
        .await?;
    if found == 0 {
        return Err(AppError::NotFound("Project not found!".to_string()));
    }
    Ok(())
}

/// `POST /api/projects/{id}/installments` with `{ "installments": [{ "title", "percentage" }] }`.
pub async fn create_batch(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    input: FormInput,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let project_id = Uuid::parse_str(project_id.trim())
        .map_err(|_| AppError::NotFound("Project not found!".to_string()))?;
    let items = match input.json().and_then(|body| body.get("installments")) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AppError::BadRequest("installments are required!".to_string())),
    };

    let intent = Intent::Create {
        parent: Some(project_id),
    };
    let mut drafts = Vec::with_capacity(items.len());
    for item in items {
        let draft = Installments::draft(&FormInput::from_json(item.clone())?, intent)?;
        if drafts
            .iter()
            .any(|other: &InstallmentDraft| other.title == draft.title)
        {
            return Err(AppError::Conflict(format!(
                "Installment '{}' is listed twice!",
                draft.title
            )));
        }
        drafts.push(draft);
    }

    let txn = state.db.begin().await?;
    ensure_project(&txn, project_id).await?;
    let count = drafts.len();
    for draft in drafts {
        if Installments::find_duplicate(&txn, &draft, None).await? {
            return Err(AppError::Conflict(format!(
                "Installment '{}' already exists!",
                draft.title
            )));
        }
        Installments::insert(&txn, Uuid::new_v4(), draft, &MediaUrls::default())
            .await
            .map_err(|e| AppError::from_db(e, Installments::NAME))?;
    }
    txn.commit().await?;

    tracing::info!(%project_id, count, "installments created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("{count} installments created!") })),
    ))
}

pub fn routes(api: Api) -> Api {
    api.crud::<Installments>("/api/installments", true)
        .nested::<Installments>("/api/projects/{id}/installments")
        .route(
            Verb::Post,
            "/api/projects/{id}/installments",
            Installments::PLURAL,
            "Create several installments for a project".to_string(),
            create_batch,
        )
}
