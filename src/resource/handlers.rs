use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait};
use serde_json::{json, Value};
use uuid::Uuid;

use super::search::{build_condition, take_limit, DEFAULT_LIMIT};
use super::{
    find_model, not_found, parse_id, read_features, remove_children, replace_features,
    replace_gallery, FormInput, Intent, PendingMedia, Resource,
};
use crate::error::AppError;
use crate::state::AppState;

fn duplicate<R: Resource>() -> AppError {
    AppError::Conflict(format!("{} already exists!", R::NAME))
}

fn none_found<R: Resource>() -> AppError {
    AppError::NotFound(format!("No {} found!", R::PLURAL))
}

fn message(text: String) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    input: FormInput,
) -> Result<Response, AppError> {
    create_record::<R>(&state, input, None).await
}

pub async fn create_nested<R: Resource>(
    State(state): State<AppState>,
    Path(parent): Path<String>,
    input: FormInput,
) -> Result<Response, AppError> {
    let parent = Uuid::parse_str(parent.trim())
        .map_err(|_| AppError::NotFound("Parent record not found!".to_string()))?;
    create_record::<R>(&state, input, Some(parent)).await
}

async fn create_record<R: Resource>(
    state: &AppState,
    input: FormInput,
    parent: Option<Uuid>,
) -> Result<Response, AppError> {
    let intent = Intent::Create { parent };
    let draft = R::draft(&input, intent)?;
    let features = read_features::<R>(&input, intent)?;
    let pending = PendingMedia::collect::<R>(&input, intent)?;
    let id = Uuid::new_v4();

    let mut batch = state.media.batch();
    let result = async {
        let staged = pending.stage(&mut batch, R::KIND, id).await?;
        let txn = state.db.begin().await?;
        if R::find_duplicate(&txn, &draft, None).await? {
            return Err(duplicate::<R>());
        }
        R::check_references(&txn, &draft, None).await?;
        let model = R::insert(&txn, id, draft, &staged.urls)
            .await
            .map_err(|e| AppError::from_db(e, R::NAME))?;
        replace_gallery(&txn, R::KIND, id, &staged.gallery).await?;
        for (kind, titles) in &features {
            replace_features(&txn, R::KIND, id, *kind, titles).await?;
        }
        batch.promote().await?;
        txn.commit().await?;
        batch.keep();
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match result {
        Ok(model) => {
            batch.finish().await;
            model
        }
        Err(e) => {
            batch.discard().await;
            return Err(e);
        }
    };

    tracing::info!(resource = R::NAME, %id, "record created");
    if R::CREATE_RETURNS_ENTITY {
        let body = R::expand(&state.db, model).await?;
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    }
    let text = format!("{} '{}' created!", R::NAME, R::label(&model));
    Ok((StatusCode::CREATED, message(text)).into_response())
}

pub async fn show<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id::<R>(&id)?;
    let model = find_model::<R, _>(&state.db, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    Ok(Json(R::expand(&state.db, model).await?))
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    list_scoped::<R>(&state, None, params).await
}

pub async fn list_nested<R: Resource>(
    State(state): State<AppState>,
    Path(parent): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let parent = Uuid::parse_str(parent.trim()).map_err(|_| none_found::<R>())?;
    list_scoped::<R>(&state, Some(parent), params).await
}

async fn list_scoped<R: Resource>(
    state: &AppState,
    parent: Option<Uuid>,
    mut params: HashMap<String, String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let limit = take_limit(&mut params)?;
    let mut query = R::scope(R::Entity::find()).order_by_desc(R::updated_at_column());
    if let (Some(parent), Some(column)) = (parent, R::parent_column()) {
        query = query.filter(column.eq(parent));
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let models = query.all(&state.db).await?;
    expand_all::<R>(state, models).await
}

pub async fn search<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    search_scoped::<R>(&state, None, params).await
}

pub async fn search_nested<R: Resource>(
    State(state): State<AppState>,
    Path(parent): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let parent = Uuid::parse_str(parent.trim()).map_err(|_| none_found::<R>())?;
    search_scoped::<R>(&state, Some(parent), params).await
}

async fn search_scoped<R: Resource>(
    state: &AppState,
    parent: Option<Uuid>,
    mut params: HashMap<String, String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let limit = take_limit(&mut params)?.unwrap_or(DEFAULT_LIMIT);
    let condition = build_condition(&R::search_fields(), &params)?;
    let mut query = R::scope(R::Entity::find())
        .filter(condition)
        .order_by_desc(R::updated_at_column())
        .limit(limit);
    if let (Some(parent), Some(column)) = (parent, R::parent_column()) {
        query = query.filter(column.eq(parent));
    }
    let models = query.all(&state.db).await?;
    expand_all::<R>(state, models).await
}

async fn expand_all<R: Resource>(
    state: &AppState,
    models: Vec<R::Model>,
) -> Result<Json<Vec<Value>>, AppError> {
    if models.is_empty() {
        return Err(none_found::<R>());
    }
    let mut out = Vec::with_capacity(models.len());
    for model in models {
        out.push(R::expand(&state.db, model).await?);
    }
    Ok(Json(out))
}

pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: FormInput,
) -> Result<Json<Value>, AppError> {
    let id = parse_id::<R>(&id)?;
    let intent = Intent::Update;
    let draft = R::draft(&input, intent)?;
    let features = read_features::<R>(&input, intent)?;
    let pending = PendingMedia::collect::<R>(&input, intent)?;
    let existing = find_model::<R, _>(&state.db, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    let old_urls = R::media_urls(&existing);

    let mut batch = state.media.batch();
    let result = async {
        let staged = pending.stage(&mut batch, R::KIND, id).await?;
        let txn = state.db.begin().await?;
        if R::find_duplicate(&txn, &draft, Some(&existing)).await? {
            return Err(duplicate::<R>());
        }
        R::check_references(&txn, &draft, Some(&existing)).await?;
        let model = R::update(&txn, existing, draft, &staged.urls)
            .await
            .map_err(|e| AppError::from_db(e, R::NAME))?;
        let mut superseded = old_urls.superseded_by(&staged.urls);
        if !staged.gallery.is_empty() {
            superseded.extend(replace_gallery(&txn, R::KIND, id, &staged.gallery).await?);
        }
        for (kind, titles) in &features {
            replace_features(&txn, R::KIND, id, *kind, titles).await?;
        }
        batch.promote().await?;
        txn.commit().await?;
        batch.keep();
        Ok::<_, AppError>((model, superseded))
    }
    .await;

    let (model, superseded) = match result {
        Ok(done) => {
            batch.finish().await;
            done
        }
        Err(e) => {
            batch.discard().await;
            return Err(e);
        }
    };
    state.media.collect_garbage(superseded);

    tracing::info!(resource = R::NAME, %id, "record updated");
    Ok(message(format!("{} '{}' updated!", R::NAME, R::label(&model))))
}

pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id::<R>(&id)?;
    let txn = state.db.begin().await?;
    let model = find_model::<R, _>(&txn, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    if let Some(reason) = R::dependents(&txn, id).await? {
        return Err(AppError::DependencyBlocked(reason));
    }
    R::cascade(&txn, id).await?;
    remove_children(&txn, R::KIND, id).await?;
    R::Entity::delete_many()
        .filter(R::id_column().eq(id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    state.media.purge(R::KIND, id).await;
    tracing::info!(resource = R::NAME, %id, "record deleted");
    Ok(message(format!("{} '{}' deleted!", R::NAME, R::label(&model))))
}

/// Deletes every record listed in `ids`. Unknown ids are ignored.
pub async fn destroy_many<R: Resource>(
    State(state): State<AppState>,
    input: FormInput,
) -> Result<Json<Value>, AppError> {
    let raw = input.list("ids");
    if raw.is_empty() {
        return Err(AppError::BadRequest("ids are required!".to_string()));
    }
    let ids: Vec<Uuid> = raw
        .iter()
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .collect();

    let txn = state.db.begin().await?;
    let models = R::scope(R::Entity::find())
        .filter(R::id_column().is_in(ids))
        .all(&txn)
        .await?;
    if models.is_empty() {
        return Err(none_found::<R>());
    }
    let found: Vec<Uuid> = models.iter().map(R::id_of).collect();
    for id in &found {
        if let Some(reason) = R::dependents(&txn, *id).await? {
            return Err(AppError::DependencyBlocked(reason));
        }
        R::cascade(&txn, *id).await?;
        remove_children(&txn, R::KIND, *id).await?;
    }
    R::Entity::delete_many()
        .filter(R::id_column().is_in(found.clone()))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    for id in &found {
        state.media.purge(R::KIND, *id).await;
    }
    tracing::info!(resource = R::NAME, count = found.len(), "records deleted");
    Ok(message(format!("{} {} deleted!", found.len(), R::PLURAL)))
}
