//! A user's favorite sale and rent units.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::units::{Rent, Sale, UnitListing, Units};
use super::{Api, Verb};
use crate::entities::{favorite, unit, user};
use crate::error::AppError;
use crate::resource::search::{contains_pattern, take_limit, DEFAULT_LIMIT};
use crate::resource::{FormInput, Resource};
use crate::state::AppState;

async fn ensure_user<C: ConnectionTrait>(db: &C, raw: &str) -> Result<Uuid, AppError> {
    let missing = || AppError::NotFound("User not found!".to_string());
    let id = Uuid::parse_str(raw.trim()).map_err(|_| missing())?;
    let found = user::Entity::find()
        .filter(user::Column::Id.eq(id))
        .count(db)
        .await?;
    if found == 0 {
        return Err(missing());
    }
    Ok(id)
}

fn favorite_units<L: UnitListing>(user_id: Uuid) -> Select<unit::Entity> {
    unit::Entity::find()
        .join(JoinType::InnerJoin, unit::Relation::Favorite.def())
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(unit::Column::Listing.eq(L::LISTING))
        .order_by_desc(favorite::Column::CreatedAt)
}

async fn respond<L: UnitListing>(
    state: &AppState,
    units: Vec<unit::Model>,
) -> Result<Json<Vec<Value>>, AppError> {
    if units.is_empty() {
        return Err(AppError::NotFound(format!("No favorite {} found!", L::PLURAL)));
    }
    let mut out = Vec::with_capacity(units.len());
    for model in units {
        out.push(Units::<L>::expand(&state.db, model).await?);
    }
    Ok(Json(out))
}

pub async fn list<L: UnitListing>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let user_id = ensure_user(&state.db, &user_id).await?;
    let units = favorite_units::<L>(user_id).all(&state.db).await?;
    respond::<L>(&state, units).await
}

/// Title search within the favorites, `?q=`.
pub async fn search<L: UnitListing>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let limit = take_limit(&mut params)?.unwrap_or(DEFAULT_LIMIT);
    let term = params
        .get("q")
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("No search parameters provided.".to_string()))?;
    let user_id = ensure_user(&state.db, &user_id).await?;

    let units = favorite_units::<L>(user_id)
        .filter(
            Expr::expr(Func::lower(Expr::col((unit::Entity, unit::Column::Title))))
                .like(contains_pattern(&term)),
        )
        .limit(limit)
        .all(&state.db)
        .await?;
    respond::<L>(&state, units).await
}

pub async fn add<L: UnitListing>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    input: FormInput,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let unit_id = input.required_uuid("unitId")?;

    let txn = state.db.begin().await?;
    let user_id = ensure_user(&txn, &user_id).await?;
    let unit = unit::Entity::find_by_id(unit_id)
        .filter(unit::Column::Listing.eq(L::LISTING))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found!", L::NAME)))?;
    let existing = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::UnitId.eq(unit_id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict(format!("'{}' is already a favorite!", unit.title)));
    }
    favorite::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        unit_id: Set(unit_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::from_db(e, "Favorite"))?;
    txn.commit().await?;

    tracing::info!(%user_id, %unit_id, "favorite added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("'{}' added to favorites!", unit.title) })),
    ))
}

pub async fn remove<L: UnitListing>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    input: FormInput,
) -> Result<Json<Value>, AppError> {
    let unit_id = input.required_uuid("unitId")?;

    let txn = state.db.begin().await?;
    let user_id = ensure_user(&txn, &user_id).await?;
    let favorite = favorite::Entity::find()
        .join(JoinType::InnerJoin, favorite::Relation::Unit.def())
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::UnitId.eq(unit_id))
        .filter(unit::Column::Listing.eq(L::LISTING))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Favorite not found!".to_string()))?;
    favorite::Entity::delete_by_id(favorite.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(%user_id, %unit_id, "favorite removed");
    Ok(Json(json!({ "message": "Removed from favorites!" })))
}

fn favorite_routes<L: UnitListing>(api: Api, segment: &str) -> Api {
    let base = format!("/api/fav/{{user_id}}/{segment}");
    let tag = "favorites";
    api.route(Verb::Get, &base, tag, format!("List favorite {}", L::PLURAL), list::<L>)
        .route(
            Verb::Get,
            &format!("{base}/search"),
            tag,
            format!("Search favorite {}", L::PLURAL),
            search::<L>,
        )
        .route(Verb::Post, &base, tag, format!("Add a favorite {}", L::NAME.to_lowercase()), add::<L>)
        .route(
            Verb::Delete,
            &base,
            tag,
            format!("Remove a favorite {}", L::NAME.to_lowercase()),
            remove::<L>,
        )
}

pub fn routes(api: Api) -> Api {
    let api = favorite_routes::<Sale>(api, "fav-sales");
    favorite_routes::<Rent>(api, "fav-rents")
}
