use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::Api;
use crate::entities::admin::{self, Role};
use crate::error::AppError;
use crate::resource::{FormInput, Intent, MediaUrls, Resource, SearchField, Slot};

pub struct Admins;

pub struct AdminDraft {
    username: String,
    email: String,
    /// Argon2 PHC string; `None` keeps the stored hash on update.
    password: Option<String>,
    role: Role,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hash error: {e}")))
}

fn read_role(input: &FormInput) -> Result<Role, AppError> {
    match input.text("role") {
        None => Ok(Role::Admin),
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| AppError::BadRequest("role must be either su or admin".to_string())),
    }
}

#[async_trait]
impl Resource for Admins {
    type Entity = admin::Entity;
    type Model = admin::Model;
    type Draft = AdminDraft;

    const NAME: &'static str = "Admin";
    const PLURAL: &'static str = "admins";
    const KIND: &'static str = "admins";
    const AVATAR: Slot = Slot::Optional;

    fn id_column() -> admin::Column {
        admin::Column::Id
    }

    fn updated_at_column() -> admin::Column {
        admin::Column::UpdatedAt
    }

    fn id_of(model: &admin::Model) -> Uuid {
        model.id
    }

    fn label(model: &admin::Model) -> String {
        model.username.clone()
    }

    fn search_fields() -> Vec<SearchField<admin::Column>> {
        vec![
            SearchField::contains("username", admin::Column::Username),
            SearchField::contains("email", admin::Column::Email),
            SearchField::contains("role", admin::Column::Role),
        ]
    }

    fn media_urls(model: &admin::Model) -> MediaUrls {
        MediaUrls {
            avatar: model.image_url.clone(),
            ..Default::default()
        }
    }

    fn draft(input: &FormInput, intent: Intent) -> Result<AdminDraft, AppError> {
        let password = if intent.creating() {
            Some(input.required("password")?)
        } else {
            input.optional("password")
        };
        Ok(AdminDraft {
            username: input.required("username")?,
            email: input.required("email")?.to_lowercase(),
            password: password.as_deref().map(hash_password).transpose()?,
            role: read_role(input)?,
        })
    }

    async fn find_duplicate<C: ConnectionTrait>(
        db: &C,
        draft: &AdminDraft,
        existing: Option<&admin::Model>,
    ) -> Result<bool, DbErr> {
        let mut query = admin::Entity::find().filter(
            Condition::any()
                .add(admin::Column::Username.eq(draft.username.as_str()))
                .add(admin::Column::Email.eq(draft.email.as_str())),
        );
        if let Some(existing) = existing {
            query = query.filter(admin::Column::Id.ne(existing.id));
        }
        Ok(query.count(db).await? > 0)
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        draft: AdminDraft,
        media: &MediaUrls,
    ) -> Result<admin::Model, DbErr> {
        let password = draft
            .password
            .ok_or_else(|| DbErr::Custom("admin without password".to_string()))?;
        let now = chrono::Utc::now().naive_utc();
        admin::ActiveModel {
            id: Set(id),
            username: Set(draft.username),
            email: Set(draft.email),
            password: Set(password),
            role: Set(draft.role),
            image_url: Set(media.avatar.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        existing: admin::Model,
        draft: AdminDraft,
        media: &MediaUrls,
    ) -> Result<admin::Model, DbErr> {
        let mut active = existing.into_active_model();
        active.username = Set(draft.username);
        active.email = Set(draft.email);
        if let Some(password) = draft.password {
            active.password = Set(password);
        }
        active.role = Set(draft.role);
        if let Some(url) = &media.avatar {
            active.image_url = Set(Some(url.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await
    }
}

/// Creates an admin outside of HTTP, for bootstrapping the first super user.
pub async fn create_admin<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<admin::Model, AppError> {
    let input = FormInput::from_json(serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
    }))?;
    let mut draft = Admins::draft(&input, Intent::Create { parent: None })?;
    draft.role = role;

    let txn = db.begin().await?;
    if Admins::find_duplicate(&txn, &draft, None).await? {
        return Err(AppError::Conflict("Admin already exists!".to_string()));
    }
    let model = Admins::insert(&txn, Uuid::new_v4(), draft, &MediaUrls::default())
        .await
        .map_err(|e| AppError::from_db(e, Admins::NAME))?;
    txn.commit().await?;
    Ok(model)
}

pub fn routes(api: Api) -> Api {
    api.crud::<Admins>("/api/admins", true)
}
