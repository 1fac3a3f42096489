use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;

use memora_audit::{Action, AuditEvent, ResourceType};
use memora_auth::users::NewAccount;
use memora_core::keys;
use memora_core::models::user::{StaffUser, StaffUserDraft};
use memora_core::query::UserQuery;
use memora_storage::counters;
use memora_storage::error::StorageError;
use memora_storage::records::{self, Versioned};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::{Saved, Success};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<StaffUser>,
}

#[derive(Debug, Serialize)]
pub struct UserCreated {
    pub success: bool,
    pub uid: String,
    pub id: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserList>, ApiError> {
    let users = records::list::<StaffUser>(state.store(), keys::USERS_PREFIX).await?;
    Ok(Json(UserList {
        users: query.run(users),
    }))
}

/// Create the sign-in account first, then the staff record keyed by its subject.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(mut draft): Json<StaffUserDraft>,
) -> Result<Json<UserCreated>, ApiError> {
    draft.validate()?;

    let account = NewAccount {
        email: draft.email.trim().to_string(),
        display_name: draft.display_name(),
        password: draft.password.take(),
    };
    let uid = state.identity.create_account(&account).await?;
    let id = counters::next_sequential_id(state.store(), keys::counters::USERS).await?;

    let record = draft.into_user(uid.clone(), id.clone(), jiff::Timestamp::now());
    records::create(state.store(), &keys::user(&uid), &record)
        .await
        .map_err(|e| match e {
            StorageError::PreconditionFailed { .. } => {
                ApiError::Conflict(format!("a staff record already exists for {uid}"))
            }
            other => other.into(),
        })?;
    AuditEvent::new(Action::Create, ResourceType::User, &uid, &user.sub).emit();

    Ok(Json(UserCreated {
        success: true,
        uid,
        id,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<StaffUser>, ApiError> {
    let user = records::load::<StaffUser>(state.store(), &keys::user(&uid)).await?;
    Ok(Json(user.record))
}

/// Edit names, email, role and hospital. The sign-in account is not touched.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(draft): Json<StaffUserDraft>,
) -> Result<Json<Saved<StaffUser>>, ApiError> {
    draft.validate()?;

    let key = keys::user(&uid);
    let Versioned { mut record, etag } = records::load::<StaffUser>(state.store(), &key).await?;
    draft.apply_to(&mut record, jiff::Timestamp::now());
    records::replace(state.store(), &key, &record, etag.as_deref()).await?;
    AuditEvent::new(Action::Update, ResourceType::User, &uid, &user.sub).emit();

    Ok(Json(Saved::new(record)))
}

/// Remove the staff record. The sign-in account is kept.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<Success>, ApiError> {
    let key = keys::user(&uid);
    records::load::<StaffUser>(state.store(), &key).await?;
    records::delete(state.store(), &key).await?;
    AuditEvent::new(Action::Delete, ResourceType::User, &uid, &user.sub).emit();

    Ok(Json(Success::ok()))
}
