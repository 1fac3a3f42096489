use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use memora_core::keys;
use memora_core::models::user::{Role, StaffUser};
use memora_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: CurrentUser,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CurrentUser {
    Staff(StaffUser),
    /// Signed in, but no staff record yet. Built from the token alone.
    Unregistered(Unregistered),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unregistered {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub id: String,
    pub last_name: String,
    pub first_name: String,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Me>, ApiError> {
    let record = records::load_optional::<StaffUser>(state.store(), &keys::user(&user.sub)).await?;

    let current = match record {
        Some(staff) => CurrentUser::Staff(staff.record),
        None => CurrentUser::Unregistered(Unregistered {
            uid: user.sub,
            email: user.email.unwrap_or_default(),
            role: Role::User,
            name: user.name.unwrap_or_else(|| "User".to_string()),
            id: String::new(),
            last_name: String::new(),
            first_name: String::new(),
        }),
    };

    Ok(Json(Me { user: current }))
}
