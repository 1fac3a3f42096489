use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use memora_core::keys;
use memora_core::models::user::StaffUser;
use memora_storage::records;

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie the console stores the signed-in user's ID token in.
pub const ID_TOKEN_COOKIE: &str = "id_token";

/// Authenticated user extracted from verified token claims.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Token validation middleware.
///
/// Takes the token from `Authorization: Bearer <token>`, falling back to the
/// `id_token` cookie, and verifies it. On success, inserts `AuthUser` into
/// request extensions for handlers to use.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("missing credentials".to_string()))?;

    let claims = state.verifier.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "rejected token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(AuthUser {
        sub: claims.sub,
        email: claims.email,
        name: claims.name,
    });

    Ok(next.run(req).await)
}

/// Admin gate for the management routes. Runs after [`require_auth`].
///
/// A caller with a staff record must hold the admin role. A caller without
/// one is let through so the first account can be created.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let sub = req
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.sub.clone())
        .ok_or_else(|| ApiError::Unauthorized("missing credentials".to_string()))?;

    let record = records::load_optional::<StaffUser>(state.store(), &keys::user(&sub)).await?;
    if record.is_some_and(|user| !user.record.is_admin()) {
        tracing::info!(user_sub = %sub, "non-admin denied");
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    Ok(next.run(req).await)
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ID_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}
