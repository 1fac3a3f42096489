//! Endpoints the test-taking app calls without a console session.

use std::time::Duration;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use memora_audit::events::ANONYMOUS;
use memora_audit::{Action, AuditEvent, ResourceType};
use memora_core::keys;
use memora_core::models::patient::Patient;
use memora_core::models::test_result::{NewTestResult, TestResult};
use memora_storage::store::Precondition;

use crate::error::ApiError;
use crate::routes::Saved;
use crate::routes::patients::find_by_sequential_id;
use crate::routes::test_results::submit;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const DEFAULT_AUDIO_TYPE: &str = "audio/m4a";
const DEFAULT_AUDIO_NAME: &str = "recording.m4a";
/// Longest lifetime S3 allows for a presigned URL.
const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub success: bool,
    pub url: String,
    pub path: String,
}

/// Look a patient up by sequential id. Unknown ids yield `null`.
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Patient>>, ApiError> {
    Ok(Json(find_by_sequential_id(&state, id.trim()).await?))
}

pub async fn submit_test_result(
    State(state): State<AppState>,
    Json(body): Json<NewTestResult>,
) -> Result<Json<Saved<TestResult>>, ApiError> {
    let record = submit(&state, body, ANONYMOUS).await?;
    Ok(Json(Saved::new(record)))
}

/// Store a recording under `audios/{uuid}_{filename}`.
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Uploaded>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(base_name)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_AUDIO_NAME)
            .to_string();
        let content_type = field
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_string();
        let body = field.bytes().await.map_err(multipart_error)?;

        let key = keys::audio(&format!("{}_{file_name}", Uuid::new_v4()));
        state
            .store()
            .put(&key, body.to_vec(), Some(&content_type), Precondition::IfAbsent)
            .await?;
        let url = state.store().download_url(&key, DOWNLOAD_URL_TTL).await?;

        AuditEvent::new(Action::Upload, ResourceType::Audio, &key, ANONYMOUS).emit();
        tracing::info!(key = %key, bytes = body.len(), content_type = %content_type, "audio uploaded");

        return Ok(Json(Uploaded {
            success: true,
            url,
            path: key,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Last path component, so a client-supplied name cannot pick the prefix.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}
