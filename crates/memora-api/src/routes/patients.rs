use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use memora_audit::{Action, AuditEvent, ResourceType};
use memora_core::keys;
use memora_core::models::patient::{Patient, PatientDraft, PatientPatch};
use memora_core::query::PatientQuery;
use memora_storage::records::{self, Versioned};
use memora_storage::counters;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::{Saved, Success};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientList {
    pub patients: Vec<Patient>,
    pub total_count: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct PatientCreated {
    pub success: bool,
    pub uid: Uuid,
    pub id: String,
}

pub async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<PatientList>, ApiError> {
    let patients = records::list::<Patient>(state.store(), keys::PATIENTS_PREFIX).await?;
    let page = query.run(patients);

    Ok(Json(PatientList {
        patients: page.items,
        total_count: page.total_count,
        page: page.page,
        limit: page.limit,
    }))
}

pub async fn create_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<PatientDraft>,
) -> Result<Json<PatientCreated>, ApiError> {
    let uid = Uuid::new_v4();
    let manual_id = draft.manual_id().map(str::to_string);
    let mut patient = draft.into_patient(uid, manual_id.clone().unwrap_or_default(), jiff::Timestamp::now());
    patient.validate()?;

    if manual_id.is_none() {
        patient.id = counters::next_sequential_id(state.store(), keys::counters::PATIENTS).await?;
    }

    records::create(state.store(), &keys::patient(uid), &patient).await?;
    AuditEvent::new(Action::Create, ResourceType::Patient, uid.to_string(), &user.sub).emit();

    Ok(Json(PatientCreated {
        success: true,
        uid,
        id: patient.id,
    }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let patient = records::load::<Patient>(state.store(), &keys::patient(uid)).await?;
    Ok(Json(patient.record))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<Uuid>,
    Json(patch): Json<PatientPatch>,
) -> Result<Json<Saved<Patient>>, ApiError> {
    let key = keys::patient(uid);
    let Versioned { mut record, etag } = records::load::<Patient>(state.store(), &key).await?;

    record.apply_patch(patch, jiff::Timestamp::now());
    record.validate()?;
    records::replace(state.store(), &key, &record, etag.as_deref()).await?;
    AuditEvent::new(Action::Update, ResourceType::Patient, uid.to_string(), &user.sub).emit();

    Ok(Json(Saved::new(record)))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<Uuid>,
) -> Result<Json<Success>, ApiError> {
    let key = keys::patient(uid);
    records::load::<Patient>(state.store(), &key).await?;
    records::delete(state.store(), &key).await?;
    AuditEvent::new(Action::Delete, ResourceType::Patient, uid.to_string(), &user.sub).emit();

    Ok(Json(Success::ok()))
}

/// The patient carrying a sequential id, if any.
pub(crate) async fn find_by_sequential_id(
    state: &AppState,
    id: &str,
) -> Result<Option<Patient>, ApiError> {
    let patients = records::list::<Patient>(state.store(), keys::PATIENTS_PREFIX).await?;
    Ok(patients.into_iter().find(|p| p.id == id))
}
