use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::IF_MATCH;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use memora_audit::{Action, AuditEvent, ResourceType};
use memora_core::models::patient::Patient;
use memora_core::models::payload::TaskPayload;
use memora_core::models::test_result::{
    ItemKey, NewTestResult, TestItem, TestResult, TestResultUpdate, parse_items,
};
use memora_core::query::TestResultQuery;
use memora_scoring::edit::EditWarning;
use memora_scoring::{apply_item_edit, approve, compute_duration, recompute_total, set_judgment};
use memora_storage::records::Versioned;
use memora_storage::test_results;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::Saved;
use crate::routes::patients::find_by_sequential_id;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResultList {
    pub results: Vec<TestResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultDetail {
    pub test_result: TestResult,
    pub patient: Option<Patient>,
    pub total_duration: String,
    /// Typed view of each item's payload, in item order.
    pub payloads: Vec<ItemPayload>,
}

#[derive(Debug, Serialize)]
pub struct ItemPayload {
    #[serde(flatten)]
    pub key: ItemKey,
    #[serde(flatten)]
    pub payload: TaskPayload,
}

/// Outcome of an item edit or judgment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub success: bool,
    pub test_result: TestResult,
    pub total_duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<EditWarning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentRequest {
    pub task_key: String,
    pub question_key: String,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Never accepted; the total is derived from the items.
    #[serde(default)]
    pub score: Option<serde_json::Value>,
}

pub async fn list_test_results(
    State(state): State<AppState>,
    Query(query): Query<TestResultQuery>,
) -> Result<Json<ResultList>, ApiError> {
    let results = test_results::list(state.store()).await?;
    Ok(Json(ResultList {
        results: query.run(results),
    }))
}

pub async fn create_test_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewTestResult>,
) -> Result<Json<Saved<TestResult>>, ApiError> {
    let record = submit(&state, body, &user.sub).await?;
    Ok(Json(Saved::new(record)))
}

/// Store a submitted session. The total is always recomputed from the items.
pub(crate) async fn submit(
    state: &AppState,
    body: NewTestResult,
    actor: &str,
) -> Result<TestResult, ApiError> {
    if body.patient_id.trim().is_empty() {
        return Err(ApiError::BadRequest("patientId is required".to_string()));
    }

    let total = recompute_total(&body.items);
    let submitted = body.score.as_ref().map(|s| s.as_f64());
    if let Some(submitted) = submitted.filter(|s| *s != total) {
        tracing::warn!(
            patient_id = %body.patient_id,
            submitted,
            recomputed = total,
            "submitted score disagrees with item scores; storing recomputed total"
        );
    }

    let record = body.into_record(Uuid::new_v4(), total, jiff::Timestamp::now());
    test_results::create(state.store(), &record).await?;
    AuditEvent::new(Action::Create, ResourceType::TestResult, record.id.to_string(), actor)
        .with_details(json!({ "patientId": record.patient_id }))
        .emit();

    Ok(record)
}

pub async fn get_test_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TestResultDetail>, ApiError> {
    let result = test_results::get(state.store(), id).await?.record;
    let patient = match result.patient_id.trim() {
        "" => None,
        patient_id => find_by_sequential_id(&state, patient_id).await?,
    };

    let payloads = result
        .items
        .iter()
        .map(|item| ItemPayload {
            key: item.key(),
            payload: item.payload(),
        })
        .collect();

    Ok(Json(TestResultDetail {
        total_duration: compute_duration(&result.items),
        test_result: result,
        patient,
        payloads,
    }))
}

/// Replace one item by its composite key and recompute the total.
pub async fn edit_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(item): Json<TestItem>,
) -> Result<Json<EditOutcome>, ApiError> {
    let current = test_results::get(state.store(), id).await?;
    ensure_editable(&state, &current.record)?;

    let outcome = save_item(&state, id, current, &item, expected_etag(&headers)).await?;
    if outcome.warning.is_none() {
        AuditEvent::new(Action::EditItem, ResourceType::TestResult, id.to_string(), &user.sub)
            .with_details(json!({ "item": item.key().to_string() }))
            .emit();
    }
    Ok(Json(outcome))
}

/// Record a reviewer's judgment on one item, adjusting its score.
pub async fn judge_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(judgment): Json<JudgmentRequest>,
) -> Result<Json<EditOutcome>, ApiError> {
    let current = test_results::get(state.store(), id).await?;
    ensure_editable(&state, &current.record)?;

    let key = ItemKey {
        task_key: judgment.task_key,
        question_key: judgment.question_key,
    };
    let Some(item) = current.record.items.iter().find(|i| i.has_key(&key)) else {
        tracing::warn!(test_result = %id, item = %key, "judged item not found in result");
        return Ok(Json(EditOutcome {
            success: true,
            total_duration: compute_duration(&current.record.items),
            test_result: current.record,
            warning: Some(EditWarning::UnmatchedItem { key }),
        }));
    };

    let judged = set_judgment(item, judgment.is_correct);
    if judged == *item {
        return Ok(Json(unchanged(current.record)));
    }

    let outcome = save_item(&state, id, current, &judged, expected_etag(&headers)).await?;
    AuditEvent::new(Action::Judge, ResourceType::TestResult, id.to_string(), &user.sub)
        .with_details(json!({ "item": key.to_string(), "isCorrect": judgment.is_correct }))
        .emit();
    Ok(Json(outcome))
}

pub async fn approve_test_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Saved<TestResult>>, ApiError> {
    let current = test_results::get(state.store(), id).await?;
    let record = approve_loaded(&state, id, current, expected_etag(&headers), &user.sub).await?;
    Ok(Json(Saved::new(record)))
}

/// Partial update: a new item sequence, an approval, or both.
pub async fn patch_test_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<PatchRequest>,
) -> Result<Json<Saved<TestResult>>, ApiError> {
    if patch.score.is_some() {
        return Err(ApiError::BadRequest(
            "score is derived from the items and cannot be set".to_string(),
        ));
    }
    if patch.approved == Some(false) {
        return Err(ApiError::BadRequest(
            "an approved result cannot be returned to pending".to_string(),
        ));
    }

    let mut current = test_results::get(state.store(), id).await?;
    let mut expected = expected_etag(&headers);

    if let Some(result) = patch.result {
        ensure_editable(&state, &current.record)?;
        let items = parse_items(result);
        let total_score = recompute_total(&items);
        current = test_results::update(
            state.store(),
            id,
            TestResultUpdate::Scores { items, total_score },
            expected.as_deref().or(current.etag.as_deref()),
            jiff::Timestamp::now(),
        )
        .await?;
        expected = None;
        AuditEvent::new(Action::Update, ResourceType::TestResult, id.to_string(), &user.sub)
            .with_details(json!({ "score": total_score }))
            .emit();
    }

    let record = if patch.approved == Some(true) {
        approve_loaded(&state, id, current, expected, &user.sub).await?
    } else {
        current.record
    };

    Ok(Json(Saved::new(record)))
}

async fn approve_loaded(
    state: &AppState,
    id: Uuid,
    current: Versioned<TestResult>,
    expected: Option<String>,
    actor: &str,
) -> Result<TestResult, ApiError> {
    let now = jiff::Timestamp::now();
    let approval = approve(current.record, now);

    let Some(update) = approval.update() else {
        return Ok(approval.result);
    };

    let saved = test_results::update(
        state.store(),
        id,
        update,
        expected.as_deref().or(current.etag.as_deref()),
        now,
    )
    .await?;
    AuditEvent::new(Action::Approve, ResourceType::TestResult, id.to_string(), actor).emit();

    Ok(saved.record)
}

/// Splice `item` into the loaded result, recompute and persist.
///
/// The write is conditional on the version that was loaded (or the one the
/// client named in `If-Match`), so an interleaved edit surfaces as 409.
async fn save_item(
    state: &AppState,
    id: Uuid,
    current: Versioned<TestResult>,
    item: &TestItem,
    expected: Option<String>,
) -> Result<EditOutcome, ApiError> {
    let edit = apply_item_edit(&current.record.items, item);
    if let Some(warning) = edit.warning {
        return Ok(EditOutcome {
            warning: Some(warning),
            ..unchanged(current.record)
        });
    }

    let total_score = recompute_total(&edit.items);
    let saved = test_results::update(
        state.store(),
        id,
        TestResultUpdate::Scores {
            items: edit.items,
            total_score,
        },
        expected.as_deref().or(current.etag.as_deref()),
        jiff::Timestamp::now(),
    )
    .await?;

    Ok(EditOutcome {
        success: true,
        total_duration: compute_duration(&saved.record.items),
        test_result: saved.record,
        warning: None,
    })
}

fn unchanged(record: TestResult) -> EditOutcome {
    EditOutcome {
        success: true,
        total_duration: compute_duration(&record.items),
        test_result: record,
        warning: None,
    }
}

fn ensure_editable(state: &AppState, record: &TestResult) -> Result<(), ApiError> {
    if state.lock_approved && record.approved {
        return Err(ApiError::Conflict(
            "result is approved and locked for editing".to_string(),
        ));
    }
    Ok(())
}

fn expected_etag(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "*")
        .map(str::to_string)
}
