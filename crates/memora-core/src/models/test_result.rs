use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stored duration used when a submission carries none.
pub const DEFAULT_SESSION_DURATION: &str = "00:00:00";

/// One completed cognitive-assessment session for a patient.
///
/// Field names on the wire follow the documents written by the test-taking
/// app: the item sequence is stored as `result` and the total as `score`.
/// Anything else the app sent is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TestResult {
    #[serde(rename = "uid")]
    pub id: Uuid,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "result", default, deserialize_with = "lenient_items")]
    pub items: Vec<TestItem>,
    #[serde(rename = "score", default, deserialize_with = "lenient_total")]
    pub total_score: f64,
    #[serde(default)]
    pub approved: bool,
    #[serde(default = "default_duration")]
    pub duration: String,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TestResult {
    pub fn approval_state(&self) -> ApprovalState {
        if self.approved {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        }
    }

    /// Apply a partial record-store update and refresh `updated_at`.
    pub fn apply_update(&mut self, update: TestResultUpdate, now: jiff::Timestamp) {
        match update {
            TestResultUpdate::Scores { items, total_score } => {
                self.items = items;
                self.total_score = total_score;
            }
            TestResultUpdate::Approved => {
                self.approved = true;
            }
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ApprovalState {
    Pending,
    Approved,
}

/// The partial updates the record store accepts for a test result.
///
/// Items and their total always travel together so the stored total can
/// never drift from the item scores.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResultUpdate {
    Scores {
        items: Vec<TestItem>,
        total_score: f64,
    },
    Approved,
}

/// One question or task within a test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TestItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub task_key: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub question_key: String,
    #[serde(
        default,
        deserialize_with = "lenient_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_correct: Option<bool>,
    #[serde(default)]
    #[ts(type = "number | string")]
    pub score: Score,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_str: Option<String>,
    /// Legacy duration field written by older app builds.
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TestItem {
    pub fn new(task_key: impl Into<String>, question_key: impl Into<String>) -> Self {
        Self {
            task_key: task_key.into(),
            question_key: question_key.into(),
            is_correct: None,
            score: Score::default(),
            duration_str: None,
            time: None,
            value: None,
            answer: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            task_key: self.task_key.clone(),
            question_key: self.question_key.clone(),
        }
    }

    pub fn has_key(&self, key: &ItemKey) -> bool {
        self.task_key == key.task_key && self.question_key == key.question_key
    }

    /// A missing judgment counts as incorrect.
    pub fn is_correct(&self) -> bool {
        self.is_correct.unwrap_or(false)
    }

    /// The elapsed-time string, preferring `durationStr` over the legacy
    /// `time` field. Blank values fall through.
    pub fn elapsed(&self) -> Option<&str> {
        [self.duration_str.as_deref(), self.time.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }

    /// A string field from the app-specific extras, if present.
    pub fn extra_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(|v| v.as_str())
    }
}

/// Composite identity of an item within one result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemKey {
    pub task_key: String,
    pub question_key: String,
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.task_key, self.question_key)
    }
}

/// An item score exactly as stored.
///
/// Older documents hold scores as strings, so the raw JSON value is kept and
/// only coerced when a number is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(serde_json::Value);

impl Score {
    pub fn from_number(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            return Self(serde_json::Value::from(n as i64));
        }
        Self(
            serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::from(0)),
        )
    }

    /// Numeric value of the score. Anything that is not a number, a numeric
    /// string, or a boolean counts as zero.
    pub fn as_f64(&self) -> f64 {
        let n = match &self.0 {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => {
                let s = s.trim();
                if s.is_empty() { 0.0 } else { s.parse().unwrap_or(0.0) }
            }
            serde_json::Value::Bool(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(serde_json::Value::from(0))
    }
}

impl From<serde_json::Value> for Score {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Body of a test result submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTestResult {
    #[serde(rename = "patientId", default)]
    pub patient_id: String,
    #[serde(rename = "result", default, deserialize_with = "lenient_items")]
    pub items: Vec<TestItem>,
    /// Total reported by the submitter; only used to flag divergence.
    #[serde(default)]
    #[ts(type = "number | string | null")]
    pub score: Option<Score>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NewTestResult {
    /// Build the stored record. New results always start unapproved.
    pub fn into_record(self, id: Uuid, total_score: f64, now: jiff::Timestamp) -> TestResult {
        let mut extra = self.extra;
        for reserved in ["uid", "approved", "created_at", "updated_at", "success"] {
            extra.remove(reserved);
        }

        TestResult {
            id,
            patient_id: self.patient_id,
            items: self.items,
            total_score,
            approved: false,
            duration: self
                .duration
                .filter(|d| !d.is_empty())
                .unwrap_or_else(default_duration),
            created_at: now,
            updated_at: now,
            extra,
        }
    }
}

fn default_duration() -> String {
    DEFAULT_SESSION_DURATION.to_string()
}

fn lenient_total<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Score::deserialize(deserializer)?.as_f64())
}

/// Read items from whatever the app stored under `result`. A non-array
/// value yields no items and entries that are not objects are skipped.
/// Object entries are always kept; mistyped fields are coerced.
pub fn parse_items(value: serde_json::Value) -> Vec<TestItem> {
    let serde_json::Value::Array(entries) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            serde_json::Value::Object(fields) => Some(item_from_fields(fields)),
            _ => None,
        })
        .collect()
}

fn item_from_fields(fields: serde_json::Map<String, serde_json::Value>) -> TestItem {
    serde_json::from_value(serde_json::Value::Object(fields.clone())).unwrap_or_else(|_| TestItem {
        extra: fields,
        ..TestItem::new("", "")
    })
}

/// Text from a string, number or boolean. Anything else is empty.
fn coerce_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_text(value).unwrap_or_default())
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(coerce_text)
}

/// `true`/`false` as booleans, strings or 0/1. Anything else is unjudged.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        serde_json::Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    };
    Ok(flag)
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<TestItem>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(parse_items)
}
