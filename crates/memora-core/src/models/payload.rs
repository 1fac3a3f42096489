//! Typed views over the task-specific `value` / `answer` payloads.
//!
//! The stored payload shape depends on the task that produced the item. The
//! scoring workflow never looks inside it; these views exist for reviewers.

use serde::Serialize;
use ts_rs::TS;

use super::test_result::TestItem;

/// Payloads the app marks as not captured.
const UNKNOWN: &str = "unknown";

/// Task families, keyed by an item's `taskKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TaskFamily {
    TrailMaking,
    Orientation,
    DelayedRecall,
    Fluency,
    LetterTap,
    Naming,
    WordRecall,
    Similarity,
    Other,
}

impl TaskFamily {
    pub fn from_task_key(task_key: &str) -> Self {
        match task_key {
            "node_test" => Self::TrailMaking,
            "orientation_task" => Self::Orientation,
            "delayed_recall" => Self::DelayedRecall,
            "fluency_task" => Self::Fluency,
            "letter_tap_task" => Self::LetterTap,
            "naming_task" => Self::Naming,
            "word_recall" => Self::WordRecall,
            "similarity_task" => Self::Similarity,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "family", rename_all = "snake_case")]
#[ts(export)]
pub enum TaskPayload {
    /// Node sequence the patient tapped and how often they corrected it.
    TrailMaking { ids: Vec<String>, repair_count: u64 },
    /// Device reading for date/time steps; GPS detail for location steps.
    Orientation {
        device_reading: Option<String>,
        gps_detail: Option<String>,
    },
    DelayedRecall { expected_word: Option<String> },
    Fluency { words: Vec<String> },
    LetterTap { tap_summary: Option<String> },
    Naming { answer: Option<String> },
    WordRecall { words: Option<String> },
    Similarity { answer: Option<String> },
    Other {
        value: Option<serde_json::Value>,
        answer: Option<serde_json::Value>,
    },
}

impl TestItem {
    pub fn family(&self) -> TaskFamily {
        TaskFamily::from_task_key(&self.task_key)
    }

    /// Interpret the stored payload according to the item's task family.
    pub fn payload(&self) -> TaskPayload {
        match self.family() {
            TaskFamily::TrailMaking => {
                let source = [self.answer.as_ref(), self.value.as_ref()]
                    .into_iter()
                    .flatten()
                    .find(|v| v.is_object());
                let ids = source
                    .and_then(|v| v.get("ids"))
                    .and_then(|v| v.as_array())
                    .map(|ids| ids.iter().filter_map(json_text).collect())
                    .unwrap_or_default();
                let repair_count = source
                    .and_then(|v| v.get("repairCount"))
                    .and_then(|v| v.as_u64())
                    .or_else(|| self.extra.get("repairCount").and_then(|v| v.as_u64()))
                    .unwrap_or(0);
                TaskPayload::TrailMaking { ids, repair_count }
            }
            TaskFamily::Orientation => TaskPayload::Orientation {
                device_reading: known_text(self.answer.as_ref()),
                gps_detail: self.extra_str("gpsDetail").map(str::to_string),
            },
            TaskFamily::DelayedRecall => TaskPayload::DelayedRecall {
                expected_word: known_text(self.value.as_ref()),
            },
            TaskFamily::Fluency => TaskPayload::Fluency {
                words: self
                    .answer
                    .as_ref()
                    .and_then(|v| v.as_array())
                    .map(|words| words.iter().filter_map(json_text).collect())
                    .unwrap_or_default(),
            },
            TaskFamily::LetterTap => TaskPayload::LetterTap {
                tap_summary: self.extra_str("tapSummary").map(str::to_string),
            },
            TaskFamily::Naming => TaskPayload::Naming {
                answer: self.answer.as_ref().and_then(json_text),
            },
            TaskFamily::WordRecall => TaskPayload::WordRecall {
                words: self.value.as_ref().and_then(|v| v.as_str()).map(str::to_string),
            },
            TaskFamily::Similarity => TaskPayload::Similarity {
                answer: self.answer.as_ref().and_then(json_text),
            },
            TaskFamily::Other => TaskPayload::Other {
                value: self.value.clone(),
                answer: self.answer.clone(),
            },
        }
    }
}

/// Strings as-is, numbers and booleans rendered; anything else is dropped.
fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn known_text(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty() && *s != UNKNOWN)
        .map(str::to_string)
}
