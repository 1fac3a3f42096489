use std::fmt;

use memora_core::models::test_result::{ItemKey, Score, TestItem};
use serde::Serialize;
use ts_rs::TS;

/// Something the caller should surface after an edit that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum EditWarning {
    /// No item in the result carries the edited item's key.
    UnmatchedItem { key: ItemKey },
}

impl fmt::Display for EditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditWarning::UnmatchedItem { key } => {
                write!(f, "no item {key} in this result; nothing was changed")
            }
        }
    }
}

/// The item sequence after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEdit {
    pub items: Vec<TestItem>,
    pub warning: Option<EditWarning>,
}

impl ItemEdit {
    pub fn is_applied(&self) -> bool {
        self.warning.is_none()
    }
}

/// Replace the item sharing `updated`'s composite key, keeping its position.
///
/// The input is left untouched and every other item is carried over as is.
/// An unknown key returns the sequence unchanged with a warning.
pub fn apply_item_edit(items: &[TestItem], updated: &TestItem) -> ItemEdit {
    let key = updated.key();
    let mut matched = false;

    let items = items
        .iter()
        .map(|item| {
            if item.has_key(&key) {
                matched = true;
                updated.clone()
            } else {
                item.clone()
            }
        })
        .collect();

    let warning = if matched {
        None
    } else {
        tracing::warn!(item = %key, "edited item not found in result");
        Some(EditWarning::UnmatchedItem { key })
    };

    ItemEdit { items, warning }
}

/// Record a reviewer's correctness judgment on one item.
///
/// Each item is worth at most one point: flipping to correct adds one,
/// flipping to incorrect removes one without going below zero. Re-asserting
/// the current judgment returns the item unchanged.
pub fn set_judgment(item: &TestItem, is_correct: bool) -> TestItem {
    if item.is_correct() == is_correct {
        return item.clone();
    }

    let current = item.score.as_f64();
    let score = if is_correct {
        current + 1.0
    } else {
        (current - 1.0).max(0.0)
    };

    TestItem {
        is_correct: Some(is_correct),
        score: Score::from_number(score),
        ..item.clone()
    }
}
