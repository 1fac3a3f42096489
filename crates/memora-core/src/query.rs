//! List filters for the console screens.
//!
//! Each query is a plain value deserialized from request parameters and run
//! over the records loaded from the store.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::patient::Patient;
use crate::models::test_result::TestResult;
use crate::models::user::StaffUser;

pub const DEFAULT_PAGE: usize = 1;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a filtered listing. `total_count` counts every match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub search_name: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PatientQuery {
    /// Exact match on the sequential id when given, otherwise newest first.
    /// The name filter matches either the written or the kana name.
    pub fn run(&self, mut patients: Vec<Patient>) -> Page<Patient> {
        match non_blank(&self.id) {
            Some(id) => patients.retain(|p| p.id == id),
            None => patients.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        if let Some(needle) = non_blank(&self.search_name) {
            let needle = needle.to_lowercase();
            patients.retain(|p| p.search_haystacks().iter().any(|h| h.contains(&needle)));
        }

        paginate(patients, self.page, self.limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserQuery {
    /// Identity provider subject; when present no other filter applies.
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub search_name: Option<String>,
}

impl UserQuery {
    pub fn run(&self, mut users: Vec<StaffUser>) -> Vec<StaffUser> {
        if let Some(uid) = non_blank(&self.uid) {
            users.retain(|u| u.uid == uid);
            return users;
        }

        if let Some(id) = non_blank(&self.id) {
            users.retain(|u| u.id == id);
        }

        if let Some(needle) = non_blank(&self.search_name) {
            let needle = needle.to_lowercase();
            users.retain(|u| u.search_haystacks().iter().any(|h| h.contains(&needle)));
        }

        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TestResultQuery {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
    /// Inclusive, compared against the UTC calendar day of `created_at`.
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub end_date: Option<Date>,
}

impl TestResultQuery {
    /// Matching results, newest first.
    pub fn run(&self, mut results: Vec<TestResult>) -> Vec<TestResult> {
        if let Some(patient_id) = non_blank(&self.patient_id) {
            results.retain(|r| r.patient_id == patient_id);
        }

        if let Some(approved) = self.approved {
            results.retain(|r| r.approved == approved);
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            results.retain(|r| {
                let day = r.created_at.to_zoned(TimeZone::UTC).date();
                self.start_date.is_none_or(|start| day >= start)
                    && self.end_date.is_none_or(|end| day <= end)
            });
        }

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }
}

fn paginate<T>(items: Vec<T>, page: Option<usize>, limit: Option<usize>) -> Page<T> {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let total_count = items.len();

    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        total_count,
        page,
        limit,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
