use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::require;
use crate::error::CoreError;

/// Manually assigned patient ids may not exceed this length.
pub const MAX_PATIENT_ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Patient {
    /// Store-assigned document id.
    pub uid: Uuid,
    /// Human-readable sequential id (e.g. `000001`).
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub last_name_kana: String,
    pub first_name_kana: String,
    pub gender: String,
    pub birth_year: String,
    pub birth_month: String,
    pub birth_day: String,
    pub zip: String,
    pub prefecture: String,
    pub city: String,
    pub address1: String,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Patient {
    /// Full name followed by full kana name, lowercased, for substring search.
    pub fn search_haystacks(&self) -> [String; 2] {
        [
            format!("{}{}", self.last_name, self.first_name).to_lowercase(),
            format!("{}{}", self.last_name_kana, self.first_name_kana).to_lowercase(),
        ]
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require("lastName", &self.last_name)?;
        require("firstName", &self.first_name)?;
        require("lastNameKana", &self.last_name_kana)?;
        require("firstNameKana", &self.first_name_kana)?;
        require("gender", &self.gender)?;
        require("birthYear", &self.birth_year)?;
        require("birthMonth", &self.birth_month)?;
        require("birthDay", &self.birth_day)?;
        require("zip", &self.zip)?;
        require("prefecture", &self.prefecture)?;
        require("city", &self.city)?;
        require("address1", &self.address1)?;
        validate_patient_id(&self.id)
    }

    /// Apply a partial edit. The sequential id, uid and creation time never change.
    pub fn apply_patch(&mut self, patch: PatientPatch, now: jiff::Timestamp) {
        let PatientPatch {
            last_name,
            first_name,
            last_name_kana,
            first_name_kana,
            gender,
            birth_year,
            birth_month,
            birth_day,
            zip,
            prefecture,
            city,
            address1,
            building,
            education,
        } = patch;

        let fields = [
            (&mut self.last_name, last_name),
            (&mut self.first_name, first_name),
            (&mut self.last_name_kana, last_name_kana),
            (&mut self.first_name_kana, first_name_kana),
            (&mut self.gender, gender),
            (&mut self.birth_year, birth_year),
            (&mut self.birth_month, birth_month),
            (&mut self.birth_day, birth_day),
            (&mut self.zip, zip),
            (&mut self.prefecture, prefecture),
            (&mut self.city, city),
            (&mut self.address1, address1),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if building.is_some() {
            self.building = building;
        }
        if education.is_some() {
            self.education = education;
        }
        self.updated_at = now;
    }
}

/// Body of a patient creation request. `id` is optional; when absent the
/// next sequential id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub last_name_kana: String,
    pub first_name_kana: String,
    pub gender: String,
    pub birth_year: String,
    pub birth_month: String,
    pub birth_day: String,
    pub zip: String,
    pub prefecture: String,
    pub city: String,
    pub address1: String,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
}

impl PatientDraft {
    /// The manual id, if one was supplied and is not blank.
    pub fn manual_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn into_patient(self, uid: Uuid, id: String, now: jiff::Timestamp) -> Patient {
        Patient {
            uid,
            id,
            last_name: self.last_name,
            first_name: self.first_name,
            last_name_kana: self.last_name_kana,
            first_name_kana: self.first_name_kana,
            gender: self.gender,
            birth_year: self.birth_year,
            birth_month: self.birth_month,
            birth_day: self.birth_day,
            zip: self.zip,
            prefecture: self.prefecture,
            city: self.city,
            address1: self.address1,
            building: self.building,
            education: self.education,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial patient edit. Absent fields are left untouched; identifiers are
/// not editable and are ignored if sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientPatch {
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name_kana: Option<String>,
    #[serde(default)]
    pub first_name_kana: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_year: Option<String>,
    #[serde(default)]
    pub birth_month: Option<String>,
    #[serde(default)]
    pub birth_day: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
}

fn validate_patient_id(id: &str) -> Result<(), CoreError> {
    if id.chars().count() > MAX_PATIENT_ID_LEN {
        return Err(CoreError::InvalidField {
            field: "id".to_string(),
            reason: format!("must be at most {MAX_PATIENT_ID_LEN} characters"),
        });
    }
    Ok(())
}
