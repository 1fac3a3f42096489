use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::require;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    #[default]
    Admin,
    User,
}

/// A hospital staff member who can sign in to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffUser {
    /// Identity provider subject.
    pub uid: String,
    /// Human-readable sequential id (e.g. `000001`).
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl StaffUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// Full name and email, lowercased, for substring search.
    pub fn search_haystacks(&self) -> [String; 2] {
        [
            format!("{}{}", self.last_name, self.first_name).to_lowercase(),
            self.email.to_lowercase(),
        ]
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body of a staff user create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffUserDraft {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub hospital_name: Option<String>,
    /// Initial sign-in password. Only used when the account is created.
    #[serde(default, skip_serializing)]
    #[ts(skip)]
    pub password: Option<String>,
}

impl StaffUserDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        require("lastName", &self.last_name)?;
        require("firstName", &self.first_name)?;
        require("email", &self.email)?;
        validate_email(&self.email)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    pub fn into_user(self, uid: String, id: String, now: jiff::Timestamp) -> StaffUser {
        StaffUser {
            uid,
            id,
            last_name: self.last_name,
            first_name: self.first_name,
            email: self.email,
            role: self.role.unwrap_or_default(),
            hospital_name: self.hospital_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields of an existing record.
    pub fn apply_to(self, user: &mut StaffUser, now: jiff::Timestamp) {
        user.last_name = self.last_name;
        user.first_name = self.first_name;
        user.email = self.email;
        if let Some(role) = self.role {
            user.role = role;
        }
        if self.hospital_name.is_some() {
            user.hospital_name = self.hospital_name;
        }
        user.updated_at = now;
    }
}

fn validate_email(email: &str) -> Result<(), CoreError> {
    let valid = email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        });

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidField {
            field: "email".to_string(),
            reason: "not a valid email address".to_string(),
        })
    }
}
