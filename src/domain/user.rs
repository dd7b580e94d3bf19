//! Account records for the signup surface and `X-USER-ID` resolution.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            other => Err(DomainError::validation(
                "gender",
                format!("unknown gender code `{other}`"),
            )),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login_id: String,
    pub email: String,
    pub birth_date: Date,
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Login ids are 1-10 ASCII alphanumeric characters.
pub fn validate_login_id(login_id: &str) -> Result<(), DomainError> {
    if login_id.is_empty() || login_id.len() > 10 {
        return Err(DomainError::validation(
            "loginId",
            "must be between 1 and 10 characters",
        ));
    }
    if !login_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation(
            "loginId",
            "must contain only ASCII letters and digits",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(DomainError::validation("email", "malformed address"));
    }
    Ok(())
}
