//! Request body validation.
//!
//! Fields are whitespace-trimmed before any check; lengths are counted in
//! characters.

use serde::Deserialize;
use thiserror::Error;

pub const MAX_SITE_LEN: usize = 255;
pub const MAX_USERNAME_LEN: usize = 255;
pub const MAX_PASSWORD_LEN: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Body of `POST /credentials`.
#[derive(Debug, Deserialize)]
pub struct NewCredentialRequest {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `PUT /credentials/{site}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCredentialRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A validated, trimmed credential ready for the vault.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidCredential {
    pub site: String,
    pub username: String,
    pub password: String,
}

impl NewCredentialRequest {
    pub fn validate(self) -> Result<ValidCredential, ValidationError> {
        Ok(ValidCredential {
            site: site(&self.site)?,
            username: field("username", &self.username, MAX_USERNAME_LEN)?,
            password: field("password", &self.password, MAX_PASSWORD_LEN)?,
        })
    }
}

impl UpdateCredentialRequest {
    /// Validates the body against the site taken from the URL path.
    pub fn validate(self, path_site: &str) -> Result<ValidCredential, ValidationError> {
        Ok(ValidCredential {
            site: site(path_site)?,
            username: field("username", &self.username, MAX_USERNAME_LEN)?,
            password: field("password", &self.password, MAX_PASSWORD_LEN)?,
        })
    }
}

/// Trims and checks a site name, from a body or a URL path.
pub fn site(raw: &str) -> Result<String, ValidationError> {
    field("site", raw, MAX_SITE_LEN)
}

fn field(name: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(name));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field: name, max });
    }
    Ok(value.to_string())
}
