//! Typed identify request and its validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*@([A-Za-z0-9_-]+\.)+[A-Za-z]{2,7}$")
        .expect("email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone regex"));

/// Incoming `(email, phoneNumber)` pair as received at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone_number: Option<String>,
}

impl IdentifyRequest {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email,
            phone_number,
        }
    }
}

/// Clients commonly post phone numbers as bare JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

/// How strictly field formats are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ValidationPolicy {
    /// Presence plus email grammar and 10-digit phone
    #[default]
    Strict,
    /// Only require that one of the fields is present
    PresenceOnly,
}

/// A request that passed validation. Empty fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ValidatedRequest {
    /// Keys guarding the read-then-create sequence for this input.
    pub fn lock_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(email) = &self.email {
            keys.push(format!("email:{}", email.to_lowercase()));
        }
        if let Some(phone) = &self.phone_number {
            keys.push(format!("phone:{}", phone));
        }
        keys
    }
}

impl ValidationPolicy {
    pub fn validate(&self, request: &IdentifyRequest) -> Result<ValidatedRequest, ValidationError> {
        let email = non_empty(request.email.as_deref());
        let phone_number = non_empty(request.phone_number.as_deref());

        if email.is_none() && phone_number.is_none() {
            return Err(ValidationError::MissingInput);
        }

        if *self == ValidationPolicy::Strict {
            if let Some(e) = &email {
                if !EMAIL_RE.is_match(e) {
                    return Err(ValidationError::InvalidEmail);
                }
            }
            if let Some(p) = &phone_number {
                if !PHONE_RE.is_match(p) {
                    return Err(ValidationError::InvalidPhone);
                }
            }
        }

        Ok(ValidatedRequest {
            email,
            phone_number,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
