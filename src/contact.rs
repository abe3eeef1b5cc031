use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Signup as submitted by the early-access form, before any validation took place.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub list_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub list_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    MissingField,
    Email,
    NameTooLong,
}

impl Invalid {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingField => "First name, last name, and email are required",
            Self::Email => "Invalid email format",
            Self::NameTooLong => "Names must be less than 100 characters",
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.message())
    }
}

impl ContactRequest {
    pub fn new(first_name: &str, last_name: &str, email: &str, list_ids: &[i64]) -> Self {
        Self {
            first_name: Some(first_name.to_owned()),
            last_name: Some(last_name.to_owned()),
            email: Some(email.to_owned()),
            list_ids: list_ids.to_vec(),
        }
    }

    /// Checks presence, then the email pattern, then name lengths.
    ///
    /// The first failing check wins. Fields are trimmed only after they passed.
    pub fn validate(self) -> Result<Contact, Invalid> {
        let (first_name, last_name, email) = match (self.first_name, self.last_name, self.email) {
            (Some(first_name), Some(last_name), Some(email))
                if !first_name.is_empty() && !last_name.is_empty() && !email.is_empty() =>
            {
                (first_name, last_name, email)
            }
            _ => return Err(Invalid::MissingField),
        };

        if !EMAIL.is_match(&email) {
            return Err(Invalid::Email);
        }

        if name_len(&first_name) > MAX_NAME_LEN || name_len(&last_name) > MAX_NAME_LEN {
            return Err(Invalid::NameTooLong);
        }

        Ok(Contact {
            first_name: first_name.trim().to_owned(),
            last_name: last_name.trim().to_owned(),
            email: email.trim().to_owned(),
            list_ids: self.list_ids,
        })
    }
}

// Counted in UTF-16 code units so that browser and relay agree.
fn name_len(val: &str) -> usize {
    val.encode_utf16().count()
}
