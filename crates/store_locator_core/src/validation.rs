//! crates/store_locator_core/src/validation.rs
//!
//! Explicit write-time validation. Each function either returns the cleaned-up
//! value or a `ValidationError` listing every field that failed.

use std::fmt;

use uuid::Uuid;

use crate::domain::{Location, NewReview, StoreFields};
use crate::geo::GeoPoint;

/// A single failing field and the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {}", summary(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summary(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<FieldError> for ValidationError {
    fn from(field: FieldError) -> Self {
        Self { fields: vec![field] }
    }
}

/// Unvalidated store input as it arrives from a form or JSON body.
#[derive(Debug, Clone, Default)]
pub struct StoreDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub coordinates: Option<Vec<f64>>,
    pub address: Option<String>,
    pub photo: Option<String>,
    pub author: Option<Uuid>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl StoreDraft {
    pub fn validate(self) -> Result<StoreFields, ValidationError> {
        let mut errors = Vec::new();

        let name = trimmed(self.name);
        if name.is_none() {
            errors.push(FieldError::new("name", "Please enter a store name!"));
        }

        let point = match self.coordinates.as_deref() {
            Some([lng, lat]) => GeoPoint::new(*lng, *lat).ok(),
            _ => None,
        };
        if point.is_none() {
            errors.push(FieldError::new(
                "location.coordinates",
                "You must supply coordinates!",
            ));
        }

        let address = trimmed(self.address);
        if address.is_none() {
            errors.push(FieldError::new(
                "location.address",
                "You must supply an address!",
            ));
        }

        if self.author.is_none() {
            errors.push(FieldError::new("author", "You must supply an author"));
        }

        match (name, point, address, self.author) {
            (Some(name), Some(point), Some(address), Some(author)) if errors.is_empty() => {
                Ok(StoreFields {
                    name,
                    description: trimmed(self.description),
                    tags: clean_tags(self.tags),
                    location: Location { point, address },
                    photo: trimmed(self.photo),
                    author,
                })
            }
            _ => Err(ValidationError { fields: errors }),
        }
    }
}

/// Trims tags, drops empty ones and removes duplicates, keeping first-seen order.
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn validate_review(
    store: Uuid,
    author: Uuid,
    text: &str,
    rating: i32,
) -> Result<NewReview, ValidationError> {
    let mut errors = Vec::new();
    let text = text.trim();
    if text.is_empty() {
        errors.push(FieldError::new("text", "Your review must have text!"));
    }
    if !(1..=5).contains(&rating) {
        errors.push(FieldError::new("rating", "Rating must be between 1 and 5"));
    }
    if !errors.is_empty() {
        return Err(ValidationError { fields: errors });
    }
    Ok(NewReview {
        store,
        author,
        text: text.to_string(),
        rating,
    })
}

pub const MIN_PASSWORD_LEN: usize = 8;

/// Canonical form of an email address: trimmed and lower-cased. Accounts are
/// stored and looked up by this form only.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "You must supply a name!"));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.push(FieldError::new("email", "That Email is not valid!"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { fields: errors })
    }
}
