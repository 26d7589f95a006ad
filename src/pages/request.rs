use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::UserId;
use crate::database::Fields;

/// Body keys a client might use to claim ownership; always ignored
const CLIENT_OWNERSHIP_FIELDS: &[&str] = &["ownerId", "owner_id", "owner", "userId", "user_id"];

/// How strictly incoming page payloads are checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub reject_empty_fields: bool,
    pub max_title_length: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            reject_empty_fields: false,
            max_title_length: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("{}", describe_fields(.0))]
    Fields(BTreeMap<String, String>),
}

impl ValidationError {
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ValidationError::Fields(fields) => fields.clone(),
            _ => BTreeMap::new(),
        }
    }
}

fn describe_fields(fields: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("invalid fields ({})", parts.join("; "))
}

/// Typed create-page input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCreateRequest {
    pub title: String,
    pub content: String,
}

impl PageCreateRequest {
    /// Parse a raw body and apply the validation policy.
    ///
    /// Only `title` and `content` are read; every other key is dropped.
    pub fn from_json(body: &[u8], policy: &ValidationPolicy) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidJson)?;
        let Value::Object(object) = value else {
            return Err(ValidationError::NotAnObject);
        };

        if CLIENT_OWNERSHIP_FIELDS.iter().any(|key| object.contains_key(*key)) {
            tracing::warn!("ignoring client-supplied ownership field in page payload");
        }

        let mut errors = BTreeMap::new();
        let title = string_field(&object, "title", &mut errors);
        let content = string_field(&object, "content", &mut errors);

        if let Some(title) = &title {
            if policy.reject_empty_fields && title.trim().is_empty() {
                errors.insert("title".to_string(), "This field must not be empty".to_string());
            } else if title.chars().count() > policy.max_title_length {
                errors.insert(
                    "title".to_string(),
                    format!("Must be at most {} characters", policy.max_title_length),
                );
            }
        }
        if let Some(content) = &content {
            if policy.reject_empty_fields && content.trim().is_empty() {
                errors.insert("content".to_string(), "This field must not be empty".to_string());
            }
        }

        match (title, content) {
            (Some(title), Some(content)) if errors.is_empty() => Ok(Self { title, content }),
            _ => Err(ValidationError::Fields(errors)),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str, errors: &mut BTreeMap<String, String>) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => {
            errors.insert(key.to_string(), "This field is required".to_string());
            None
        }
        Some(_) => {
            errors.insert(key.to_string(), "Must be a string".to_string());
            None
        }
    }
}

/// A page as handed to storage, owner stamped by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
}

impl PageRecord {
    pub fn new(request: PageCreateRequest, owner_id: UserId) -> Self {
        Self {
            title: request.title,
            content: request.content,
            owner_id,
        }
    }

    /// Storage payload, writing the owner under the configured column
    pub fn into_fields(self, owner_column: &str) -> Fields {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::String(self.title));
        fields.insert("content".to_string(), Value::String(self.content));
        fields.insert(owner_column.to_string(), Value::String(self.owner_id.to_string()));
        fields
    }
}
