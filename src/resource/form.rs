use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
    }
}

/// Request input accepted from either a JSON object or a multipart form.
///
/// Scalars are kept as strings so both encodings are validated the same way.
/// Field names lose a trailing `[]`, so `views[]=a&views[]=b` and
/// `{"views": ["a", "b"]}` read identically.
#[derive(Debug, Default)]
pub struct FormInput {
    fields: HashMap<String, Vec<String>>,
    json: Option<Value>,
    uploads: Vec<Upload>,
}

impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
        Self::from_json(value)
    }
}

impl FormInput {
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        let Value::Object(map) = &value else {
            return Err(AppError::BadRequest("Request body must be a JSON object".to_string()));
        };
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, entry) in map {
            let values = fields.entry(field_name(key)).or_default();
            match entry {
                Value::Array(items) => values.extend(items.iter().filter_map(scalar)),
                other => values.extend(scalar(other)),
            }
        }
        Ok(Self {
            fields,
            json: Some(value),
            uploads: Vec::new(),
        })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut input = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field_name(field.name().unwrap_or_default());
            if field.file_name().is_some() {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if data.is_empty() {
                    continue;
                }
                input.uploads.push(Upload {
                    field: name,
                    content_type,
                    data,
                });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                input.fields.entry(name).or_default().push(text);
            }
        }
        Ok(input)
    }

    /// First non-blank value of a field, trimmed.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)?
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_string)
    }

    pub fn required(&self, key: &str) -> Result<String, AppError> {
        self.optional(key).ok_or_else(|| missing(key))
    }

    pub fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        self.text(key)
            .map(|raw| raw.parse().map_err(|_| invalid(key)))
            .transpose()
    }

    pub fn required_number<T: FromStr>(&self, key: &str) -> Result<T, AppError> {
        self.number(key)?.ok_or_else(|| missing(key))
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, AppError> {
        self.text(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(invalid(key)),
            })
            .transpose()
    }

    pub fn uuid(&self, key: &str) -> Result<Option<Uuid>, AppError> {
        self.text(key)
            .map(|raw| Uuid::parse_str(raw).map_err(|_| invalid(key)))
            .transpose()
    }

    pub fn required_uuid(&self, key: &str) -> Result<Uuid, AppError> {
        self.uuid(key)?.ok_or_else(|| missing(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All non-blank values of a list field. A single value holding a JSON
    /// array (as multipart clients often send) is expanded.
    pub fn list(&self, key: &str) -> Vec<String> {
        let Some(values) = self.fields.get(key) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for value in values {
            let trimmed = value.trim();
            if trimmed.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    out.extend(items.iter().filter_map(scalar));
                    continue;
                }
            }
            out.push(trimmed.to_string());
        }
        out.retain(|value| !value.trim().is_empty());
        out
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn uploads<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Upload> + 'a {
        self.uploads.iter().filter(move |upload| upload.field == field)
    }

    pub fn upload(&self, field: &str) -> Option<&Upload> {
        self.uploads.iter().find(|upload| upload.field == field)
    }
}

fn field_name(raw: &str) -> String {
    raw.trim_end_matches("[]").to_string()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn missing(key: &str) -> AppError {
    AppError::BadRequest(format!("{key} is required!"))
}

fn invalid(key: &str) -> AppError {
    AppError::BadRequest(format!("Invalid value for {key}"))
}
