use serde_json::Value;
use shared::error::ErrorDocument;
use tracing::info;

use crate::store::{Sensor, SensorStore, StoreError};

#[derive(Clone)]
pub struct ApiContext {
    pub store: SensorStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Validation,
    Conflict,
    UnsupportedMediaType,
}

impl ErrorCode {
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::Validation => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::UnsupportedMediaType => 415,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub title: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            details: Some(details.into()),
        }
    }

    pub fn document(&self, resource_url: &str) -> ErrorDocument {
        let doc = ErrorDocument::new(self.title.clone()).with_resource_url(resource_url);
        match &self.details {
            Some(details) => doc.with_details(details.clone()),
            None => doc,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::NotFound(_) => ApiError::new(ErrorCode::NotFound, "Not found", value.to_string()),
            StoreError::Duplicate(_) => {
                ApiError::new(ErrorCode::Conflict, "Already exists", value.to_string())
            }
        }
    }
}

/// Validated body of a create or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInput {
    pub name: String,
    pub model: String,
}

/// Checks the request against the sensor schema: JSON object, string `name` and `model`.
pub fn parse_sensor_input(content_type: Option<&str>, body: &[u8]) -> Result<SensorInput, ApiError> {
    let is_json = content_type
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::new(
            ErrorCode::UnsupportedMediaType,
            "Unsupported media type",
            "Requests must be JSON",
        ));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        ApiError::new(ErrorCode::Validation, "Invalid JSON document", e.to_string())
    })?;
    let Value::Object(object) = value else {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "Invalid JSON document",
            "document must be an object",
        ));
    };

    let mut fields = Vec::with_capacity(2);
    for name in ["name", "model"] {
        match object.get(name) {
            Some(Value::String(text)) => fields.push(text.clone()),
            Some(other) => {
                return Err(ApiError::new(
                    ErrorCode::Validation,
                    "Invalid JSON document",
                    format!("{other} is not of type 'string'"),
                ))
            }
            None => {
                return Err(ApiError::new(
                    ErrorCode::Validation,
                    "Invalid JSON document",
                    format!("'{name}' is a required property"),
                ))
            }
        }
    }
    let model = fields.pop().unwrap_or_default();
    let name = fields.pop().unwrap_or_default();

    if name.is_empty() || name.contains('/') {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "Invalid JSON document",
            "name must be a non-empty path segment",
        ));
    }

    Ok(SensorInput { name, model })
}

pub async fn list_sensors(ctx: &ApiContext) -> Vec<Sensor> {
    ctx.store.list().await
}

pub async fn get_sensor(ctx: &ApiContext, name: &str) -> Result<Sensor, ApiError> {
    ctx.store
        .get(name)
        .await
        .ok_or_else(|| StoreError::NotFound(name.to_string()).into())
}

pub async fn create_sensor(ctx: &ApiContext, input: SensorInput) -> Result<Sensor, ApiError> {
    let sensor = Sensor::new(input.name, input.model);
    ctx.store.insert(sensor.clone()).await?;
    info!(name = %sensor.name, "sensor created");
    Ok(sensor)
}

pub async fn update_sensor(ctx: &ApiContext, name: &str, input: SensorInput) -> Result<(), ApiError> {
    ctx.store.update(name, &input.name, &input.model).await?;
    info!(name, new_name = %input.name, "sensor updated");
    Ok(())
}

pub async fn delete_sensor(ctx: &ApiContext, name: &str) -> Result<(), ApiError> {
    ctx.store.remove(name).await?;
    info!(name, "sensor deleted");
    Ok(())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
