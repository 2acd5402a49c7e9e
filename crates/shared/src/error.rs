use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mason error body: `{"@error": {"@message": ..., "@messages": [...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    #[serde(rename = "@error")]
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "@message")]
    pub message: String,
    #[serde(rename = "@messages", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl ErrorDocument {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            resource_url: None,
            error: ErrorBody {
                message: message.into(),
                messages: Vec::new(),
            },
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error.messages.push(details.into());
        self
    }

    pub fn with_resource_url(mut self, resource_url: impl Into<String>) -> Self {
        self.resource_url = Some(resource_url.into());
        self
    }
}

/// Raised when a payload cannot be turned into a typed representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("representation must be a JSON object")]
    NotAnObject,
    #[error("@controls must be a JSON object")]
    InvalidControls,
    #[error("control '{relation}' is invalid: {reason}")]
    InvalidControl { relation: String, reason: String },
    #[error("items must be an array")]
    InvalidItems,
    #[error("item {index} is invalid: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("collection representation has no items")]
    MissingItems,
    #[error("response body is not JSON: {0}")]
    Json(String),
}

/// Outcome of a failed fetch or send. Every variant is reported once and never retried.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("invalid href '{href}': {reason}")]
    InvalidHref { href: String, reason: String },
    #[error("network error requesting {href}: {reason}")]
    Network { href: String, reason: String },
    #[error("{href} answered {status}: {}", message.as_deref().unwrap_or("no message"))]
    Protocol {
        href: String,
        status: u16,
        message: Option<String>,
        details: Vec<String>,
    },
    #[error("malformed representation from {href}: {source}")]
    Decode {
        href: String,
        #[source]
        source: DecodeError,
    },
}

impl FetchError {
    /// Text shown in the notification slot.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::InvalidHref { .. } | FetchError::Network { .. } => {
                "Could not reach the server".to_string()
            }
            FetchError::Protocol {
                message: Some(message),
                ..
            } => message.clone(),
            FetchError::Protocol { status, .. } => format!("Request failed with status {status}"),
            FetchError::Decode { .. } => "Malformed response from server".to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}
