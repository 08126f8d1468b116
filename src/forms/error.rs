use serde_json::json;
use thiserror::Error;

/// Status used when no HTTP status was received (connect failure, timeout,
/// undecodable body).
pub const NO_STATUS: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{status}] {message}")]
pub struct TransportError {
    pub status: u16,
    pub message: String,
}

impl TransportError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NO_STATUS, message)
    }

    /// 401/403 from the back end: the session is missing or lacks rights.
    pub fn is_auth(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, "is required")
    }

    pub fn numeric(field: &str) -> Self {
        Self::new(field, "must be numeric")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed label: {label:?}")]
pub struct MalformedLabelError {
    pub label: String,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    MalformedLabel(#[from] MalformedLabelError),
    #[error("{0}")]
    NoSelection(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{relation} has no visible option with id {id}")]
    NotVisible { relation: String, id: i64 },
    #[error("{noun} {id} not found")]
    NotFound { noun: &'static str, id: i64 },
    #[error("unknown {what}: {name}")]
    Unknown { what: &'static str, name: String },
    #[error("a save is already in progress")]
    SaveInProgress,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FormError {
    /// Stable code used in the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            FormError::Transport(e) if e.is_auth() => "unauthorized",
            FormError::Transport(_) => "transport_failed",
            FormError::Validation(_) => "validation_failed",
            FormError::MalformedLabel(_) => "malformed_label",
            FormError::NoSelection(_) => "no_selection",
            FormError::Forbidden(_) => "forbidden",
            FormError::NotVisible { .. } => "not_visible",
            FormError::NotFound { .. } => "not_found",
            FormError::Unknown { .. } => "bad_params",
            FormError::SaveInProgress => "save_in_progress",
            FormError::InvalidResponse(_) => "transport_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            FormError::Transport(e) => Some(json!({ "status": e.status })),
            FormError::Validation(e) => Some(json!({ "field": e.field, "reason": e.reason })),
            FormError::MalformedLabel(e) => Some(json!({ "label": e.label })),
            FormError::NotVisible { relation, id } => {
                Some(json!({ "relation": relation, "id": id }))
            }
            _ => None,
        }
    }
}
