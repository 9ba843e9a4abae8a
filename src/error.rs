use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::report::model::ProjectType;

/// Severity of one worker diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Error,
    Warning,
    Info,
}

impl MessageLevel {
    /// Workers are not trusted to emit known tags; anything unrecognized
    /// degrades to `error` instead of failing result decoding.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "warning" => MessageLevel::Warning,
            "info" => MessageLevel::Info,
            _ => MessageLevel::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
            MessageLevel::Info => "info",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a diagnostic points at. Rendering problems are always attributed
/// to the design, since template and styles live there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Design,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLocation {
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub id: String,
    pub name: String,
}

impl MessageLocation {
    pub fn design(project_type: &ProjectType) -> Self {
        MessageLocation {
            kind: LocationType::Design,
            id: project_type.id.clone(),
            name: project_type.name.clone(),
        }
    }
}

/// One worker diagnostic, enriched with its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub level: MessageLevel,
    pub location: MessageLocation,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Failure surface of a render call. Normalization never fails; everything
/// here is either the worker rejecting the job or the transport breaking.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The worker produced no document and reported why. Carries the full
    /// ordered diagnostic list so callers can present every problem at
    /// once, not just the first.
    #[error("pdf rendering failed with {} diagnostic(s)", .messages.len())]
    Rendering { messages: Vec<ErrorMessage> },

    /// The worker produced neither a document nor diagnostics. Only raised
    /// with `RenderOptions::strict_empty_result`; the default behavior is a
    /// `Rendering` error with an empty message list.
    #[error("rendering worker produced no output for design {}", .location.name)]
    NoOutput { location: MessageLocation },

    #[error("job transport failed")]
    Transport(#[from] TransportError),

    #[error("worker returned a pdf payload that is not valid base64")]
    InvalidPdfEncoding(#[from] base64::DecodeError),
}

/// Faults of the job queue itself, distinct from worker-reported
/// rendering diagnostics
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("spool i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed job payload: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_tags_degrade_to_error() {
        assert_eq!(MessageLevel::from_tag("warning"), MessageLevel::Warning);
        assert_eq!(MessageLevel::from_tag("info"), MessageLevel::Info);
        assert_eq!(MessageLevel::from_tag("fatal"), MessageLevel::Error);
        assert_eq!(MessageLevel::from_tag(""), MessageLevel::Error);
    }

    #[test]
    fn location_serializes_with_design_tag() {
        let loc = MessageLocation {
            kind: LocationType::Design,
            id: "pt-1".into(),
            name: "Web App Report".into(),
        };
        let raw = serde_json::to_value(&loc).unwrap();
        assert_eq!(raw["type"], serde_json::json!("design"));
    }
}
