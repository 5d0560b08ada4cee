//! Error types for the domain layer.
//!
//! Every failure a turn can hit is reduced to an [`ErrorKind`]. Whether the
//! turn is retried is a pure function of that kind, see [`classify`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that occur while checking the shape of inbound data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    MissingField { field: String },

    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("Field '{field}' has invalid value: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    /// Creates a missing field validation error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        ValidationError::MissingField { field: field.into() }
    }

    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a wrong type validation error.
    pub fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        ValidationError::WrongType {
            field: field.into(),
            expected,
        }
    }

    /// Creates an invalid value validation error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::EmptyField { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::InvalidValue { field, .. } => field,
        }
    }

    /// Prefixes the field path, e.g. `value` becomes `extraContext[2].value`.
    pub fn within(self, parent: &str) -> Self {
        let nest = |field: String| format!("{}.{}", parent, field);
        match self {
            ValidationError::MissingField { field } => ValidationError::MissingField {
                field: nest(field),
            },
            ValidationError::EmptyField { field } => ValidationError::EmptyField {
                field: nest(field),
            },
            ValidationError::WrongType { field, expected } => ValidationError::WrongType {
                field: nest(field),
                expected,
            },
            ValidationError::InvalidValue { field, reason } => ValidationError::InvalidValue {
                field: nest(field),
                reason,
            },
        }
    }
}

/// Closed set of failure kinds a turn can end with.
///
/// The string form is what downstream consumers see in `errorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Inbound body was not JSON.
    #[serde(rename = "BodyJSONParseError")]
    BodyJsonParse,
    /// Inbound body failed shape checks.
    #[serde(rename = "RequestBodyValidationError")]
    RequestBodyValidation,
    /// A required setting was absent.
    #[serde(rename = "EnvironmentVariableError")]
    EnvironmentVariable,
    /// The prompt could not be built for the selected provider.
    #[serde(rename = "ChatPromptCreationError")]
    ChatPromptCreation,
    /// Network or provider-side failure.
    #[serde(rename = "ProviderInvocationError")]
    ProviderInvocation,
    /// Strict extraction found a reply that violates the schema.
    #[serde(rename = "ResponseSchemaError")]
    ResponseSchema,
    /// Credential lookup failed.
    #[serde(rename = "SecretRetrievalError")]
    SecretRetrieval,
    /// The outcome event could not be published.
    #[serde(rename = "EventPublicationError")]
    EventPublication,
}

/// Kinds that end a turn with an error event instead of a redelivery.
pub const TERMINAL_ERROR_KINDS: [ErrorKind; 4] = [
    ErrorKind::BodyJsonParse,
    ErrorKind::EnvironmentVariable,
    ErrorKind::RequestBodyValidation,
    ErrorKind::ChatPromptCreation,
];

impl ErrorKind {
    /// Identifier published as `errorType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BodyJsonParse => "BodyJSONParseError",
            ErrorKind::RequestBodyValidation => "RequestBodyValidationError",
            ErrorKind::EnvironmentVariable => "EnvironmentVariableError",
            ErrorKind::ChatPromptCreation => "ChatPromptCreationError",
            ErrorKind::ProviderInvocation => "ProviderInvocationError",
            ErrorKind::ResponseSchema => "ResponseSchemaError",
            ErrorKind::SecretRetrieval => "SecretRetrievalError",
            ErrorKind::EventPublication => "EventPublicationError",
        }
    }

    /// Returns true if this kind is in the terminal set.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_ERROR_KINDS.contains(self)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry decision for a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorClassification {
    pub retryable: bool,
    pub kind: ErrorKind,
}

/// Classifies an error kind. Anything outside the terminal set is retryable.
pub fn classify(kind: ErrorKind) -> ErrorClassification {
    ErrorClassification {
        retryable: !kind.is_terminal(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_missing_field_displays_correctly() {
        let err = ValidationError::missing_field("conversationId");
        assert_eq!(format!("{}", err), "Field 'conversationId' is required");
    }

    #[test]
    fn validation_error_wrong_type_displays_correctly() {
        let err = ValidationError::wrong_type("value", "a string");
        assert_eq!(format!("{}", err), "Field 'value' must be a string");
    }

    #[test]
    fn within_prefixes_field_path() {
        let err = ValidationError::missing_field("workflowId").within("extraContext[1].value");
        assert_eq!(err.field(), "extraContext[1].value.workflowId");
    }

    #[test]
    fn terminal_kinds_are_not_retryable() {
        for kind in TERMINAL_ERROR_KINDS {
            let classification = classify(kind);
            assert!(!classification.retryable, "{} should be terminal", kind);
            assert_eq!(classification.kind, kind);
        }
    }

    #[test]
    fn everything_else_is_retryable() {
        for kind in [
            ErrorKind::ProviderInvocation,
            ErrorKind::ResponseSchema,
            ErrorKind::SecretRetrieval,
            ErrorKind::EventPublication,
        ] {
            assert!(classify(kind).retryable, "{} should be retryable", kind);
        }
    }

    #[test]
    fn error_kind_serializes_as_identifier() {
        let json = serde_json::to_string(&ErrorKind::RequestBodyValidation).unwrap();
        assert_eq!(json, "\"RequestBodyValidationError\"");
        assert_eq!(
            serde_json::to_string(&ErrorKind::BodyJsonParse).unwrap(),
            format!("\"{}\"", ErrorKind::BodyJsonParse.as_str())
        );
    }
}
