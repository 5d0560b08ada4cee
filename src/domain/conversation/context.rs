//! Background context attached to a conversation.
//!
//! Contexts arrive as `{contextType, value}` pairs. The tag decides the shape
//! of `value`; [`ChatContext::from_raw`] checks that the two agree before
//! anything is rendered into the system prompt.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Heading used for the requirements block.
pub const REQUIREMENTS_HEADING: &str = "## Requirements so far";

/// Heading used for the workflow definition block.
pub const WORKFLOW_DEFINITION_HEADING: &str = "## Description of workflow User is referring to";

/// Block rendered when a workflow definition carries no description.
pub const WORKFLOW_DESCRIPTION_MISSING: &str =
    "## There was an error getting the workflow description.";

/// Tags a context entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextType {
    Requirements,
    WorkflowDefinition,
    WorkflowRunInstance,
}

impl ContextType {
    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Requirements => "REQUIREMENTS",
            ContextType::WorkflowDefinition => "WORKFLOW_DEFINITION",
            ContextType::WorkflowRunInstance => "WORKFLOW_RUN_INSTANCE",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUIREMENTS" => Ok(ContextType::Requirements),
            "WORKFLOW_DEFINITION" => Ok(ContextType::WorkflowDefinition),
            "WORKFLOW_RUN_INSTANCE" => Ok(ContextType::WorkflowRunInstance),
            other => Err(ContextError::UnknownContextType(other.to_string())),
        }
    }
}

/// Errors raised while turning a raw context into a renderable one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("No context renderer registered for context type: {0}")]
    UnknownContextType(String),

    #[error("Invalid {context_type} context: {source}")]
    InvalidValue {
        context_type: ContextType,
        #[source]
        source: ValidationError,
    },
}

/// A context entry exactly as it arrived on the wire.
///
/// Kept verbatim so that contexts can be passed through to the outbound
/// event untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChatContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<String>,
    #[serde(default)]
    pub value: JsonValue,
}

impl RawChatContext {
    /// Creates a raw context with the given tag and value.
    pub fn new(context_type: ContextType, value: JsonValue) -> Self {
        Self {
            context_type: Some(context_type.as_str().to_string()),
            value,
        }
    }

    /// Returns true if the entry is tagged with `context_type`.
    pub fn is(&self, context_type: ContextType) -> bool {
        self.context_type.as_deref() == Some(context_type.as_str())
    }
}

/// Workflow the user is talking about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub workflow_description: String,
}

/// A validated context entry. Tag and value shape agree by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatContext {
    /// Requirements gathered so far, as free text.
    Requirements(String),
    /// The workflow the conversation refers to.
    WorkflowDefinition(WorkflowDefinition),
    /// Reserved; contributes nothing to the prompt.
    WorkflowRunInstance(JsonValue),
}

impl ChatContext {
    /// Validates a raw entry.
    ///
    /// Returns `Ok(None)` for entries without a tag, which are skipped.
    pub fn from_raw(raw: &RawChatContext) -> Result<Option<Self>, ContextError> {
        let Some(tag) = raw.context_type.as_deref() else {
            return Ok(None);
        };
        let context_type: ContextType = tag.parse()?;
        let invalid = |source: ValidationError| ContextError::InvalidValue {
            context_type,
            source,
        };

        if raw.value.is_null() {
            return Err(invalid(ValidationError::missing_field("value")));
        }

        let context = match context_type {
            ContextType::Requirements => {
                let text = raw
                    .value
                    .as_str()
                    .ok_or_else(|| invalid(ValidationError::wrong_type("value", "a string")))?;
                if text.is_empty() {
                    return Err(invalid(ValidationError::empty_field("value")));
                }
                ChatContext::Requirements(text.to_string())
            }
            ContextType::WorkflowDefinition => {
                ChatContext::WorkflowDefinition(parse_workflow_definition(&raw.value).map_err(invalid)?)
            }
            ContextType::WorkflowRunInstance => ChatContext::WorkflowRunInstance(raw.value.clone()),
        };

        Ok(Some(context))
    }

    /// Tag of this entry.
    pub fn context_type(&self) -> ContextType {
        match self {
            ChatContext::Requirements(_) => ContextType::Requirements,
            ChatContext::WorkflowDefinition(_) => ContextType::WorkflowDefinition,
            ChatContext::WorkflowRunInstance(_) => ContextType::WorkflowRunInstance,
        }
    }

    /// Renders the entry as a system-prompt block.
    pub fn render(&self) -> String {
        match self {
            ChatContext::Requirements(text) => format!("{}\n{}", REQUIREMENTS_HEADING, text),
            ChatContext::WorkflowDefinition(definition) => {
                if definition.workflow_description.trim().is_empty() {
                    tracing::error!(
                        workflow_id = %definition.workflow_id,
                        "There was an error getting the workflow description."
                    );
                    WORKFLOW_DESCRIPTION_MISSING.to_string()
                } else {
                    format!(
                        "{}\n{}",
                        WORKFLOW_DEFINITION_HEADING, definition.workflow_description
                    )
                }
            }
            ChatContext::WorkflowRunInstance(_) => String::new(),
        }
    }
}

fn parse_workflow_definition(value: &JsonValue) -> Result<WorkflowDefinition, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type("value", "an object"))?;

    let workflow_description = match object.get("workflowDescription") {
        None | Some(JsonValue::Null) => {
            return Err(ValidationError::missing_field("value.workflowDescription"))
        }
        Some(JsonValue::String(s)) => s.clone(),
        Some(_) => {
            return Err(ValidationError::wrong_type(
                "value.workflowDescription",
                "a string",
            ))
        }
    };

    let workflow_id = match object.get("workflowId") {
        None | Some(JsonValue::Null) => {
            return Err(ValidationError::missing_field("value.workflowId"))
        }
        Some(JsonValue::String(s)) if s.is_empty() => {
            return Err(ValidationError::empty_field("value.workflowId"))
        }
        Some(JsonValue::String(s)) => s.clone(),
        Some(_) => return Err(ValidationError::wrong_type("value.workflowId", "a string")),
    };

    Ok(WorkflowDefinition {
        workflow_id,
        workflow_description,
    })
}
