//! Reply extraction.
//!
//! Two strategies turn a provider's raw text into an [`ExtractedTurn`]:
//!
//! - [`StrictExtractor`] expects the whole reply to be one JSON object that
//!   satisfies the full schema and fails otherwise.
//! - [`TolerantExtractor`] digs the first flat JSON object out of surrounding
//!   prose and fills every gap with a default. It never fails.
//!
//! Both are bound to the [`SystemPromptVersion`] whose template described the
//! schema to the model.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::prompt::SystemPromptVersion;
use super::turn::ExtractedTurn;

/// Strict reply when the model has nothing left to ask.
pub const NO_FURTHER_QUESTIONS: &str = "No further questions to ask.";

/// Tolerant reply when the model is done gathering requirements.
pub const READY_TO_BUILD: &str =
    "I can write this as a Snapp if you're ready. Just click the \"Build Snapp\" button.";

/// First brace-delimited object without nested braces.
static FLAT_JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("static pattern compiles"));

/// Which strategy a provider's replies are read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionMode {
    Strict,
    Tolerant,
}

/// Errors from strict extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Reply does not match the expected schema: {0}")]
    SchemaViolation(String),
}

/// Full reply schema of template V1.
#[derive(Debug, Deserialize)]
struct StrictReplyV1 {
    #[serde(rename = "haveIAlreadyAskedTheseQuestions")]
    have_i_already_asked_these_questions: bool,
    #[serde(rename = "newQuestionsToConfirmUnderstanding", default)]
    new_questions_to_confirm_understanding: Option<Vec<String>>,
    #[serde(rename = "requirementsSoFar", default)]
    requirements_so_far: Option<String>,
    #[serde(rename = "responseActions", default)]
    response_actions: Vec<String>,
}

/// Parses the entire reply against the full schema.
#[derive(Debug, Clone)]
pub struct StrictExtractor {
    version: SystemPromptVersion,
    permitted_actions: Vec<String>,
}

impl StrictExtractor {
    /// Creates an extractor that keeps only `permitted_actions` keys.
    pub fn new(version: SystemPromptVersion, permitted_actions: Vec<String>) -> Self {
        Self {
            version,
            permitted_actions,
        }
    }

    pub fn version(&self) -> SystemPromptVersion {
        self.version
    }

    /// Extracts the turn from a reply that must be pure JSON.
    ///
    /// # Errors
    ///
    /// - `InvalidJson` if the text is not JSON
    /// - `SchemaViolation` if a required field is missing or mistyped. The
    ///   question list is required whenever the flag is `false`.
    pub fn extract(&self, raw: &str) -> Result<ExtractedTurn, ExtractionError> {
        let text = raw.trim();
        let text = if text.is_empty() { "{}" } else { text };

        let value: JsonValue = serde_json::from_str(text)
            .map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;

        match self.version {
            SystemPromptVersion::V1 => {
                let reply: StrictReplyV1 = serde_json::from_value(value)
                    .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;
                tracing::debug!(?reply, "parsed strict reply");

                let message = if reply.have_i_already_asked_these_questions {
                    NO_FURTHER_QUESTIONS.to_string()
                } else {
                    reply
                        .new_questions_to_confirm_understanding
                        .ok_or_else(|| {
                            ExtractionError::SchemaViolation(
                                "missing field `newQuestionsToConfirmUnderstanding`".to_string(),
                            )
                        })?
                        .into_iter()
                        .next()
                        .unwrap_or_default()
                };

                Ok(ExtractedTurn::new(
                    reply.requirements_so_far.unwrap_or_default(),
                    message,
                    keep_permitted(reply.response_actions, &self.permitted_actions),
                ))
            }
        }
    }
}

/// Finds the first flat JSON object anywhere in the reply and reads it leniently.
#[derive(Debug, Clone)]
pub struct TolerantExtractor {
    version: SystemPromptVersion,
    permitted_actions: Vec<String>,
}

impl TolerantExtractor {
    /// Creates an extractor that keeps only `permitted_actions` keys.
    pub fn new(version: SystemPromptVersion, permitted_actions: Vec<String>) -> Self {
        Self {
            version,
            permitted_actions,
        }
    }

    pub fn version(&self) -> SystemPromptVersion {
        self.version
    }

    /// Extracts the turn. Malformed or missing JSON reads as `{}`.
    pub fn extract(&self, raw: &str) -> ExtractedTurn {
        let object = first_flat_object(raw);
        tracing::debug!(?object, "parsed tolerant reply");

        match self.version {
            SystemPromptVersion::V1 => {
                let asked = object
                    .get("haveIAlreadyAskedTheseQuestions")
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false);
                let question = object
                    .get("questionsAsASingleMessage")
                    .and_then(JsonValue::as_str);
                let done = asked || question.is_none();

                let message = if done {
                    READY_TO_BUILD.to_string()
                } else {
                    question.unwrap_or_default().to_string()
                };

                let requirements = object
                    .get("requirementsSoFar")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default();

                let actions = object
                    .get("responseActions")
                    .and_then(JsonValue::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(JsonValue::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                ExtractedTurn::new(
                    requirements,
                    message,
                    keep_permitted(actions, &self.permitted_actions),
                )
            }
        }
    }
}

fn first_flat_object(raw: &str) -> Map<String, JsonValue> {
    FLAT_JSON_OBJECT
        .find(raw)
        .and_then(|m| serde_json::from_str::<JsonValue>(m.as_str()).ok())
        .and_then(|value| match value {
            JsonValue::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

fn keep_permitted(actions: Vec<String>, permitted: &[String]) -> Vec<String> {
    actions
        .into_iter()
        .filter(|action| permitted.contains(action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::turn::DEFAULT_MESSAGE_TO_USER;

    fn strict() -> StrictExtractor {
        StrictExtractor::new(SystemPromptVersion::V1, vec!["CREATE_FLOW".into()])
    }

    fn tolerant() -> TolerantExtractor {
        TolerantExtractor::new(SystemPromptVersion::V1, vec!["CREATE_FLOW".into()])
    }

    // ----- strict -----

    #[test]
    fn strict_already_asked_yields_no_further_questions() {
        let turn = strict()
            .extract(r#"{"haveIAlreadyAskedTheseQuestions":true}"#)
            .unwrap();
        assert_eq!(turn.message_to_user(), "No further questions to ask.");
    }

    #[test]
    fn strict_not_asked_yields_first_pending_question() {
        let turn = strict()
            .extract(
                r#"{"haveIAlreadyAskedTheseQuestions":false,
                    "newQuestionsToConfirmUnderstanding":["Which sheet?","How often?"]}"#,
            )
            .unwrap();
        assert_eq!(turn.message_to_user(), "Which sheet?");
    }

    #[test]
    fn strict_missing_flag_is_schema_violation() {
        let err = strict()
            .extract(r#"{"newQuestionsToConfirmUnderstanding":["x"]}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn strict_mistyped_flag_is_schema_violation() {
        let err = strict()
            .extract(r#"{"haveIAlreadyAskedTheseQuestions":"yes"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn strict_empty_reply_is_schema_violation() {
        let err = strict().extract("").unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn strict_prose_is_invalid_json() {
        let err = strict()
            .extract(r#"Sure! {"haveIAlreadyAskedTheseQuestions":true}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn strict_empty_question_list_falls_back_to_default_message() {
        let turn = strict()
            .extract(
                r#"{"haveIAlreadyAskedTheseQuestions":false,
                    "newQuestionsToConfirmUnderstanding":[]}"#,
            )
            .unwrap();
        assert_eq!(turn.message_to_user(), DEFAULT_MESSAGE_TO_USER);
    }

    #[test]
    fn strict_missing_question_list_is_schema_violation() {
        let err = strict()
            .extract(r#"{"haveIAlreadyAskedTheseQuestions":false}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn strict_mistyped_question_list_is_schema_violation() {
        let err = strict()
            .extract(
                r#"{"haveIAlreadyAskedTheseQuestions":false,
                    "newQuestionsToConfirmUnderstanding":"Which sheet?"}"#,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn strict_keeps_only_permitted_actions() {
        let turn = strict()
            .extract(
                r#"{"haveIAlreadyAskedTheseQuestions":true,
                    "requirementsSoFar":"daily digest",
                    "responseActions":["DELETE_EVERYTHING","CREATE_FLOW"]}"#,
            )
            .unwrap();
        assert_eq!(turn.response_actions(), ["CREATE_FLOW".to_string()]);
        assert_eq!(turn.requirements_so_far(), "daily digest");
    }

    // ----- tolerant -----

    #[test]
    fn tolerant_without_json_is_ready_to_build() {
        let turn = tolerant().extract("I think we have everything we need.");
        assert_eq!(turn.message_to_user(), READY_TO_BUILD);
    }

    #[test]
    fn tolerant_reads_json_wrapped_in_prose() {
        let turn = tolerant().extract(
            "Here you go:\n{\"haveIAlreadyAskedTheseQuestions\": false, \
             \"questionsAsASingleMessage\": \"Which inbox should I watch?\"}\nThanks!",
        );
        assert_eq!(turn.message_to_user(), "Which inbox should I watch?");
    }

    #[test]
    fn tolerant_flag_wins_over_question() {
        let turn = tolerant().extract(
            r#"{"haveIAlreadyAskedTheseQuestions": true, "questionsAsASingleMessage": "More?"}"#,
        );
        assert_eq!(turn.message_to_user(), READY_TO_BUILD);
    }

    #[test]
    fn tolerant_missing_question_means_done() {
        let turn = tolerant().extract(r#"{"haveIAlreadyAskedTheseQuestions": false}"#);
        assert_eq!(turn.message_to_user(), READY_TO_BUILD);
    }

    #[test]
    fn tolerant_malformed_json_reads_as_empty_object() {
        let turn = tolerant().extract("{not json at all}");
        assert_eq!(turn.message_to_user(), READY_TO_BUILD);
    }

    #[test]
    fn tolerant_mistyped_fields_read_as_absent() {
        let turn = tolerant().extract(
            r#"{"haveIAlreadyAskedTheseQuestions": "no", "questionsAsASingleMessage": "Where?"}"#,
        );
        assert_eq!(turn.message_to_user(), "Where?");
    }

    #[test]
    fn tolerant_takes_first_flat_object() {
        let turn = tolerant().extract(
            r#"{"questionsAsASingleMessage": "First?"} and {"questionsAsASingleMessage": "Second?"}"#,
        );
        assert_eq!(turn.message_to_user(), "First?");
    }

    #[test]
    fn tolerant_filters_actions() {
        let turn = tolerant().extract(
            r#"{"questionsAsASingleMessage": "Ok?", "responseActions": ["CREATE_FLOW", 3, "RUN_FLOW"]}"#,
        );
        assert_eq!(turn.response_actions(), ["CREATE_FLOW".to_string()]);
    }
}
