//! Foundation module - Shared domain primitives.
//!
//! Contains value objects and the error vocabulary shared by every
//! stage of a conversation turn.

mod errors;
mod timestamp;

pub use errors::{
    classify, ErrorClassification, ErrorKind, ValidationError, TERMINAL_ERROR_KINDS,
};
pub use timestamp::Timestamp;
