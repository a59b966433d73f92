//! Error types for building and inspecting messages.

use thiserror::Error;

use crate::schema::FieldKind;

/// Errors raised when a message is populated through its schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageError {
    /// The schema has no field with this name.
    #[error("{message} has no field named `{field}`")]
    UnknownField {
        message: &'static str,
        field: String,
    },

    /// The value does not fit the field's declared kind.
    #[error("field `{field}` of {message} expects {expected:?}, got {got}")]
    KindMismatch {
        message: &'static str,
        field: &'static str,
        expected: FieldKind,
        got: &'static str,
    },

    /// The schema does not declare a request-id field.
    #[error("{message} does not carry a request id")]
    NoRequestId { message: &'static str },

    /// Value vector length does not match the schema.
    #[error("{message} expects {expected} values, got {got}")]
    Arity {
        message: &'static str,
        expected: usize,
        got: usize,
    },
}
