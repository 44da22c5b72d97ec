//! Error types for the row-literal codec.

use thiserror::Error;

/// Errors produced while encoding or decoding row literals.
///
/// Every variant carries enough context (field name, position, offending
/// value) to locate the defect without re-running the codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The input text is not a well-formed row literal.
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset into the (trimmed) input where the error occurred.
        position: usize,
        message: String,
    },

    /// A token could not be converted to the target field type.
    #[error("decode error: field {field:?} (position {position}): cannot parse {value:?} as {expected}: {reason}")]
    TypeMismatch {
        field: String,
        position: usize,
        value: String,
        expected: &'static str,
        reason: String,
    },

    /// A field tag or field configuration is invalid.
    #[error("validation error: field {field:?} with tag {tag:?}: {message}")]
    Validation {
        field: String,
        tag: String,
        message: String,
    },

    /// A field value could not be encoded.
    #[error("encode error: field {field:?} (position {position}): cannot encode value: {reason}")]
    Encode {
        field: String,
        position: usize,
        reason: String,
    },

    /// An empty string was passed to the decoder.
    #[error("input string is empty")]
    EmptyInput,
}

impl Error {
    /// Create a parse error at the given byte offset.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a type mismatch error. Field name and position are filled in
    /// later by the decoder, which knows which field it is driving.
    pub fn mismatch(value: impl Into<String>, expected: &'static str, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            field: String::new(),
            position: 0,
            value: value.into(),
            expected,
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Attach field context to an error that was raised below the field
    /// layer. Parse and validation errors pass through untouched.
    pub(crate) fn with_field(self, name: &str, position: usize) -> Self {
        match self {
            Self::TypeMismatch {
                value,
                expected,
                reason,
                ..
            } => Self::TypeMismatch {
                field: name.to_owned(),
                position,
                value,
                expected,
                reason,
            },
            Self::Validation { tag, message, field } if field.is_empty() => Self::Validation {
                field: name.to_owned(),
                tag,
                message,
            },
            other => other,
        }
    }
}

/// Result type alias for codec operations.
pub type RowResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse(7, "unclosed quoted string");
        assert_eq!(
            err.to_string(),
            "parse error at position 7: unclosed quoted string"
        );
    }

    #[test]
    fn test_with_field_enriches_mismatch() {
        let err = Error::mismatch("abc", "i64", "invalid digit").with_field("zip_code", 3);
        match err {
            Error::TypeMismatch { field, position, .. } => {
                assert_eq!(field, "zip_code");
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
