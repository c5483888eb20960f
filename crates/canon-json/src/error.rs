//! Encode and decode error types.

use thiserror::Error;

/// Error returned by custom encode/decode hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode unregistered type `{0}`")]
    UnregisteredType(String),
    #[error("type `{0}` is not defined")]
    UnknownType(String),
    #[error("unsupported shape: {0}")]
    UnsupportedShape(&'static str),
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
    #[error("{found} value does not match declared {expected} shape")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{value} is out of range for {format}")]
    OutOfRange { format: &'static str, value: String },
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("type `{type_name}` does not implement interface `{interface}`")]
    NotImplemented { type_name: String, interface: String },
    #[error("nesting depth exceeds {0}")]
    DepthLimit(usize),
    #[error("custom encoder for `{type_name}` failed: {source}")]
    Custom {
        type_name: String,
        #[source]
        source: HookError,
    },
    #[error("custom encoder for `{0}` produced invalid JSON")]
    InvalidCustomOutput(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
    #[error("expected {expected} at byte {offset}, found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },
    #[error("unregistered type tag `{0}`")]
    UnregisteredType(String),
    #[error("type `{0}` is not defined")]
    UnknownType(String),
    #[error("unsupported shape: {0}")]
    UnsupportedShape(&'static str),
    #[error("invalid 64-bit integer string {text:?} at byte {offset}")]
    InvalidInteger { text: String, offset: usize },
    #[error("{text} at byte {offset} is out of range for {format}")]
    OutOfRange {
        format: &'static str,
        text: String,
        offset: usize,
    },
    #[error("invalid base64 at byte {offset}: {source}")]
    InvalidBase64 {
        offset: usize,
        #[source]
        source: base64::DecodeError,
    },
    #[error("invalid timestamp {text:?}: {reason}")]
    InvalidTimestamp { text: String, reason: String },
    #[error("got {actual} elements, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("invalid interface envelope: {0}")]
    InvalidEnvelope(&'static str),
    #[error("type `{type_name}` does not implement interface `{interface}`")]
    NotImplemented { type_name: String, interface: String },
    #[error("expected type `{expected}`, found `{found}`")]
    UnexpectedType { expected: String, found: String },
    #[error("type `{0}` contains itself by value")]
    RecursiveType(String),
    #[error("nesting depth exceeds {0}")]
    DepthLimit(usize),
    #[error("custom decoder for `{type_name}` failed: {source}")]
    Custom {
        type_name: String,
        #[source]
        source: HookError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = EncodeError::UnregisteredType("main.Boat".into());
        assert_eq!(err.to_string(), "cannot encode unregistered type `main.Boat`");

        let err = DecodeError::ShapeMismatch {
            expected: "array",
            found: "object",
            offset: 3,
        };
        assert_eq!(err.to_string(), "expected array at byte 3, found object");
    }

    #[test]
    fn custom_error_keeps_source() {
        use std::error::Error as _;

        let err = DecodeError::Custom {
            type_name: "T".into(),
            source: "boom".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("boom"));
    }
}
