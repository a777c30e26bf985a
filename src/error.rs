//! All error types for the locmerge crate.
//!
//! Parse failures are attributable to one named source through
//! [`Error::in_source`]. Merge conflicts are never errors: they are reported as
//! values by the merge engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{name}: {source}")]
    InSource {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a new malformed-input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed(message.into())
    }

    /// Creates a new validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Attributes this error to the named source. Already attributed errors are
    /// returned unchanged.
    pub fn in_source(self, name: impl Into<String>) -> Self {
        match self {
            Error::InSource { .. } => self,
            other => Error::InSource {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the source this error is attributed to, if any.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Error::InSource { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Error::Malformed(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_unknown_format_error() {
        let error = Error::UnknownFormat("invalid_format".to_string());
        assert_eq!(error.to_string(), "unknown format `invalid_format`");
    }

    #[test]
    fn test_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let error = Error::Json(json_error);
        assert!(error.to_string().contains("JSON parse error"));
    }

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_malformed_error() {
        let error = Error::malformed("unterminated string");
        assert_eq!(error.to_string(), "malformed input: unterminated string");
    }

    #[test]
    fn test_validation_error() {
        let error = Error::validation_error("plural is missing `other`");
        assert_eq!(
            error.to_string(),
            "validation error: plural is missing `other`"
        );
    }

    #[test]
    fn test_in_source_attribution() {
        let error = Error::malformed("bad").in_source("en.strings");
        assert_eq!(error.source_name(), Some("en.strings"));
        assert_eq!(error.to_string(), "en.strings: malformed input: bad");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_in_source_is_not_nested_twice() {
        let error = Error::malformed("bad")
            .in_source("first.strings")
            .in_source("second.strings");
        assert_eq!(error.source_name(), Some("first.strings"));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownFormat("test".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownFormat"));
        assert!(debug.contains("test"));
    }
}
