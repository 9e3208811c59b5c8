use thiserror::Error;

/// Top-level error type for the Xinjie service.
///
/// The first four variants form the request-facing taxonomy; the HTTP layer
/// maps each of them to a status code. The remaining variants only occur
/// during startup (configuration, file system).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XinjieError {
    /// Bad input that the caller can correct.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The interpretation API was unreachable or replied with garbage.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Table, connection or query failure.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for XinjieError {
    fn from(err: toml::de::Error) -> Self {
        XinjieError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for XinjieError {
    fn from(err: serde_json::Error) -> Self {
        XinjieError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Xinjie operations.
pub type Result<T> = std::result::Result<T, XinjieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(XinjieError, &str)> = vec![
            (
                XinjieError::Validation("prompt is empty".to_string()),
                "Validation error: prompt is empty",
            ),
            (
                XinjieError::Upstream("HTTP 503".to_string()),
                "Upstream error: HTTP 503",
            ),
            (
                XinjieError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                XinjieError::NotFound("response 7".to_string()),
                "Not found: response 7",
            ),
            (
                XinjieError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                XinjieError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: XinjieError = io_err.into();
        assert!(matches!(err, XinjieError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: XinjieError = err.unwrap_err().into();
        assert!(matches!(err, XinjieError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: XinjieError = err.unwrap_err().into();
        assert!(matches!(err, XinjieError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
