/// The main error type for Meterview
#[derive(Debug, thiserror::Error)]
pub enum MeterviewError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Directory lookup failed: {0}")]
    Directory(String),

    #[error("Relay returned {status}: {message}")]
    Relay { status: u16, message: String },

    #[error("Upload could not be read: {0}")]
    Ingest(String),

    #[error("Payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Local store error: {0}")]
    Storage(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<reqwest::Error> for MeterviewError {
    fn from(err: reqwest::Error) -> Self {
        MeterviewError::Relay {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for MeterviewError {
    fn from(err: std::io::Error) -> Self {
        MeterviewError::Storage(err.to_string())
    }
}

/// Convenience Result type alias using MeterviewError
pub type Result<T> = std::result::Result<T, MeterviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_error_display_carries_status_and_text() {
        let err = MeterviewError::Relay {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Relay returned 502: Bad Gateway");
    }

    #[test]
    fn io_errors_become_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MeterviewError = io.into();
        assert!(matches!(err, MeterviewError::Storage(_)));
    }
}
