use thiserror::Error;

/// Unified error type for all data source operations
#[derive(Error, Debug)]
pub enum DataError {
    /// Cloud identifier outside the supported set
    #[error("Unsupported cloud: {0}")]
    UnsupportedCloud(String),

    /// Invalid query definition, tagged with the query's ref id
    #[error("Invalid query {ref_id}: {reason}")]
    InvalidQuery { ref_id: String, reason: String },

    /// Time range that is empty or runs backwards
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Non-2xx answer from the remote service. The message is the fully
    /// rendered diagnostic and is displayed as-is.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response payload did not match the expected table shape
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DataError {
    /// Create an invalid query error for the given ref id
    pub fn invalid_query(ref_id: impl Into<String>, reason: impl Into<String>) -> Self {
        DataError::InvalidQuery {
            ref_id: ref_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        DataError::InvalidConfiguration(msg.into())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
