// error.rs

use thiserror::Error;

/// Everything the ingestion and query flows can fail with.
#[derive(Debug, Error)]
pub enum AqiError {
    /// A numeric or time field did not parse.
    #[error("cannot parse {field}: {raw:?}")]
    Parse { field: &'static str, raw: String },

    /// A required text field is empty or absent.
    #[error("no {0}")]
    MissingField(&'static str),

    #[error("empty custom id for site {site:?} in {county:?}")]
    EmptyIdentity { site: String, county: String },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid query parameter {param}: {reason}")]
    InvalidQuery { param: &'static str, reason: String },

    #[error("no messages to rank")]
    EmptyResult,

    /// Feed, message store or actuator failure.
    #[error("{what} failed: {source:#}")]
    Upstream {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AqiError {
    pub fn upstream(what: &'static str, source: impl Into<anyhow::Error>) -> Self {
        AqiError::Upstream {
            what,
            source: source.into(),
        }
    }

    /// Machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AqiError::Parse { .. } => "ParseError",
            AqiError::MissingField(_) => "MissingFieldError",
            AqiError::EmptyIdentity { .. } => "EmptyIdentityError",
            AqiError::Serialization(_) => "SerializationError",
            AqiError::InvalidQuery { .. } => "InvalidQueryError",
            AqiError::EmptyResult => "EmptyResultError",
            AqiError::Upstream { .. } => "UpstreamError",
        }
    }
}


// EOF
