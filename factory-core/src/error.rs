//! Error types for factory-core.

use thiserror::Error;

/// All errors that can arise from decoding one definition file.
///
/// Each variant carries the repository path of the offending file so a batch
/// report can name it without extra bookkeeping.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Transport encoding was not valid base64.
    #[error("invalid base64 content in {path}: {source}")]
    Base64 {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Decoded bytes were not UTF-8 text.
    #[error("definition {path} is not valid UTF-8: {source}")]
    Utf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Decoded text failed to parse as a YAML document.
    #[error("failed to parse definition {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but a required field was absent or mistyped.
    #[error("definition {path} is missing required field '{field}'")]
    MissingField { path: String, field: &'static str },

    /// The filename did not carry the dev-definition suffix.
    #[error("'{path}' is not a dev definition file")]
    BadFileName { path: String },
}

/// All errors that can arise from remote repository API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, TLS, body decode).
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success, non-404 HTTP status from the API.
    #[error("API returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    /// The supplied token cannot be used as a bearer header value.
    #[error("token is not a valid authorization header value")]
    InvalidToken,
}
