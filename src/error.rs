use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BridgeError {
    #[error("authentication failed with status {status}: {message}")]
    AuthFailed { status: u16, message: String },

    #[error("request to {url} failed with status {status}")]
    RequestFailed { status: u16, url: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("a secret file with the credentials is mandatory when submitting")]
    #[diagnostic(help("pass --secret <path/to/secret.yml>"))]
    MissingCredentials,

    #[error("failed to read credentials file at {0}")]
    CredentialsRead(PathBuf),

    #[error("failed to parse credentials: {0}")]
    CredentialsParse(String),

    #[error("{record} is missing required field `{field}`")]
    MissingField { record: String, field: String },

    #[error("unknown environment: {0} (expected dev or stable)")]
    InvalidEnvironment(String),

    #[error("synonym candidate is not a string: {0}")]
    InvalidSynonym(String),

    #[error("failed to base64-decode field `{field}`: {message}")]
    Base64Decode { field: String, message: String },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("failed to serialize sample: {0}")]
    Serialization(String),

    #[error("output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    #[error("`{second}` and `{first}` would both be written to {path}")]
    #[diagnostic(help("identifiers differing only in characters outside [A-Za-z0-9._-] share a file name"))]
    FileNameCollision {
        path: String,
        first: String,
        second: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl BridgeError {
    pub fn missing(record: impl Into<String>, field: &str) -> Self {
        BridgeError::MissingField {
            record: record.into(),
            field: field.to_string(),
        }
    }
}
