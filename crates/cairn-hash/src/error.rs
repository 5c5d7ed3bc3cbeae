use thiserror::Error;

/// Errors produced by ref parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// The textual form did not match `sha1-` + 40 lowercase hex characters.
    #[error("malformed ref: {0:?}")]
    MalformedRef(String),
}
