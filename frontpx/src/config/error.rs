use thiserror::Error;

/// Startup configuration errors. All of them abort before any listener starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("remote cannot be blank")]
    BlankRemote,

    #[error("hostname cannot be blank")]
    BlankHostname,

    #[error("all values must be in the form key=value (got {pair:?})")]
    MalformedPair { pair: String },

    #[error("invalid remote {remote:?}: {reason}")]
    InvalidRemote { remote: String, reason: String },
}
