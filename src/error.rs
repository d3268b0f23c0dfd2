use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by directory lookups, file loads and account operations.
///
/// Callers branch on the variant, never on the message text. In particular a
/// lookup miss is always [`Error::UserNotFound`] / [`Error::GroupNotFound`],
/// never a generic key error.
#[derive(Debug, Error)]
pub enum Error {
    /// An account operation failed; carries the tool's diagnostic output.
    #[error("{0}")]
    User(String),

    /// A user name lookup missed.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A group operation failed; carries the tool's diagnostic output.
    #[error("{0}")]
    Group(String),

    /// A group name or gid lookup missed.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// An identity file is absent from the system.
    #[error("identity file {0} not found on the system")]
    FileMissing(PathBuf),

    /// A line in an identity file did not parse, or broke a uniqueness
    /// invariant.
    #[error("malformed record '{line}': {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
