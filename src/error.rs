//! Error types for sftp-bench.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for benchmark runs.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing input, surfaced before any network activity.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Network or protocol failure while establishing the session.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Connect or authentication did not finish within the bounded wait.
    #[error("connection timed out after {after:?}")]
    Timeout { after: Duration },

    /// The server rejected the supplied credentials.
    #[error("authentication failed for {user}@{host}")]
    AuthenticationFailed { user: String, host: String },

    /// I/O failure mid-stream. The remote file may be partially written.
    #[error("transfer failed: {message}")]
    Transfer { message: String },

    /// Local filesystem error outside a transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection {
            message: message.into(),
        }
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Error::Transfer {
            message: message.into(),
        }
    }

    /// Process exit code for this error: 2 for bad arguments, 3 for
    /// connection-stage failures, 4 once a transfer has started.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument { .. } => 2,
            Error::Connection { .. }
            | Error::Timeout { .. }
            | Error::AuthenticationFailed { .. } => 3,
            Error::Transfer { .. } | Error::Io(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(Error::invalid_argument("x").exit_code(), 2);
        assert_eq!(Error::connection("x").exit_code(), 3);
        assert_eq!(
            Error::Timeout {
                after: Duration::from_secs(4)
            }
            .exit_code(),
            3
        );
        assert_eq!(
            Error::AuthenticationFailed {
                user: "u".into(),
                host: "h".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::transfer("x").exit_code(), 4);
    }
}
