//! Run configuration: connection parameters, directories, backend selection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default bound on each connect/authenticate step.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Transfer client implementation selected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// SFTP subsystem: explicit remote file handle, chunked writes.
    Sftp,
    /// SCP sink: single put of the whole stream over an exec channel.
    Scp,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sftp" => Ok(Backend::Sftp),
            "scp" => Ok(Backend::Scp),
            other => Err(Error::invalid_argument(format!(
                "unknown client '{other}', expected 'sftp' or 'scp'"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sftp => f.write_str("sftp"),
            Backend::Scp => f.write_str("scp"),
        }
    }
}

/// Immutable bundle of connection and run parameters, built once at startup.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub local_dir: PathBuf,
    /// Destination directory on the server. Empty means the server's
    /// default directory.
    pub remote_dir: String,
    pub backend: Backend,
    pub connect_timeout: Duration,
}

impl Config {
    /// Check the invariants that must hold before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::invalid_argument("host must not be empty"));
        }
        if self.username.is_empty() {
            return Err(Error::invalid_argument("user must not be empty"));
        }
        if self.password.is_empty() {
            return Err(Error::invalid_argument("password must not be empty"));
        }
        if !self.local_dir.is_dir() {
            return Err(Error::invalid_argument(format!(
                "local directory does not exist: {}",
                self.local_dir.display()
            )));
        }
        Ok(())
    }

    /// Remote destination for a local file: `remote_dir` joined with the
    /// base name. An empty remote dir places the file at the server's
    /// default directory under its base name alone.
    pub fn remote_path_for(&self, file_name: &str) -> String {
        if self.remote_dir.is_empty() {
            file_name.to_string()
        } else if self.remote_dir.ends_with('/') {
            format!("{}{}", self.remote_dir, file_name)
        } else {
            format!("{}/{}", self.remote_dir, file_name)
        }
    }
}

// Manual Debug so the startup dump of parsed arguments never echoes the
// password.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("local_dir", &self.local_dir)
            .field("remote_dir", &self.remote_dir)
            .field("backend", &self.backend)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_remote_dir(remote_dir: &str) -> Config {
        Config {
            host: "host".to_string(),
            port: DEFAULT_PORT,
            username: "user".to_string(),
            password: "secret".to_string(),
            local_dir: PathBuf::from("."),
            remote_dir: remote_dir.to_string(),
            backend: Backend::Sftp,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[test]
    fn backend_parses_known_variants() {
        assert_eq!(Backend::from_str("sftp").unwrap(), Backend::Sftp);
        assert_eq!(Backend::from_str("scp").unwrap(), Backend::Scp);
        assert_eq!(Backend::from_str("SCP").unwrap(), Backend::Scp);
    }

    #[test]
    fn backend_rejects_unknown_variant() {
        let err = Backend::from_str("jsch").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn remote_path_joins_with_separator() {
        let config = config_with_remote_dir("/incoming");
        assert_eq!(config.remote_path_for("a.txt"), "/incoming/a.txt");
    }

    #[test]
    fn remote_path_does_not_double_separator() {
        let config = config_with_remote_dir("/incoming/");
        assert_eq!(config.remote_path_for("a.txt"), "/incoming/a.txt");
    }

    #[test]
    fn empty_remote_dir_uses_base_name() {
        let config = config_with_remote_dir("");
        assert_eq!(config.remote_path_for("a.txt"), "a.txt");
    }

    #[test]
    fn validate_rejects_empty_host() {
        let mut config = config_with_remote_dir("");
        config.host.clear();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn validate_rejects_missing_local_dir() {
        let mut config = config_with_remote_dir("");
        config.local_dir = PathBuf::from("/nonexistent/sftp-bench-test");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let config = config_with_remote_dir("");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
