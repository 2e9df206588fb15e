//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::backup::BackupError;
use crate::config::ConfigError;
use crate::routes::RouteError;
use crate::transport::TransportError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Config file exists and `--force` was not given
    AlreadyExists,
    /// Route lookup failed
    RouteError,
    /// Backup failed
    BackupFailed,
    /// Runtime or transport failure while serving
    ServeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ROTA_CLI_CONFIG_ERROR",
            Self::IoError => "ROTA_CLI_IO_ERROR",
            Self::AlreadyExists => "ROTA_CLI_ALREADY_EXISTS",
            Self::RouteError => "ROTA_CLI_ROUTE_ERROR",
            Self::BackupFailed => "ROTA_CLI_BACKUP_FAILED",
            Self::ServeFailed => "ROTA_CLI_SERVE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_exists(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyExists,
            format!(
                "{} already exists. Pass --force to overwrite.",
                path.display()
            ),
        )
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<RouteError> for CliError {
    fn from(e: RouteError) -> Self {
        Self::new(CliErrorCode::RouteError, e.to_string())
    }
}

impl From<BackupError> for CliError {
    fn from(e: BackupError) -> Self {
        Self::new(CliErrorCode::BackupFailed, e.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        Self::serve_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("bad");
        assert_eq!(err.to_string(), "ROTA_CLI_CONFIG_ERROR: bad");
    }

    #[test]
    fn test_route_error_conversion() {
        let err: CliError = RouteError::NotFound("9".into()).into();
        assert_eq!(err.code(), &CliErrorCode::RouteError);
        assert_eq!(err.code_str(), "ROTA_CLI_ROUTE_ERROR");
    }
}
