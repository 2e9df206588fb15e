//! Backup-specific error types
//!
//! Error codes:
//! - ROTA_BACKUP_IO (ERROR severity)
//! - ROTA_BACKUP_PRUNE (ERROR severity)
//!
//! A failed copy aborts the save that requested it; it never touches the
//! in-memory registry. Prune failures are only logged.

use std::fmt;
use std::io;

/// Backup error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupErrorCode {
    /// I/O failure while copying or listing backups
    RotaBackupIo,
    /// I/O failure while pruning old backups
    RotaBackupPrune,
}

impl BackupErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupErrorCode::RotaBackupIo => "ROTA_BACKUP_IO",
            BackupErrorCode::RotaBackupPrune => "ROTA_BACKUP_PRUNE",
        }
    }
}

impl fmt::Display for BackupErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backup error with full context
#[derive(Debug)]
pub struct BackupError {
    code: BackupErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl BackupError {
    fn new(code: BackupErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(BackupErrorCode::RotaBackupIo, message, Some(source))
    }

    pub fn io_error_at_path(path: &std::path::Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at {}", path.display()), source)
    }

    pub fn prune_failed(path: &std::path::Path, source: io::Error) -> Self {
        Self::new(
            BackupErrorCode::RotaBackupPrune,
            format!("Failed to remove old backup {}", path.display()),
            Some(source),
        )
    }

    pub fn code(&self) -> BackupErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
