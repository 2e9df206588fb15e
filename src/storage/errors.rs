//! Storage error types
//!
//! Error codes:
//! - ROTA_STORAGE_NOT_FOUND (ERROR severity)
//! - ROTA_STORAGE_READ_FAILED (ERROR severity)
//! - ROTA_STORAGE_WRITE_FAILED (ERROR severity)
//! - ROTA_STORAGE_HEADER_NOT_FOUND (ERROR severity)
//!
//! None of these are fatal: a failed load leaves the registry empty, a
//! failed save is rolled back by the registry.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Spreadsheet file does not exist
    RotaStorageNotFound,
    /// File could not be opened or parsed
    RotaStorageReadFailed,
    /// File could not be written
    RotaStorageWriteFailed,
    /// No row carries a route number marker
    RotaStorageHeaderNotFound,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::RotaStorageNotFound => "ROTA_STORAGE_NOT_FOUND",
            StorageErrorCode::RotaStorageReadFailed => "ROTA_STORAGE_READ_FAILED",
            StorageErrorCode::RotaStorageWriteFailed => "ROTA_STORAGE_WRITE_FAILED",
            StorageErrorCode::RotaStorageHeaderNotFound => "ROTA_STORAGE_HEADER_NOT_FOUND",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    source: Option<BoxedSource>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    pub fn not_found(path: &Path) -> Self {
        Self::new(
            StorageErrorCode::RotaStorageNotFound,
            format!("Spreadsheet not found: {}", path.display()),
            None,
        )
    }

    pub fn read_failed(
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::new(
            StorageErrorCode::RotaStorageReadFailed,
            message,
            Some(source.into()),
        )
    }

    pub fn read_failed_no_source(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::RotaStorageReadFailed, message, None)
    }

    pub fn write_failed(
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::new(
            StorageErrorCode::RotaStorageWriteFailed,
            message,
            Some(source.into()),
        )
    }

    pub fn write_failed_no_source(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::RotaStorageWriteFailed, message, None)
    }

    pub fn header_not_found() -> Self {
        Self::new(
            StorageErrorCode::RotaStorageHeaderNotFound,
            format!(
                "No header row with any of {:?}",
                crate::routes::RouteField::KEY_MARKERS
            ),
            None,
        )
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Backup failures abort the save that triggered them.
impl From<crate::backup::BackupError> for StorageError {
    fn from(err: crate::backup::BackupError) -> Self {
        Self::write_failed("Backup before save failed", err)
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StorageErrorCode::RotaStorageNotFound.code(),
            "ROTA_STORAGE_NOT_FOUND"
        );
        assert_eq!(
            StorageErrorCode::RotaStorageHeaderNotFound.code(),
            "ROTA_STORAGE_HEADER_NOT_FOUND"
        );
    }

    #[test]
    fn test_display_includes_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only fs");
        let err = StorageError::write_failed("Failed to write rotas.xlsx", io_err);

        let display = err.to_string();
        assert!(display.contains("ROTA_STORAGE_WRITE_FAILED"));
        assert!(display.contains("read-only fs"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn test_header_not_found_names_markers() {
        let err = StorageError::header_not_found();
        assert_eq!(err.code(), StorageErrorCode::RotaStorageHeaderNotFound);
        assert!(err.message().contains("NUMERO"));
    }
}
