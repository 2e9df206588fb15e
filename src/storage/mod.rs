//! Spreadsheet storage for the route registry
//!
//! The registry talks to storage only through `SheetStore`:
//! - `load` reads the whole sheet into a header set and routes
//! - `save` backs up the current file, then rewrites it
//!
//! `XlsxStore` is the production implementation. Tests plug in stores that
//! fail on demand to exercise registry rollback.

mod errors;
pub mod reader;
pub mod writer;

pub use errors::{StorageError, StorageErrorCode, StorageResult};

use std::path::PathBuf;

use crate::backup::BackupManager;
use crate::observability::{log_event_with_fields, Event};
use crate::routes::{HeaderSet, Route};

/// Result of a successful load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSheet {
    pub headers: HeaderSet,
    pub routes: Vec<Route>,
}

/// Persistence seam for the route registry
pub trait SheetStore: Send + Sync {
    /// Reads the persisted sheet.
    fn load(&self) -> StorageResult<LoadedSheet>;

    /// Persists the full registry, replacing the previous file.
    fn save(&self, headers: &HeaderSet, routes: &[Route]) -> StorageResult<()>;
}

/// `.xlsx` file store with backup-before-write
#[derive(Debug, Clone)]
pub struct XlsxStore {
    data_path: PathBuf,
    backups: BackupManager,
}

impl XlsxStore {
    pub fn new(data_path: impl Into<PathBuf>, backups: BackupManager) -> Self {
        Self {
            data_path: data_path.into(),
            backups,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }
}

impl SheetStore for XlsxStore {
    fn load(&self) -> StorageResult<LoadedSheet> {
        let path = self.data_path.display().to_string();
        log_event_with_fields(Event::SheetLoadBegin, &[("path", &path)]);

        match reader::load(&self.data_path) {
            Ok(sheet) => {
                log_event_with_fields(
                    Event::SheetLoaded,
                    &[
                        ("columns", &sheet.headers.len().to_string()),
                        ("path", &path),
                        ("routes", &sheet.routes.len().to_string()),
                    ],
                );
                Ok(sheet)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::SheetLoadFailed,
                    &[("code", e.code().code()), ("error", &e.to_string()), ("path", &path)],
                );
                Err(e)
            }
        }
    }

    fn save(&self, headers: &HeaderSet, routes: &[Route]) -> StorageResult<()> {
        let path = self.data_path.display().to_string();

        let result = self
            .backups
            .create_backup(&self.data_path)
            .map_err(StorageError::from)
            .and_then(|_| writer::write_sheet(&self.data_path, headers, routes));

        match &result {
            Ok(()) => log_event_with_fields(
                Event::SheetSaved,
                &[("path", &path), ("routes", &routes.len().to_string())],
            ),
            Err(e) => log_event_with_fields(
                Event::SheetSaveFailed,
                &[("error", &e.to_string()), ("path", &path)],
            ),
        }

        result
    }
}
