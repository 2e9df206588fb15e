//! Backup of the routes spreadsheet
//!
//! Every save copies the current file into the backup directory first:
//!
//! ```text
//! backups/
//! ├── backup_2026-10-18T12-00-01-250Z.xlsx
//! └── backup_2026-10-18T12-03-44-012Z.xlsx
//! ```
//!
//! The timestamp is RFC 3339 UTC with millisecond precision, with `:` and
//! `.` replaced by `-`. A second backup in the same millisecond becomes
//! `backup_<stamp>_<n>.xlsx`, with `n` one past the highest suffix already
//! taken for that stamp. Backups are ordered by `(stamp, n)`, the plain name
//! counting as `n = 0`.
//!
//! # Retention
//!
//! After each copy, backups beyond `max_backups` are removed oldest first.
//! The copy just made is never a candidate, even when the clock stepped
//! back. `max_backups == 0` keeps every backup. A failed removal is logged
//! and does not fail the backup.

mod errors;

pub use errors::{BackupError, BackupErrorCode, BackupResult};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::observability::{log_event_with_fields, Event};

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_EXTENSION: &str = "xlsx";

/// File name for a backup taken at `at`.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}{}.{}", BACKUP_PREFIX, stamp, BACKUP_EXTENSION)
}

/// Splits a backup file name into its stamp and collision suffix.
///
/// Returns `None` for files that are not backups.
fn backup_order_key(path: &Path) -> Option<(String, u32)> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_EXTENSION)?
        .strip_suffix('.')?;

    match stem.rsplit_once('_') {
        Some((stamp, n)) => n.parse().ok().map(|n| (stamp.to_string(), n)),
        None => Some((stem.to_string(), 0)),
    }
}

/// Copies the spreadsheet aside before it is overwritten.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            max_backups,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Backs up `source` with the current time.
    ///
    /// Returns `Ok(None)` when there is nothing to back up yet.
    pub fn create_backup(&self, source: &Path) -> BackupResult<Option<PathBuf>> {
        self.create_backup_at(source, Utc::now())
    }

    /// Backs up `source` under the name for `at`.
    pub fn create_backup_at(
        &self,
        source: &Path,
        at: DateTime<Utc>,
    ) -> BackupResult<Option<PathBuf>> {
        if !source.exists() {
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| BackupError::io_error_at_path(&self.backup_dir, e))?;

        let target = self.unused_target(at)?;
        if let Err(e) = fs::copy(source, &target) {
            let _ = fs::remove_file(&target);
            let err = BackupError::io_error(
                format!(
                    "Failed to copy {} to {}",
                    source.display(),
                    target.display()
                ),
                e,
            );
            log_event_with_fields(Event::BackupFailed, &[("error", &err.to_string())]);
            return Err(err);
        }

        log_event_with_fields(
            Event::BackupComplete,
            &[("backup", &target.display().to_string())],
        );

        let pruned = self.prune(&target);
        Ok(Some(self.settle_retention(target, pruned)))
    }

    /// Retention is housekeeping: its failure is logged, never returned.
    fn settle_retention(&self, target: PathBuf, pruned: BackupResult<usize>) -> PathBuf {
        if let Err(e) = pruned {
            log_event_with_fields(
                Event::BackupFailed,
                &[("error", &e.to_string()), ("stage", "prune")],
            );
        }
        target
    }

    /// Path for a backup taken at `at`.
    fn unused_target(&self, at: DateTime<Utc>) -> BackupResult<PathBuf> {
        let name = backup_file_name(at);
        let plain = self.backup_dir.join(&name);
        let stamp = match backup_order_key(&plain) {
            Some((stamp, _)) => stamp,
            None => return Ok(plain),
        };

        let taken = self
            .list_backups()?
            .iter()
            .filter_map(|p| backup_order_key(p))
            .filter(|(s, _)| *s == stamp)
            .map(|(_, n)| n)
            .max();

        Ok(match taken {
            None => plain,
            Some(n) => self.backup_dir.join(format!(
                "{}{}_{}.{}",
                BACKUP_PREFIX,
                stamp,
                n + 1,
                BACKUP_EXTENSION
            )),
        })
    }

    /// Lists backup files, oldest first.
    pub fn list_backups(&self) -> BackupResult<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir)
            .map_err(|e| BackupError::io_error_at_path(&self.backup_dir, e))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| BackupError::io_error("Failed to read backup entry", e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(key) = backup_order_key(&path) {
                backups.push((key, path));
            }
        }

        backups.sort();
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Removes the oldest backups beyond the retention limit, never `keep`.
    ///
    /// Returns the number of files removed.
    fn prune(&self, keep: &Path) -> BackupResult<usize> {
        if self.max_backups == 0 {
            return Ok(0);
        }

        let backups = self.list_backups()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        let candidates = backups
            .iter()
            .filter(|p| p.as_path() != keep)
            .take(excess);

        for path in candidates {
            fs::remove_file(path).map_err(|e| BackupError::prune_failed(path, e))?;
        }

        if excess > 0 {
            log_event_with_fields(Event::BackupPruned, &[("removed", &excess.to_string())]);
        }
        Ok(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn source(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("rotas.xlsx");
        fs::write(&path, b"sheet bytes").unwrap();
        path
    }

    #[test]
    fn test_backup_file_name_has_no_colons_or_dots_in_stamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap()
            + Duration::milliseconds(250);
        assert_eq!(backup_file_name(at), "backup_2026-10-18T09-05-07-250Z.xlsx");
    }

    #[test]
    fn test_missing_source_is_noop_success() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);

        let result = manager.create_backup(&dir.path().join("absent.xlsx")).unwrap();
        assert!(result.is_none());
        assert!(!manager.backup_dir().exists());
    }

    #[test]
    fn test_backup_is_verbatim_copy() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);
        let src = source(&dir);

        let backup = manager.create_backup_at(&src, at(0)).unwrap().unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"sheet bytes");
        assert!(src.exists());
    }

    #[test]
    fn test_same_millisecond_backups_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);
        let src = source(&dir);

        let first = manager.create_backup_at(&src, at(0)).unwrap().unwrap();
        let second = manager.create_backup_at(&src, at(0)).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.list_backups().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_newest_same_millisecond_backup_survives_retention() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 3);
        let src = source(&dir);

        let mut last = PathBuf::new();
        for _ in 0..12 {
            last = manager.create_backup_at(&src, at(0)).unwrap().unwrap();
        }

        let kept = manager.list_backups().unwrap();
        assert_eq!(kept.len(), 3);
        assert!(last.exists());
        assert_eq!(kept.last(), Some(&last));
        assert!(last.to_string_lossy().ends_with("_11.xlsx"));
    }

    #[test]
    fn test_suffixes_order_numerically() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);
        let src = source(&dir);

        let made: Vec<PathBuf> = (0..12)
            .map(|_| manager.create_backup_at(&src, at(0)).unwrap().unwrap())
            .collect();

        assert_eq!(manager.list_backups().unwrap(), made);
    }

    #[test]
    fn test_backup_taken_after_clock_step_back_is_kept() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 1);
        let src = source(&dir);

        manager.create_backup_at(&src, at(60)).unwrap();
        let latest = manager.create_backup_at(&src, at(0)).unwrap().unwrap();

        assert_eq!(manager.list_backups().unwrap(), vec![latest]);
    }

    #[test]
    fn test_retention_failure_does_not_fail_backup() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 1);
        let target = dir.path().join("backups").join(backup_file_name(at(0)));
        let failure = BackupError::prune_failed(
            &target,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        );

        assert_eq!(manager.settle_retention(target.clone(), Err(failure)), target);
    }

    #[test]
    fn test_files_with_foreign_suffix_are_not_backups() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);
        fs::create_dir_all(manager.backup_dir()).unwrap();
        fs::write(manager.backup_dir().join("backup_old_copy.xlsx"), b"x").unwrap();

        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_unbounded_retention_keeps_everything() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 0);
        let src = source(&dir);

        for i in 0..5 {
            manager.create_backup_at(&src, at(i)).unwrap();
        }
        assert_eq!(manager.list_backups().unwrap().len(), 5);
    }

    #[test]
    fn test_retention_removes_oldest() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 2);
        let src = source(&dir);

        for i in 0..4 {
            manager.create_backup_at(&src, at(i)).unwrap();
        }

        let names: Vec<String> = manager
            .list_backups()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![backup_file_name(at(2)), backup_file_name(at(3))]);
    }

    #[test]
    fn test_unrelated_files_are_never_pruned() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), 1);
        let src = source(&dir);

        fs::create_dir_all(manager.backup_dir()).unwrap();
        let notes = manager.backup_dir().join("LEIA-ME.txt");
        fs::write(&notes, b"keep").unwrap();

        manager.create_backup_at(&src, at(0)).unwrap();
        manager.create_backup_at(&src, at(1)).unwrap();

        assert!(notes.exists());
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn test_backup_dir_blocked_by_file_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("backups");
        fs::write(&blocker, b"file, not dir").unwrap();
        let manager = BackupManager::new(&blocker, 0);
        let src = source(&dir);

        let err = manager.create_backup(&src).unwrap_err();
        assert_eq!(err.code(), BackupErrorCode::RotaBackupIo);
    }
}
