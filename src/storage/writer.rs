//! Spreadsheet writer
//!
//! Layout of a saved file:
//! 1. two descriptive banner rows
//! 2. the header row
//! 3. one row per route, in registry order
//!
//! The banner rows never contain a route number marker, so reloading a
//! saved file finds the same header row again.
//!
//! The workbook is written to a sibling temp file and renamed over the
//! target; a failed write never leaves a truncated spreadsheet behind.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use super::errors::{StorageError, StorageResult};
use crate::routes::{HeaderSet, Route};

/// Worksheet name used for saved files
pub const SHEET_NAME: &str = "Rotas";

/// Banner rows written above the header row
pub const BANNER_ROWS: [&[&str]; 2] = [
    &["ROTAS ESCOLARES", "", "", "", "", "ROTA - MONITORES", "EMPRESAS DE ÔNIBUS"],
    &["Planilha mantida pelo bot de rotas. Não altere a linha de cabeçalho abaixo."],
];

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_row<S: AsRef<str>>(
    worksheet: &mut Worksheet,
    row: u32,
    cells: &[S],
) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        let cell = cell.as_ref();
        if cell.is_empty() {
            continue;
        }
        let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string(row, col, cell)?;
    }
    Ok(())
}

fn build_workbook(headers: &HeaderSet, routes: &[Route]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let mut row: u32 = 0;
    for banner in BANNER_ROWS {
        write_row(worksheet, row, banner)?;
        row += 1;
    }

    let names: Vec<&str> = headers.names().collect();
    write_row(worksheet, row, names.as_slice())?;
    row += 1;

    for route in routes {
        write_row(worksheet, row, headers.row_for(route).as_slice())?;
        row += 1;
    }

    Ok(workbook)
}

/// Serializes the header set and routes to `path`.
pub fn write_sheet(path: &Path, headers: &HeaderSet, routes: &[Route]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
    }

    let mut workbook = build_workbook(headers, routes)
        .map_err(|e| StorageError::write_failed("Failed to build workbook", e))?;

    let tmp = temp_path(path);
    workbook.save(&tmp).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::write_failed(format!("Failed to write {}", tmp.display()), e)
    })?;

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::write_failed(
            format!("Failed to replace {}", path.display()),
            e,
        )
    })
}
