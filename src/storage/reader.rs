//! Spreadsheet loader
//!
//! Reads the first worksheet, finds the header row by scanning top-down for
//! a route number marker and turns every row below it into a `Route`.
//!
//! Rows whose route number is blank are dropped. This is deliberate data
//! cleaning (spacer rows, totals, notes), not an error.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use super::errors::{StorageError, StorageResult};
use super::LoadedSheet;
use crate::routes::{HeaderSet, Route, RouteField};

/// Reads the first worksheet as rows of rendered cell text.
pub fn read_rows(path: &Path) -> StorageResult<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(StorageError::not_found(path));
    }

    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path).map_err(|e| {
        StorageError::read_failed(format!("Failed to open {}", path.display()), e)
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            StorageError::read_failed_no_source(format!(
                "Workbook has no worksheets: {}",
                path.display()
            ))
        })?
        .map_err(|e| StorageError::read_failed("Failed to read first worksheet", e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(render_cell).collect())
        .collect())
}

/// Renders a cell the way it reads in the spreadsheet UI.
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // f64 Display drops a zero fraction: 100.0 renders as "100"
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format("%d/%m/%Y").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn is_header_row(row: &[String]) -> bool {
    row.iter().any(|cell| {
        let cell = cell.trim().to_uppercase();
        RouteField::KEY_MARKERS.contains(&cell.as_str())
    })
}

/// Keep predicate for data rows.
fn has_route_number(route: &Route) -> bool {
    !route.key().is_empty()
}

/// Builds the header set and routes from raw rows.
///
/// The first row carrying a marker becomes the header row; later marker rows
/// are treated as data (and usually dropped by the blank-key filter).
pub fn parse_rows(rows: &[Vec<String>]) -> StorageResult<LoadedSheet> {
    let header_index = rows
        .iter()
        .position(|row| is_header_row(row))
        .ok_or_else(StorageError::header_not_found)?;

    let headers = HeaderSet::from_names(&rows[header_index]);

    let routes = rows[header_index + 1..]
        .iter()
        .map(|row| headers.route_from_row(row))
        .filter(has_route_number)
        .collect();

    Ok(LoadedSheet { headers, routes })
}

/// Reads and parses a spreadsheet file.
pub fn load(path: &Path) -> StorageResult<LoadedSheet> {
    let rows = read_rows(path)?;
    parse_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_header_discovered_below_banner() {
        let sheet = parse_rows(&rows(&[
            &["A", "B", "ROTAS ESCOLARES"],
            &["ÔNIBUS", "N° ROTA", "ROTA", "MOTORISTAS / CONTATO"],
            &["Bus1", "100", "Route X", "José"],
        ]))
        .unwrap();

        assert!(sheet.headers.has_key_column());
        assert_eq!(sheet.routes.len(), 1);
        assert_eq!(sheet.routes[0].name, "Route X");
        assert_eq!(sheet.routes[0].driver, "José");
    }

    #[test]
    fn test_marker_alias_numero() {
        let sheet = parse_rows(&rows(&[&["NUMERO", "ROTA"], &["7", "Vila"]])).unwrap();
        assert_eq!(sheet.routes[0].number, "7");
    }

    #[test]
    fn test_marker_match_is_trimmed_and_case_insensitive() {
        let sheet = parse_rows(&rows(&[&["  n° rota ", "ROTA"], &["7", "Vila"]])).unwrap();
        assert_eq!(sheet.routes.len(), 1);
    }

    #[test]
    fn test_blank_keys_dropped() {
        let sheet = parse_rows(&rows(&[
            &["ÔNIBUS", "N° ROTA", "ROTA"],
            &["Bus1", "100", "A"],
            &["Bus2", "   ", "B"],
            &["", "", ""],
            &["Bus3", "101", "C"],
        ]))
        .unwrap();

        let keys: Vec<_> = sheet.routes.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["100", "101"]);
    }

    #[test]
    fn test_second_marker_row_is_not_a_header() {
        let sheet = parse_rows(&rows(&[
            &["ÔNIBUS", "N° ROTA", "ROTA"],
            &["ÔNIBUS", "N° ROTA", "ROTA"],
            &["Bus1", "100", "A"],
        ]))
        .unwrap();

        // The repeated header row has a non-blank key and survives as data
        assert_eq!(sheet.routes.len(), 2);
        assert_eq!(sheet.headers.len(), 3);
    }

    #[test]
    fn test_rows_above_header_ignored() {
        let sheet = parse_rows(&rows(&[
            &["Bus0", "99", "Antes"],
            &["ÔNIBUS", "N° ROTA", "ROTA"],
        ]))
        .unwrap();
        assert!(sheet.routes.is_empty());
    }

    #[test]
    fn test_no_marker_is_error() {
        let err = parse_rows(&rows(&[&["A", "B"], &["1", "2"]])).unwrap_err();
        assert_eq!(
            err.code(),
            super::super::StorageErrorCode::RotaStorageHeaderNotFound
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(&dir.path().join("missing.xlsx")).unwrap_err();
        assert_eq!(err.code(), super::super::StorageErrorCode::RotaStorageNotFound);
    }

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(&Data::Float(100.0)), "100");
        assert_eq!(render_cell(&Data::Float(12.5)), "12.5");
        assert_eq!(render_cell(&Data::Int(7)), "7");
        assert_eq!(render_cell(&Data::Empty), "");
    }
}
