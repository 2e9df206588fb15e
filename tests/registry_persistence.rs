//! Registry Persistence Tests
//!
//! End to end over real `.xlsx` files:
//! - A spreadsheet laid out by hand loads through the header marker
//! - insert/update survive a reload, with a backup per overwrite
//! - A failed save leaves the in-memory registry untouched

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rotabot::backup::BackupManager;
use rotabot::routes::{
    HeaderSet, LoadState, Route, RouteError, RouteField, RoutePatch, RouteRegistry,
};
use rotabot::storage::{SheetStore, XlsxStore};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

/// Writes rows to the first sheet of a new workbook, every cell as text.
fn write_fixture(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

fn open_registry(data: &Path, backups: &Path) -> RouteRegistry {
    let store = XlsxStore::new(data, BackupManager::new(backups, 0));
    let mut registry = RouteRegistry::new(Arc::new(store));
    registry.load();
    registry
}

fn new_route(number: &str, name: &str) -> Route {
    Route::from_values(
        [
            "Bus 9", number, name, "EM Sol", "Tarde", "Carla", "Paulo 8888", "Via Norte", "15",
            "QWE4R56", "10/03/2025",
        ]
        .map(String::from),
    )
}

const FIXTURE: &[&[&str]] = &[
    &["A", "B", "ROTAS ESCOLARES"],
    &[
        "ÔNIBUS",
        "N° ROTA",
        "ROTA",
        "ESCOLAS ATENDIDAS",
        "TURNO QUE O ÔNIBUS ATENDE",
        "MONITOR",
        "MOTORISTAS / CONTATO",
        "EMPRESA",
        "KM",
        "PLACAS - ÔNIBUS",
        "DATA DE INÍCIO",
        "OBSERVAÇÕES",
    ],
    &[
        "Bus1", "100", "Route X", "EM Lua", "Manhã", "Ana", "João 9999", "Via Sul", "42",
        "ABC1D23", "", "rampa",
    ],
    &["", "", "", "", "", "", "", "", "", "", "", ""],
    &["Bus2", " ", "Sem número"],
    &["Bus3", "101", "Route Y"],
];

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_scenario_rows_load_by_marker() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    write_fixture(&data, FIXTURE);

    let registry = open_registry(&data, &dir.path().join("backups"));

    assert_eq!(registry.state(), LoadState::Loaded);
    assert_eq!(registry.len(), 2, "blank-key rows must be dropped");
    assert_eq!(registry.find_by_number("100").unwrap().name, "Route X");
    assert_eq!(
        registry.find_by_number("999").unwrap_err(),
        RouteError::NotFound("999".to_string())
    );
    assert!(registry.headers().has_key_column());
}

#[test]
fn test_sheet_without_marker_loads_empty() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    write_fixture(&data, &[&["ROTA", "EMPRESA"], &["Centro", "Via Sul"]]);

    let registry = open_registry(&data, &dir.path().join("backups"));

    assert_eq!(registry.state(), LoadState::LoadFailed);
    assert!(registry.list_all().unwrap().is_empty());
}

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn test_insert_and_update_survive_reload() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    let backups = dir.path().join("backups");
    write_fixture(&data, FIXTURE);

    {
        let mut registry = open_registry(&data, &backups);
        registry.insert(new_route("200", "Vila Nova")).unwrap();

        let patch = RoutePatch::new()
            .set(RouteField::Plate, "ZZZ9Z99")
            .unwrap();
        registry.update("100", &patch).unwrap();
    }

    let registry = open_registry(&data, &backups);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.find_by_number("200").unwrap().driver, "Paulo 8888");

    let original = registry.find_by_number("100").unwrap();
    assert_eq!(original.plate, "ZZZ9Z99");
    assert_eq!(original.name, "Route X");
    assert_eq!(
        original.extra.values().next().map(String::as_str),
        Some("rampa"),
        "unknown columns must survive a save"
    );

    // One backup per overwrite of an existing file
    assert_eq!(fs::read_dir(&backups).unwrap().count(), 2);
}

#[test]
fn test_first_insert_creates_loadable_file() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data").join("rotas.xlsx");
    let backups = dir.path().join("backups");

    {
        let mut registry = open_registry(&data, &backups);
        assert_eq!(registry.state(), LoadState::LoadFailed);
        registry.insert(new_route("1", "Primeira")).unwrap();
    }

    let registry = open_registry(&data, &backups);
    assert_eq!(registry.state(), LoadState::Loaded);
    assert_eq!(registry.find_by_number("1").unwrap().name, "Primeira");
    assert!(!backups.exists(), "nothing to back up before the first save");
}

#[test]
fn test_insert_into_partial_header_matches_disk() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    let backups = dir.path().join("backups");
    write_fixture(&data, &[&["N° ROTA", "ROTA"], &["100", "Centro"]]);

    let in_memory = {
        let mut registry = open_registry(&data, &backups);
        registry.insert(new_route("200", "Vila Nova")).unwrap();

        let inserted = registry.find_by_number("200").unwrap();
        assert_eq!(inserted.name, "Vila Nova");
        assert_eq!(inserted.driver, "", "no MOTORISTA column to keep it in");
        registry.list_all().unwrap().to_vec()
    };

    let reloaded = open_registry(&data, &backups);
    assert_eq!(reloaded.list_all().unwrap(), in_memory.as_slice());
}

// =============================================================================
// Rollback
// =============================================================================

#[test]
fn test_insert_on_empty_registry_rolls_back_when_write_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let mut registry = open_registry(&blocker.join("rotas.xlsx"), &dir.path().join("backups"));

    let err = registry.insert(new_route("1", "Primeira")).unwrap_err();

    assert!(matches!(err, RouteError::PersistenceFailure(_)));
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_backup_failure_aborts_save() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    let backups = dir.path().join("backups");
    write_fixture(&data, FIXTURE);
    fs::write(&backups, b"not a directory").unwrap();

    let mut registry = open_registry(&data, &backups);
    let before = registry.list_all().unwrap().to_vec();
    let file_before = fs::read(&data).unwrap();

    let patch = RoutePatch::new().set(RouteField::Name, "Trocada").unwrap();
    let err = registry.update("100", &patch).unwrap_err();

    assert!(matches!(err, RouteError::PersistenceFailure(_)));
    assert_eq!(registry.list_all().unwrap(), before.as_slice());
    assert_eq!(fs::read(&data).unwrap(), file_before, "file must be untouched");
}

#[test]
fn test_store_save_is_atomic_rename() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("rotas.xlsx");
    let store = XlsxStore::new(&data, BackupManager::new(dir.path().join("b"), 0));

    store
        .save(&HeaderSet::canonical(), &[new_route("5", "Cinco")])
        .unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    assert_eq!(store.load().unwrap().routes.len(), 1);
}
