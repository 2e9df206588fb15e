//! CLI command implementations
//!
//! One-shot commands (`init-config`, `routes`, `backup`) answer with a single
//! JSON object on stdout. `serve` hands stdin/stdout to the console
//! transport, so it reports nothing there itself.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::bot::{self, xlsx_store, BotContext};
use crate::config::BotConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::routes::{RouteField, RouteRegistry};
use crate::transport::ConsoleTransport;

use super::args::{Command, RoutesAction};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Serve { config } => return serve(&config),
        Command::InitConfig { config, force } => init_config(&config, force),
        Command::Routes { config, action } => routes(&config, action),
        Command::Backup { config } => backup(&config),
    };

    if let Err(e) = &result {
        // Best effort; the error is also returned to main
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

fn load_config(path: &Path) -> CliResult<BotConfig> {
    let config = BotConfig::load_or_default(path)?;
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_file", &config.data_file.display().to_string()),
            ("path", &path.display().to_string()),
        ],
    );
    Ok(config)
}

/// Write a config file holding every default
pub fn init_config(config_path: &Path, force: bool) -> CliResult<()> {
    if config_path.exists() && !force {
        return Err(CliError::already_exists(config_path));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = BotConfig::default().to_json_pretty()?;
    fs::write(config_path, content)?;

    write_response(json!({ "written": config_path.display().to_string() }))
}

/// Run the bot until stdin is exhausted
pub fn serve(config_path: &Path) -> CliResult<()> {
    log_event_with_fields(
        Event::BootStart,
        &[("config", &config_path.display().to_string())],
    );
    let config = load_config(config_path)?;
    let ctx = Arc::new(BotContext::from_config(config));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async move {
        let mut transport = ConsoleTransport::stdio();
        bot::serve(ctx, &mut transport).await
    })?;

    Ok(())
}

/// Read-only queries against the spreadsheet
pub fn routes(config_path: &Path, action: RoutesAction) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut registry = RouteRegistry::new(Arc::new(xlsx_store(&config)));
    registry.load();

    let data = match action {
        RoutesAction::List => json!({
            "count": registry.len(),
            "routes": registry.list_all()?,
        }),
        RoutesAction::Get { number } => json!({
            "route": registry.find_by_number(&number)?,
        }),
        RoutesAction::Search { field, query } => {
            let found = registry.search(RouteField::from(field), &query)?;
            json!({
                "count": found.len(),
                "routes": found,
            })
        }
    };

    write_response(data)
}

/// Copy the spreadsheet to the backup directory and prune old copies
pub fn backup(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = xlsx_store(&config);

    let created = store.backups().create_backup(&config.data_file)?;

    write_response(json!({
        "backup": created.map(|p| p.display().to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("rotabot.json");

        init_config(&path, false).unwrap();
        assert_eq!(
            BotConfig::load(&path).unwrap(),
            BotConfig::default()
        );

        let err = init_config(&path, false).unwrap_err();
        assert_eq!(err.code_str(), "ROTA_CLI_ALREADY_EXISTS");

        init_config(&path, true).unwrap();
    }

    #[test]
    fn test_routes_get_missing_route_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("rotabot.json");
        let config = BotConfig {
            data_file: dir.path().join("absent.xlsx"),
            backup_dir: dir.path().join("backups"),
            ..BotConfig::default()
        };
        fs::write(&config_path, config.to_json_pretty().unwrap()).unwrap();

        let err = routes(
            &config_path,
            RoutesAction::Get {
                number: "100".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "ROTA_CLI_ROUTE_ERROR");
    }

    #[test]
    fn test_backup_without_data_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("rotabot.json");
        let config = BotConfig {
            data_file: dir.path().join("absent.xlsx"),
            backup_dir: dir.path().join("backups"),
            ..BotConfig::default()
        };
        fs::write(&config_path, config.to_json_pretty().unwrap()).unwrap();

        backup(&config_path).unwrap();
        assert!(!dir.path().join("backups").exists());
    }
}
