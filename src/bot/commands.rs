//! Command parsing
//!
//! Only the command word is matched case-insensitively; payloads keep the
//! case they were typed in.
//!
//! ```text
//! !rotas ajuda            routes help
//! !rotas                  list every route
//! !rota <n>               one route
//! !motorista <name>       routes by driver
//! !monitor <name>         routes by monitor
//! !empresa <name>         routes by company
//! !addrota <11 fields>    admin
//! !updrota <n>|<field>|<value>   admin
//! !ajuda  !estatisticas  !@  !todosvisiveis
//! ```

use crate::config::BotConfig;
use crate::routes::{Route, RouteError, RouteField, RoutePatch, RouteResult};

/// Usage line for `!addrota`, fields in column order
pub const ADD_ROUTE_USAGE: &str =
    "ONIBUS|NROTA|ROTA|ESCOLAS|TURNO|MONITOR|MOTORISTA|EMPRESA|KM|PLACA|DATA";

/// Usage line for `!updrota`
pub const UPDATE_ROUTE_USAGE: &str = "NROTA|CAMPO|VALOR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RoutesHelp,
    ListRoutes,
    GetRoute(String),
    ByDriver(String),
    ByMonitor(String),
    ByCompany(String),
    AddRoute(String),
    UpdateRoute(String),
    Help,
    Stats,
    MentionAll,
    MentionAllVisible,
    /// Normalized text of an unrecognized command
    Unknown(String),
}

impl Command {
    /// Parses a message body. `None` when it is not a command at all.
    pub fn parse(text: &str, config: &BotConfig) -> Option<Command> {
        let rest = strip_prefix_ignore_case(text.trim(), &config.command_prefix)?;

        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "rotas" if args.is_empty() => Command::ListRoutes,
            "rotas" if args.eq_ignore_ascii_case("ajuda") => Command::RoutesHelp,
            "rota" if !args.is_empty() => {
                let key = args.split_whitespace().next().unwrap_or_default();
                Command::GetRoute(key.to_string())
            }
            "motorista" if !args.is_empty() => Command::ByDriver(args.to_string()),
            "monitor" if !args.is_empty() => Command::ByMonitor(args.to_string()),
            "empresa" if !args.is_empty() => Command::ByCompany(args.to_string()),
            "addrota" => Command::AddRoute(args.to_string()),
            "updrota" => Command::UpdateRoute(args.to_string()),
            _ => Self::parse_generic(rest, config),
        };
        Some(command)
    }

    fn parse_generic(rest: &str, config: &BotConfig) -> Command {
        let normalized = rest.trim().to_lowercase();
        let matches = |name: &str| normalized == name.trim().to_lowercase();

        if matches(&config.help_command) {
            Command::Help
        } else if matches(&config.stats_command) {
            Command::Stats
        } else if matches(&config.mention_all_command) {
            Command::MentionAll
        } else if matches(&config.mention_all_visible_command) {
            Command::MentionAllVisible
        } else {
            Command::Unknown(normalized)
        }
    }

    /// Restricted to the admin allow-list.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::AddRoute(_)
                | Command::UpdateRoute(_)
                | Command::Stats
                | Command::MentionAll
                | Command::MentionAllVisible
        )
    }

    /// Stable name used as the stats key.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RoutesHelp => "rotas ajuda",
            Command::ListRoutes => "rotas",
            Command::GetRoute(_) => "rota",
            Command::ByDriver(_) => "motorista",
            Command::ByMonitor(_) => "monitor",
            Command::ByCompany(_) => "empresa",
            Command::AddRoute(_) => "addrota",
            Command::UpdateRoute(_) => "updrota",
            Command::Help => "ajuda",
            Command::Stats => "estatisticas",
            Command::MentionAll => "@",
            Command::MentionAllVisible => "todosvisiveis",
            Command::Unknown(_) => "desconhecido",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}

/// Rate limiter key: the text after the prefix, trimmed and lower-cased.
pub fn normalize(text: &str, prefix: &str) -> Option<String> {
    strip_prefix_ignore_case(text.trim(), prefix).map(|rest| rest.trim().to_lowercase())
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// Parses the `!addrota` payload: exactly 11 fields in column order.
pub fn parse_new_route(payload: &str) -> RouteResult<Route> {
    let values: Vec<String> = payload.split('|').map(|v| v.trim().to_string()).collect();
    let values: [String; 11] = values
        .try_into()
        .map_err(|_| RouteError::FormatError(format!("Formato incorreto. Use: {}", ADD_ROUTE_USAGE)))?;
    Ok(Route::from_values(values))
}

/// Parses the `!updrota` payload into the route key and a one-field patch.
///
/// The value is everything after the second `|`, so values may contain `|`.
pub fn parse_update(payload: &str) -> RouteResult<(String, RoutePatch)> {
    let format_error =
        || RouteError::FormatError(format!("Formato incorreto. Use: {}", UPDATE_ROUTE_USAGE));

    let mut parts = payload.splitn(3, '|');
    let (key, field, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(field), Some(value)) => (key.trim(), field, value.trim()),
        _ => return Err(format_error()),
    };
    if key.is_empty() {
        return Err(format_error());
    }

    let field = RouteField::from_header(field)
        .filter(RouteField::is_updatable)
        .ok_or_else(|| {
            let valid: Vec<_> = RouteField::updatable().map(|f| f.header()).collect();
            RouteError::FormatError(format!(
                "Campo inválido. Campos válidos: {}",
                valid.join(", ")
            ))
        })?;

    let patch = RoutePatch::new().set(field, value)?;
    Ok((key.to_string(), patch))
}
