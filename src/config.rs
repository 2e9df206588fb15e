//! Bot configuration
//!
//! A single JSON file. Every field is optional and defaults to the value the
//! bot has always shipped with; an absent file means "all defaults".
//!
//! ```json
//! {
//!   "admins": ["559800000000"],
//!   "data_file": "data/rotas.xlsx",
//!   "max_backups": 50
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Leading character(s) of every command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    #[serde(default = "default_help_command")]
    pub help_command: String,

    #[serde(default = "default_stats_command")]
    pub stats_command: String,

    /// Invisible mention of every group member
    #[serde(default = "default_mention_all_command")]
    pub mention_all_command: String,

    /// Visible mention of every group member
    #[serde(default = "default_mention_all_visible_command")]
    pub mention_all_visible_command: String,

    /// Delay before executing a recognized command (throttles bursts)
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Per user and command
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,

    /// Phone numbers allowed to run admin commands, without the `@c.us` suffix
    #[serde(default)]
    pub admins: Vec<String>,

    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Grace period after the transport is ready before commands are served
    #[serde(default = "default_ready_grace_ms")]
    pub ready_grace_ms: u64,

    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Backups kept after each save; 0 keeps all
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_command_prefix() -> String {
    "!".to_string()
}
fn default_help_command() -> String {
    "ajuda".to_string()
}
fn default_stats_command() -> String {
    "estatisticas".to_string()
}
fn default_mention_all_command() -> String {
    "@".to_string()
}
fn default_mention_all_visible_command() -> String {
    "todosvisiveis".to_string()
}
fn default_message_delay_ms() -> u64 {
    3000
}
fn default_rate_limit_secs() -> u64 {
    30
}
fn default_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay_ms() -> u64 {
    5000
}
fn default_ready_grace_ms() -> u64 {
    10_000
}
fn default_data_file() -> PathBuf {
    PathBuf::from("data").join("planilha rotas.xlsx")
}
fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}
fn default_max_backups() -> usize {
    50
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            help_command: default_help_command(),
            stats_command: default_stats_command(),
            mention_all_command: default_mention_all_command(),
            mention_all_visible_command: default_mention_all_visible_command(),
            message_delay_ms: default_message_delay_ms(),
            rate_limit_secs: default_rate_limit_secs(),
            admins: Vec::new(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ready_grace_ms: default_ready_grace_ms(),
            data_file: default_data_file(),
            backup_dir: default_backup_dir(),
            max_backups: default_max_backups(),
        }
    }
}

impl BotConfig {
    /// Loads and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: BotConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.command_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("command_prefix must not be empty".into()));
        }
        let commands = [
            &self.help_command,
            &self.stats_command,
            &self.mention_all_command,
            &self.mention_all_visible_command,
        ];
        if commands.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("command names must not be empty".into()));
        }
        if self.reconnect_attempts == 0 {
            return Err(ConfigError::Invalid("reconnect_attempts must be > 0".into()));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_file must not be empty".into()));
        }
        Ok(())
    }

    /// Whether `user_id` (e.g. `559800000000@c.us`) is on the allow-list.
    pub fn is_admin(&self, user_id: &str) -> bool {
        let phone = user_id.strip_suffix("@c.us").unwrap_or(user_id);
        self.admins.iter().any(|admin| admin == phone)
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ready_grace(&self) -> Duration {
        Duration::from_millis(self.ready_grace_ms)
    }

    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
