//! Observable events for rotabot
//!
//! Events are explicit and typed; the logger only ever sees their
//! string form.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Transport connected and reported ready
    TransportReady,
    /// Grace period elapsed, commands are served
    Serving,
    /// Transport disconnected
    TransportDisconnected,
    /// Reconnect attempt
    ReconnectAttempt,
    /// Reconnect attempts exhausted
    ReconnectExhausted,
    /// Shutdown complete
    ShutdownComplete,

    // Spreadsheet
    /// Spreadsheet load started
    SheetLoadBegin,
    /// Spreadsheet loaded
    SheetLoaded,
    /// Spreadsheet could not be loaded (registry stays empty)
    SheetLoadFailed,
    /// Spreadsheet saved
    SheetSaved,
    /// Spreadsheet save failed
    SheetSaveFailed,

    // Backup
    /// Backup copy written
    BackupComplete,
    /// Backup copy failed
    BackupFailed,
    /// Old backups removed by retention
    BackupPruned,

    // Registry
    /// Route inserted
    RouteInserted,
    /// Route updated
    RouteUpdated,
    /// In-memory change reverted after a failed save
    RouteRolledBack,

    // Commands
    /// Command received
    CommandReceived,
    /// Command rejected by the rate limiter
    RateLimited,
    /// Command rejected, bot still warming up
    NotReady,
    /// Admin command refused
    PermissionDenied,
    /// Unknown command
    CommandUnknown,
    /// Mention broadcast sent
    MentionSent,
    /// Message ignored (own message, status broadcast)
    MessageIgnored,
    /// Handler failed to deliver a reply
    ReplyFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOT_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TransportReady => "TRANSPORT_READY",
            Event::Serving => "BOT_SERVING",
            Event::TransportDisconnected => "TRANSPORT_DISCONNECTED",
            Event::ReconnectAttempt => "RECONNECT_ATTEMPT",
            Event::ReconnectExhausted => "RECONNECT_EXHAUSTED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SheetLoadBegin => "SHEET_LOAD_BEGIN",
            Event::SheetLoaded => "SHEET_LOADED",
            Event::SheetLoadFailed => "SHEET_LOAD_FAILED",
            Event::SheetSaved => "SHEET_SAVED",
            Event::SheetSaveFailed => "SHEET_SAVE_FAILED",

            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::BackupFailed => "BACKUP_FAILED",
            Event::BackupPruned => "BACKUP_PRUNED",

            Event::RouteInserted => "ROUTE_INSERTED",
            Event::RouteUpdated => "ROUTE_UPDATED",
            Event::RouteRolledBack => "ROUTE_ROLLED_BACK",

            Event::CommandReceived => "COMMAND_RECEIVED",
            Event::RateLimited => "RATE_LIMITED",
            Event::NotReady => "NOT_READY",
            Event::PermissionDenied => "PERMISSION_DENIED",
            Event::CommandUnknown => "COMMAND_UNKNOWN",
            Event::MentionSent => "MENTION_SENT",
            Event::MessageIgnored => "MESSAGE_IGNORED",
            Event::ReplyFailed => "REPLY_FAILED",
        }
    }

    /// Events that are logged at WARN rather than INFO
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::SheetLoadFailed
                | Event::TransportDisconnected
                | Event::RateLimited
                | Event::PermissionDenied
                | Event::RouteRolledBack
        )
    }

    /// Events that are logged at ERROR
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::SheetSaveFailed
                | Event::BackupFailed
                | Event::ReconnectExhausted
                | Event::ReplyFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
