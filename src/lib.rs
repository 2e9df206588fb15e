//! rotabot - school bus route registry behind a chat bot
//!
//! Routes live in an `.xlsx` spreadsheet. The bot answers lookup commands
//! from anyone and lets admins add or update routes; every write is preceded
//! by a timestamped backup of the file.

pub mod backup;
pub mod bot;
pub mod cli;
pub mod config;
pub mod observability;
pub mod routes;
pub mod storage;
pub mod transport;
