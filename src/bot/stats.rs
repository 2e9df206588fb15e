//! Command usage statistics
//!
//! - Counters only, reset on process start
//! - Per command counts iterate in name order
//! - Per user counts with the last command and when it ran

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};

/// Usage of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub count: u64,
    /// Display name at the user's most recent command
    pub name: String,
    pub last_command: String,
    pub last_command_time: DateTime<Utc>,
}

impl UserStats {
    /// RFC 3339 timestamp of the last command.
    pub fn last_command_rfc3339(&self) -> String {
        self.last_command_time
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Default)]
pub struct CommandStats {
    total: u64,
    by_command: BTreeMap<String, u64>,
    users: HashMap<String, UserStats>,
}

impl CommandStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one executed command.
    pub fn record(&mut self, user_id: &str, user_name: &str, command: &str, at: DateTime<Utc>) {
        self.total += 1;
        *self.by_command.entry(command.to_string()).or_insert(0) += 1;

        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserStats {
                count: 0,
                name: user_name.to_string(),
                last_command: String::new(),
                last_command_time: at,
            });
        user.count += 1;
        if !user_name.trim().is_empty() {
            user.name = user_name.to_string();
        }
        user.last_command = command.to_string();
        user.last_command_time = at;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn by_command(&self) -> &BTreeMap<String, u64> {
        &self.by_command
    }

    pub fn user(&self, user_id: &str) -> Option<&UserStats> {
        self.users.get(user_id)
    }

    /// Up to `n` users, most active first. Ties are broken by user id.
    pub fn top_users(&self, n: usize) -> Vec<(&str, &UserStats)> {
        let mut users: Vec<_> = self
            .users
            .iter()
            .map(|(id, stats)| (id.as_str(), stats))
            .collect();
        users.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        users.truncate(n);
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_record_counts() {
        let mut stats = CommandStats::new();
        stats.record("1@c.us", "Ana", "rota", at(0));
        stats.record("1@c.us", "Ana", "rotas", at(1));
        stats.record("2@c.us", "Bia", "rota", at(2));

        assert_eq!(stats.total(), 3);
        assert_eq!(stats.by_command().get("rota"), Some(&2));
        assert_eq!(stats.by_command().get("rotas"), Some(&1));

        let ana = stats.user("1@c.us").unwrap();
        assert_eq!(ana.count, 2);
        assert_eq!(ana.last_command, "rotas");
        assert_eq!(ana.last_command_time, at(1));
    }

    #[test]
    fn test_by_command_is_name_ordered() {
        let mut stats = CommandStats::new();
        for cmd in ["rotas", "ajuda", "motorista"] {
            stats.record("1", "Ana", cmd, at(0));
        }
        let names: Vec<_> = stats.by_command().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ajuda", "motorista", "rotas"]);
    }

    #[test]
    fn test_top_users_ordering_and_limit() {
        let mut stats = CommandStats::new();
        for (user, times) in [("a", 1), ("b", 3), ("c", 3), ("d", 2), ("e", 1), ("f", 5)] {
            for _ in 0..times {
                stats.record(user, user, "rota", at(0));
            }
        }

        let top: Vec<_> = stats.top_users(5).into_iter().map(|(id, _)| id).collect();
        assert_eq!(top, vec!["f", "b", "c", "d", "a"]);
    }

    #[test]
    fn test_blank_name_keeps_previous() {
        let mut stats = CommandStats::new();
        stats.record("1", "Ana", "rota", at(0));
        stats.record("1", " ", "rota", at(1));
        assert_eq!(stats.user("1").unwrap().name, "Ana");
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let mut stats = CommandStats::new();
        stats.record("1", "Ana", "rota", at(0));
        assert_eq!(
            stats.user("1").unwrap().last_command_rfc3339(),
            "2023-11-14T22:13:20.000Z"
        );
    }
}
