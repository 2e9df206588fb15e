//! Inbound message dispatch
//!
//! ```text
//! message ─▶ ignore own/status ─▶ parse ─▶ ready? ─▶ rate limit ─▶ delay
//!                                  │                                  │
//!                                  └▶ private auto-response   stats ◀─┘
//!                                                               │
//!                                                            execute ─▶ replies
//! ```
//!
//! Every failure ends in a reply (or in silence for ignored messages);
//! nothing here returns an error to the serve loop.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use super::commands::{self, Command};
use super::context::BotContext;
use super::reply;
use crate::observability::{log_event_with_fields, Event};
use crate::routes::{RouteError, RouteField, RouteRegistry, RouteResult};
use crate::transport::{InboundMessage, Outbound, STATUS_BROADCAST};

const GREETINGS: [&str; 3] = ["oi", "olá", "ola"];
const HELP_WORDS: [&str; 2] = ["ajuda", "help"];
const HOW_TO_PHRASES: [&str; 2] = ["como usar", "como funciona"];

pub struct Dispatcher {
    ctx: Arc<BotContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Handles one inbound message and returns what to send back.
    pub async fn handle(&self, msg: &InboundMessage) -> Vec<Outbound> {
        if msg.from_me || msg.chat == STATUS_BROADCAST {
            log_event_with_fields(Event::MessageIgnored, &[("chat", &msg.chat)]);
            return Vec::new();
        }

        let config = self.ctx.config();
        let command = match Command::parse(&msg.body, config) {
            Some(command) => command,
            None => return self.auto_response(msg).await,
        };

        log_event_with_fields(
            Event::CommandReceived,
            &[
                ("chat", &msg.chat),
                ("command", command.name()),
                ("group", if msg.is_group { "true" } else { "false" }),
                ("sender", &msg.sender),
            ],
        );

        let now = Instant::now();
        if !self.ctx.is_ready(now).await {
            log_event_with_fields(Event::NotReady, &[("sender", &msg.sender)]);
            return vec![Outbound::reply(&msg.chat, reply::NOT_READY)];
        }

        let key = commands::normalize(&msg.body, &config.command_prefix).unwrap_or_default();
        let limited = self
            .ctx
            .rate_limiter
            .lock()
            .await
            .check(&msg.sender, &key, now);
        if let Err(limited) = limited {
            let seconds = limited.retry_after_secs(config.rate_limit_window());
            log_event_with_fields(
                Event::RateLimited,
                &[
                    ("command", &key),
                    ("retry_after_secs", &seconds.to_string()),
                    ("sender", &msg.sender),
                ],
            );
            return vec![Outbound::reply(&msg.chat, reply::rate_limited(seconds))];
        }

        if command.is_recognized() {
            tokio::time::sleep(config.message_delay()).await;
        }

        self.ctx
            .stats
            .lock()
            .await
            .record(&msg.sender, msg.display_name(), command.name(), Utc::now());

        self.execute(command, msg).await
    }

    async fn execute(&self, command: Command, msg: &InboundMessage) -> Vec<Outbound> {
        let config = self.ctx.config();
        let is_admin = config.is_admin(&msg.sender);

        if command.requires_admin() && !is_admin {
            log_event_with_fields(
                Event::PermissionDenied,
                &[("command", command.name()), ("sender", &msg.sender)],
            );
        }

        let text = match command {
            Command::RoutesHelp => reply::routes_help(config),
            Command::ListRoutes => {
                self.with_registry(|r| Ok(reply::route_list(r.list_all()?)))
                    .await
            }
            Command::GetRoute(key) => {
                self.with_registry(move |r| Ok(reply::route_detail(r.find_by_number(&key)?)))
                    .await
            }
            Command::ByDriver(name) => self.search(RouteField::Driver, name).await,
            Command::ByMonitor(name) => self.search(RouteField::Monitor, name).await,
            Command::ByCompany(name) => self.search(RouteField::Company, name).await,
            Command::AddRoute(_) | Command::UpdateRoute(_) if !is_admin => {
                reply::route_error(&RouteError::PermissionDenied)
            }
            Command::AddRoute(payload) => {
                self.with_registry(move |r| {
                    let route = commands::parse_new_route(&payload)?;
                    r.insert(route)?;
                    Ok(reply::ROUTE_ADDED.to_string())
                })
                .await
            }
            Command::UpdateRoute(payload) => {
                self.with_registry(move |r| {
                    let (key, patch) = commands::parse_update(&payload)?;
                    r.update(&key, &patch)?;
                    Ok(reply::ROUTE_UPDATED.to_string())
                })
                .await
            }
            Command::Help => reply::general_help(config, is_admin),
            Command::Stats if !is_admin => reply::STATS_ADMIN_ONLY.to_string(),
            Command::Stats => reply::stats_report(&*self.ctx.stats.lock().await, config),
            Command::MentionAll => return self.mention_all(msg, false, is_admin),
            Command::MentionAllVisible => return self.mention_all(msg, true, is_admin),
            Command::Unknown(text) => {
                log_event_with_fields(Event::CommandUnknown, &[("command", &text)]);
                reply::unknown_command(config)
            }
        };

        vec![Outbound::reply(&msg.chat, text)]
    }

    /// Runs `op` under the registry lock on the blocking pool; inserts and
    /// updates write the spreadsheet there. Errors become their reply text.
    async fn with_registry<F>(&self, op: F) -> String
    where
        F: FnOnce(&mut RouteRegistry) -> RouteResult<String> + Send + 'static,
    {
        let mut registry = Arc::clone(&self.ctx.registry).lock_owned().await;
        let result = tokio::task::spawn_blocking(move || op(&mut registry))
            .await
            .unwrap_or_else(|e| Err(RouteError::PersistenceFailure(e.to_string())));
        result.unwrap_or_else(|e| reply::route_error(&e))
    }

    async fn search(&self, field: RouteField, query: String) -> String {
        self.with_registry(move |r| {
            let found = r.search(field, &query)?;
            Ok(reply::search_results(field, &query, &found))
        })
        .await
    }

    fn mention_all(&self, msg: &InboundMessage, visible: bool, is_admin: bool) -> Vec<Outbound> {
        let refuse = |text: &str| vec![Outbound::reply(&msg.chat, text)];

        if !msg.is_group {
            return refuse(reply::GROUP_ONLY);
        }
        if !is_admin {
            return refuse(reply::ADMIN_ONLY);
        }
        if msg.participants.is_empty() {
            return refuse(reply::NO_PARTICIPANTS);
        }

        let count = msg.participants.len();
        log_event_with_fields(
            Event::MentionSent,
            &[
                ("chat", &msg.chat),
                ("members", &count.to_string()),
                ("visible", if visible { "true" } else { "false" }),
            ],
        );

        if visible {
            vec![
                Outbound::Send {
                    chat: msg.chat.clone(),
                    text: reply::visible_mention(&msg.participants),
                    mentions: msg.participants.clone(),
                },
                Outbound::reply(&msg.chat, reply::visible_mention_sent(count)),
            ]
        } else {
            vec![Outbound::Send {
                chat: msg.chat.clone(),
                text: String::new(),
                mentions: msg.participants.clone(),
            }]
        }
    }

    /// Canned replies to plain text in private chats. Group chatter and
    /// anything before the bot is ready get no reply.
    async fn auto_response(&self, msg: &InboundMessage) -> Vec<Outbound> {
        if msg.is_group || !self.ctx.is_ready(Instant::now()).await {
            return Vec::new();
        }

        let config = self.ctx.config();
        let text = msg.body.trim().to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |list: &[&str]| words.iter().any(|w| list.contains(w));

        let response = if has_word(&GREETINGS[..]) {
            reply::greeting(msg.display_name(), config)
        } else if has_word(&HELP_WORDS[..]) {
            reply::general_help(config, config.is_admin(&msg.sender))
        } else if HOW_TO_PHRASES.iter().any(|p| text.contains(p)) {
            reply::how_to_use(config)
        } else {
            return Vec::new();
        };

        vec![Outbound::reply(&msg.chat, response)]
    }
}
