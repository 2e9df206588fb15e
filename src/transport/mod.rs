//! Messaging transport seam
//!
//! The chat network client lives outside this crate. The bot only needs a
//! `Transport`: connect, pull the next inbound message, push an outbound
//! one. `ConsoleTransport` speaks line-delimited JSON over stdin/stdout.

mod console;

pub use console::ConsoleTransport;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};

/// Chat id used by the status broadcast pseudo-chat
pub const STATUS_BROADCAST: &str = "status@broadcast";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single malformed inbound message; the connection is still usable
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One inbound chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Chat the message arrived in (group id or private chat id)
    pub chat: String,
    /// Author id, e.g. `559800000000@c.us`
    pub sender: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub body: String,
    /// Sent by the bot's own account
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    /// Member ids of the group, empty for private chats
    #[serde(default)]
    pub participants: Vec<String>,
}

impl InboundMessage {
    /// Name shown in stats and logs.
    pub fn display_name(&self) -> &str {
        match self.sender_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.sender.strip_suffix("@c.us").unwrap_or(&self.sender),
        }
    }
}

/// One outbound action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    /// Quote-reply to the inbound message
    Reply { chat: String, text: String },
    /// Plain message to a chat, optionally mentioning members
    Send {
        chat: String,
        text: String,
        mentions: Vec<String>,
    },
}

impl Outbound {
    pub fn reply(chat: impl Into<String>, text: impl Into<String>) -> Self {
        Outbound::Reply {
            chat: chat.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Outbound::Reply { text, .. } | Outbound::Send { text, .. } => text,
        }
    }
}

/// Message transport
pub trait Transport {
    /// (Re)establishes the connection.
    fn connect(&mut self) -> impl Future<Output = TransportResult<()>> + Send;

    /// Next inbound message; `None` once the transport is exhausted.
    fn next_message(
        &mut self,
    ) -> impl Future<Output = TransportResult<Option<InboundMessage>>> + Send;

    fn send(&mut self, message: &Outbound) -> impl Future<Output = TransportResult<()>> + Send;
}

/// Connects with a bounded number of attempts and a fixed pause between
/// them.
pub async fn connect_with_retry<T: Transport>(
    transport: &mut T,
    attempts: u32,
    delay: Duration,
) -> TransportResult<()> {
    let mut last_error = TransportError::ConnectionFailed("no attempt made".to_string());

    for attempt in 1..=attempts {
        log_event_with_fields(
            Event::ReconnectAttempt,
            &[
                ("attempt", &attempt.to_string()),
                ("max", &attempts.to_string()),
            ],
        );

        match transport.connect().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                log_event_with_fields(
                    Event::TransportDisconnected,
                    &[("attempt", &attempt.to_string()), ("error", &e.to_string())],
                );
                last_error = e;
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    log_event_with_fields(
        Event::ReconnectExhausted,
        &[("attempts", &attempts.to_string())],
    );
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails `failures` connects, then succeeds
    struct FlakyTransport {
        failures: u32,
        connects: u32,
    }

    impl Transport for FlakyTransport {
        async fn connect(&mut self) -> TransportResult<()> {
            self.connects += 1;
            if self.connects <= self.failures {
                Err(TransportError::ConnectionFailed("pairing timed out".into()))
            } else {
                Ok(())
            }
        }

        async fn next_message(&mut self) -> TransportResult<Option<InboundMessage>> {
            Ok(None)
        }

        async fn send(&mut self, _message: &Outbound) -> TransportResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let mut transport = FlakyTransport {
            failures: 2,
            connects: 0,
        };
        connect_with_retry(&mut transport, 5, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(transport.connects, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_is_bounded() {
        let mut transport = FlakyTransport {
            failures: 10,
            connects: 0,
        };
        let started = tokio::time::Instant::now();
        let err = connect_with_retry(&mut transport, 3, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::ConnectionFailed(_)));
        assert_eq!(transport.connects, 3);
        // Two pauses between three attempts
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_inbound_defaults() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"chat":"c","sender":"1@c.us","body":"!rotas"}"#).unwrap();
        assert!(!msg.from_me);
        assert!(!msg.is_group);
        assert!(msg.participants.is_empty());
        assert_eq!(msg.display_name(), "1");
    }

    #[test]
    fn test_outbound_wire_format() {
        let json = serde_json::to_value(Outbound::reply("c1", "oi")).unwrap();
        assert_eq!(json["kind"], "reply");
        assert_eq!(json["chat"], "c1");
        assert_eq!(json["text"], "oi");
    }
}
