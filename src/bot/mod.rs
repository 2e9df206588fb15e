//! Chat bot front end for the route registry
//!
//! - `commands`: text to `Command`
//! - `dispatcher`: readiness, rate limiting, execution
//! - `reply`: every user-facing text
//! - `context`: state shared by one running bot
//!
//! `serve` drives a `Transport` until its input is exhausted.

mod commands;
mod context;
mod dispatcher;
mod rate_limit;
pub mod reply;
mod stats;

pub use commands::{normalize, parse_new_route, parse_update, Command};
pub use context::{xlsx_store, BotContext, Readiness};
pub use dispatcher::Dispatcher;
pub use rate_limit::{RateLimited, RateLimiter};
pub use stats::{CommandStats, UserStats};

use std::sync::Arc;

use tokio::time::Instant;

use crate::observability::{log_event, log_event_with_fields, Event};
use crate::transport::{connect_with_retry, Transport, TransportError, TransportResult};

/// Connects, loads the registry in the background and handles messages one
/// at a time until the transport reports end of input.
///
/// Transport failures reconnect with the configured bounds; they never
/// reload the registry. Running out of reconnect attempts ends the loop with
/// the last error.
pub async fn serve<T: Transport>(ctx: Arc<BotContext>, transport: &mut T) -> TransportResult<()> {
    let attempts = ctx.config().reconnect_attempts;
    let delay = ctx.config().reconnect_delay();

    connect_with_retry(transport, attempts, delay).await?;
    ctx.mark_ready(Instant::now()).await;

    let loader = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { ctx.load_routes().await })
    };

    log_event(Event::Serving);
    let dispatcher = Dispatcher::new(Arc::clone(&ctx));

    loop {
        match transport.next_message().await {
            Ok(Some(msg)) => {
                for out in dispatcher.handle(&msg).await {
                    if let Err(e) = transport.send(&out).await {
                        log_event_with_fields(
                            Event::ReplyFailed,
                            &[("chat", &msg.chat), ("error", &e.to_string())],
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(TransportError::InvalidMessage(detail)) => {
                log_event_with_fields(Event::MessageIgnored, &[("reason", &detail)]);
            }
            Err(e) => {
                log_event_with_fields(Event::TransportDisconnected, &[("error", &e.to_string())]);
                ctx.mark_disconnected().await;
                connect_with_retry(transport, attempts, delay).await?;
                ctx.mark_ready(Instant::now()).await;
            }
        }
    }

    if let Err(e) = loader.await {
        log_event_with_fields(Event::SheetLoadFailed, &[("error", &e.to_string())]);
    }
    log_event(Event::ShutdownComplete);
    Ok(())
}
