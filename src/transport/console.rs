//! Line-delimited JSON transport
//!
//! - Input: one `InboundMessage` JSON object per line
//! - Output: one `Outbound` JSON object per line
//! - Blank input lines are skipped
//! - UTF-8 only

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::io::{Stdin, Stdout};

use super::{InboundMessage, Outbound, Transport, TransportError, TransportResult};

pub struct ConsoleTransport<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl ConsoleTransport<BufReader<Stdin>, Stdout> {
    /// Transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn connect(&mut self) -> TransportResult<()> {
        Ok(())
    }

    async fn next_message(&mut self) -> TransportResult<Option<InboundMessage>> {
        loop {
            let line = match self.lines.next_line().await? {
                Some(line) => line,
                None => return Ok(None),
            };
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| TransportError::InvalidMessage(e.to_string()));
        }
    }

    async fn send(&mut self, message: &Outbound) -> TransportResult<()> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| TransportError::InvalidMessage(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
