//! Framed, deadline-bounded access to a [`Transport`].
//!
//! A [`SerialLink`] owns the transport and a small carry-over buffer. Protocol
//! engines use it to write a command and then read either an exact number of
//! bytes (echo checking) or everything up to a terminator (`0xFD` for CI-V,
//! `;` for text CAT). Every read is bounded by the link's command timeout; a
//! reply that does not complete in time yields [`Error::Timeout`].
//!
//! Bytes received past a terminator are kept for the next read. After a
//! timeout or a desync the owner calls [`SerialLink::flush`] so the next
//! exchange starts clean.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Upper bound on buffered reply bytes before a read is abandoned.
const MAX_BUF: usize = 8192;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Pick a command timeout suited to the line speed.
///
/// Slow links (4800 baud and below) get twice the default so long replies
/// such as memory contents still fit in the window.
pub fn command_timeout_for_baud(baud_rate: u32) -> Duration {
    if baud_rate <= 4800 {
        DEFAULT_COMMAND_TIMEOUT * 2
    } else {
        DEFAULT_COMMAND_TIMEOUT
    }
}

/// A transport plus framing state, exclusively owned by one coordinator.
pub struct SerialLink {
    transport: Box<dyn Transport>,
    pending: Vec<u8>,
    timeout: Duration,
}

impl SerialLink {
    pub fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        SerialLink {
            transport,
            pending: Vec::new(),
            timeout,
        }
    }

    /// The per-command timeout applied to every read.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Write a complete command.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.transport.is_connected() {
            return Err(Error::NotConnected);
        }
        self.transport.send(data).await
    }

    /// Read exactly `len` bytes before the command deadline.
    pub async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;
        while self.pending.len() < len {
            self.fill(deadline).await?;
        }
        Ok(self.pending.drain(..len).collect())
    }

    /// Read up to and including `terminator` before the command deadline.
    pub async fn read_until(&mut self, terminator: u8) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;
        let mut scanned = 0;
        loop {
            if let Some(pos) = self.pending[scanned..]
                .iter()
                .position(|&b| b == terminator)
            {
                let end = scanned + pos + 1;
                return Ok(self.pending.drain(..end).collect());
            }
            scanned = self.pending.len();
            if scanned > MAX_BUF {
                tracing::warn!(len = scanned, "reply buffer overflow, discarding");
                self.pending.clear();
                return Err(Error::InvalidResponse(
                    "reply exceeded buffer without terminator".into(),
                ));
            }
            self.fill(deadline).await?;
        }
    }

    /// Discard everything buffered here and in the device driver.
    pub async fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            tracing::debug!(len = self.pending.len(), "discarding buffered bytes");
            self.pending.clear();
        }
        self.transport.clear_input().await
    }

    /// Close the link and hand back the transport.
    pub async fn close(mut self) -> Box<dyn Transport> {
        if let Err(e) = self.transport.close().await {
            tracing::debug!("transport close failed: {e}");
        }
        self.transport
    }

    /// Hand back the transport without closing it.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }

    async fn fill(&mut self, deadline: Instant) -> Result<()> {
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout);
        }
        let mut buf = [0u8; 256];
        let n = self.transport.receive(&mut buf, deadline - now).await?;
        if n == 0 {
            return Err(Error::Timeout);
        }
        self.pending.extend_from_slice(&buf[..n]);
        Ok(())
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("pending", &self.pending.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
