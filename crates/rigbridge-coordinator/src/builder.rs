//! CoordinatorBuilder -- fluent construction of a [`Coordinator`].
//!
//! # Example
//!
//! ```no_run
//! use rigbridge_coordinator::CoordinatorBuilder;
//! use std::time::Duration;
//!
//! # async fn example(engine: Box<dyn rigbridge_core::ProtocolEngine>) -> rigbridge_core::Result<()> {
//! let rig = CoordinatorBuilder::new(engine)
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(19_200)
//!     .cache_ttl(Duration::from_millis(250))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use rigbridge_core::error::{Error, Result};
use rigbridge_core::{command_timeout_for_baud, ProtocolEngine, SerialLink, Transport};

use crate::cache::{ReadCache, DEFAULT_CACHE_TTL};
use crate::coordinator::Coordinator;
use crate::worker::{self, Worker};

const DEFAULT_QUEUE_DEPTH: usize = 32;

pub struct CoordinatorBuilder {
    engine: Box<dyn ProtocolEngine>,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    command_timeout: Option<Duration>,
    cache_ttl: Duration,
    queue_depth: usize,
    cancel: Option<CancellationToken>,
}

impl CoordinatorBuilder {
    pub fn new(engine: Box<dyn ProtocolEngine>) -> Self {
        CoordinatorBuilder {
            engine,
            serial_port: None,
            baud_rate: None,
            command_timeout: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            cancel: None,
        }
    }

    /// Serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Per-exchange timeout. Defaults to 1 s, or 2 s at 4800 baud and below.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Lifetime of cached reads (default 500 ms, zero disables the cache).
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// How many requests may wait for the worker before callers block.
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Stop the worker when `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn effective_baud(&self) -> u32 {
        self.baud_rate
            .unwrap_or_else(|| self.engine.default_baud_rate())
    }

    /// Start a coordinator on a caller-provided transport.
    ///
    /// Runs the engine's connection setup before the worker starts, so a
    /// rig that does not answer fails here rather than on first use.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<Coordinator> {
        if self.queue_depth == 0 {
            return Err(Error::InvalidParameter(
                "queue depth must be at least 1".into(),
            ));
        }
        let command_timeout = self
            .command_timeout
            .unwrap_or_else(|| command_timeout_for_baud(self.effective_baud()));

        let mut engine = self.engine;
        let mut link = SerialLink::new(transport, command_timeout);
        engine.initialize(&mut link).await?;

        let info = engine.info().clone();
        let capabilities = engine.capabilities().clone();
        tracing::info!(
            model = %info.model_name,
            timeout_ms = command_timeout.as_millis() as u64,
            cache_ttl_ms = self.cache_ttl.as_millis() as u64,
            "coordinator started"
        );

        let (tx, rx) = mpsc::channel(self.queue_depth);
        let cancel = self.cancel.unwrap_or_default();
        let worker = Worker::new(link, engine, ReadCache::new(self.cache_ttl));
        let task = tokio::spawn(worker::run(worker, rx, cancel.clone()));

        Ok(Coordinator::new(
            tx,
            info,
            capabilities,
            command_timeout,
            cancel,
            task,
        ))
    }

    /// Open the serial port and start a coordinator on it.
    pub async fn build(self) -> Result<Coordinator> {
        let port = self
            .serial_port
            .clone()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let baud = self.effective_baud();
        let transport = rigbridge_transport::SerialTransport::open(&port, baud).await?;
        tracing::info!(port = %port, baud, "serial port open");
        self.build_with_transport(Box::new(transport)).await
    }
}
