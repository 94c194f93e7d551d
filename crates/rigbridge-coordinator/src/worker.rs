//! The worker task that owns the serial link.
//!
//! Requests arrive on one bounded channel and are executed strictly in
//! arrival order, one round trip at a time. Only this task touches the
//! link, the protocol engine and the read cache.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use rigbridge_core::error::Result;
use rigbridge_core::{Operation, ProtocolEngine, Reply, SerialLink, Transport};

use crate::cache::{CacheKey, ReadCache};

pub(crate) enum Request {
    Execute {
        op: Operation,
        reply: oneshot::Sender<Result<Reply>>,
    },
    /// Stop and hand the transport back.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

pub(crate) struct Worker {
    link: SerialLink,
    engine: Box<dyn ProtocolEngine>,
    cache: ReadCache,
    /// The last exchange left the stream out of step.
    needs_flush: bool,
}

impl Worker {
    pub(crate) fn new(link: SerialLink, engine: Box<dyn ProtocolEngine>, cache: ReadCache) -> Self {
        Worker {
            link,
            engine,
            cache,
            needs_flush: false,
        }
    }

    async fn handle(&mut self, op: Operation) -> Result<Reply> {
        let key = CacheKey::for_read(&op);
        if let Some(hit) = key.as_ref().and_then(|k| self.cache.get(k)) {
            trace!(op = %op, "cache hit");
            return Ok(hit);
        }

        if self.needs_flush {
            if let Err(e) = self.link.flush().await {
                warn!("flush after desync failed: {e}");
            }
            self.needs_flush = false;
        }

        let result = self.engine.execute(&mut self.link, &op).await;
        match &result {
            Ok(reply) => {
                if let Some(key) = key {
                    self.cache.insert(key, reply.clone());
                }
            }
            Err(e) if e.desyncs_link() => {
                warn!(op = %op, "link out of step, flushing before next command: {e}");
                self.needs_flush = true;
                self.engine.reset();
                self.cache.clear();
            }
            Err(e) => debug!(op = %op, "operation failed: {e}"),
        }
        // A failed write may still have changed part of the rig state.
        self.cache.invalidate_for(&op);
        result
    }
}

/// Run until shutdown, cancellation, or every handle is dropped.
pub(crate) async fn run(
    mut worker: Worker,
    mut rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("coordinator worker cancelled");
                break;
            }

            req = rx.recv() => match req {
                Some(Request::Execute { op, reply }) => {
                    // Runs even when the caller has gone.
                    let result = worker.handle(op).await;
                    if reply.send(result).is_err() {
                        debug!("caller gone before its reply");
                    }
                }
                Some(Request::Shutdown { reply }) => {
                    debug!("coordinator shutdown requested");
                    let _ = reply.send(worker.link.into_transport());
                    return;
                }
                None => {
                    debug!("all coordinator handles dropped");
                    break;
                }
            },
        }
    }
    worker.link.close().await;
}
