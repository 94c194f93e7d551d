//! The TCP listener and per-connection loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use rigbridge_core::Rig;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::Session;

/// The port rigctld listens on by default.
pub const DEFAULT_PORT: u16 = 4532;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen: SocketAddr,
    /// Longest accepted command line, excluding the newline. Longer lines
    /// close the connection.
    pub max_line: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            max_line: 1024,
        }
    }
}

/// A rigctld-compatible server for one rig.
pub struct RigctldServer {
    listener: TcpListener,
    rig: Arc<dyn Rig>,
    config: ServerConfig,
}

impl RigctldServer {
    pub async fn bind(config: ServerConfig, rig: Arc<dyn Rig>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.listen)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.listen,
                source,
            })?;
        Ok(RigctldServer {
            listener,
            rig,
            config,
        })
    }

    /// The bound address; useful when listening on port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients until `cancel` fires. Each client runs in its own task
    /// and is stopped by the same token.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, rig = %self.rig.info().model_name, "rigctld listening");
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("rigctld server cancelled");
                    break;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "client connected");
                        let rig = self.rig.clone();
                        let max_line = self.config.max_line;
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            match serve(stream, rig, max_line, cancel).await {
                                Ok(()) => info!(%peer, "client disconnected"),
                                Err(e) => warn!(%peer, "client connection failed: {e}"),
                            }
                        });
                    }
                    // Typically fd exhaustion; the listener itself is still usable.
                    Err(e) => warn!("accept failed: {e}"),
                },
            }
        }
        Ok(())
    }
}

async fn serve(
    stream: TcpStream,
    rig: Arc<dyn Rig>,
    max_line: usize,
    cancel: CancellationToken,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut session = Session::new(rig);
    let mut buf = Vec::with_capacity(128);

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(max_line as u64 + 1);
        let n = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            n = limited.read_until(b'\n', &mut buf) => n?,
        };
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && n > max_line {
            warn!(max_line, "command line too long, closing");
            break;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\r', '\n']);
        debug!(line, "command");
        let reply = session.handle_line(line).await;
        if !reply.output.is_empty() {
            writer.write_all(reply.output.as_bytes()).await?;
        }
        if reply.close {
            break;
        }
    }
    writer.shutdown().await
}
