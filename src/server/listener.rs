//! Video server listener
//!
//! Handles the TCP accept loop and drives slot allocation. Each accepted
//! viewer is served in its own task so the accept loop never blocks on one
//! connection's lifetime.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::BufWriter;
use tokio::net::{TcpListener, TcpStream};

use crate::encoder::{spawn_encode_channel, EncoderSource};
use crate::error::{Error, Result};
use crate::sink::{NetHandle, SinkPool, VideoSink};
use crate::stats::ServerStats;

use super::config::ServerConfig;

/// MJPEG distribution server for one camera node
pub struct VideoServer<E: EncoderSource> {
    config: ServerConfig,
    encoder: Arc<E>,
    pool: Arc<SinkPool>,
    stats: Arc<ServerStats>,
}

impl<E: EncoderSource> VideoServer<E> {
    /// Create a new server with the given configuration and encoder source
    pub fn new(config: ServerConfig, encoder: E) -> Self {
        let pool = Arc::new(SinkPool::new(config.max_streams));

        Self {
            config,
            encoder: Arc::new(encoder),
            pool,
            stats: Arc::new(ServerStats::new()),
        }
    }

    /// Get a reference to the sink pool
    pub fn pool(&self) -> &Arc<SinkPool> {
        &self.pool
    }

    /// Get a reference to the encoder source
    pub fn encoder(&self) -> &Arc<E> {
        &self.encoder
    }

    /// The split sink at slot 0; handed to the recording controller
    pub fn split_sink(&self) -> Arc<VideoSink> {
        self.pool.split_sink()
    }

    /// Connection counters
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server until the encoder stops
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_with(listener, shutdown).await
    }

    /// Run on an already-bound listener
    ///
    /// Slot 0's encode channel starts here and runs permanently, so recording
    /// can begin at any moment without encoder-attach latency. If that
    /// channel ever finishes on its own, the encoder died and the whole
    /// server tears down.
    pub async fn serve_with<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tracing::info!(
            addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            slots = self.pool.capacity(),
            "Video server listening"
        );

        let rx = self.encoder.attach(0)?;
        let mut split_channel = spawn_encode_channel(0, rx, self.pool.split_sink());

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
            _ = &mut split_channel => Err(Error::EncoderStopped),
        };

        split_channel.abort();
        self.close().await;

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        self.stats.record_accepted();

        if self.config.tcp_nodelay {
            let _ = socket.set_nodelay(true);
        }

        let config = self.config.clone();
        let pool = Arc::clone(&self.pool);
        let encoder = Arc::clone(&self.encoder);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            tracing::info!(peer = %peer_addr, "Connection opened");

            if let Err(e) = serve_viewer(socket, &config, &pool, &encoder).await {
                if matches!(e, Error::PoolExhausted { .. }) {
                    stats.record_rejected();
                }
                tracing::warn!(peer = %peer_addr, error = %e, "Problem handling viewer");
            }

            tracing::info!(
                peer = %peer_addr,
                active_streams = pool.active_streams(),
                "Connection closed"
            );
        });
    }

    /// Tear the whole server down: every sink closed, every port detached
    pub async fn close(&self) {
        self.pool.close_all().await;
        for port in 0..self.pool.capacity() {
            self.encoder.detach(port);
        }
    }
}

/// Bind one viewer to a slot and watch it until it disconnects
///
/// Slot 0 is fed by the permanent split channel, so its handler returns
/// immediately. Other slots get a dedicated encode channel, reclaimed within
/// one monitor interval of the viewer going away.
async fn serve_viewer<E: EncoderSource>(
    socket: TcpStream,
    config: &ServerConfig,
    pool: &Arc<SinkPool>,
    encoder: &Arc<E>,
) -> Result<()> {
    // The protocol is write-only: chunks start flowing on connect, no
    // handshake. The read half is dropped; disconnects surface as write
    // failures.
    let (_read_half, write_half) = socket.into_split();
    let handle: NetHandle = Box::new(BufWriter::with_capacity(config.buffer_size, write_half));

    let binding = pool.bind(handle).await?;
    tracing::debug!(slot = binding.slot, "Viewer bound");

    if !binding.starts_channel {
        return Ok(());
    }

    let sink = pool
        .slot(binding.slot)
        .ok_or(Error::PortOutOfRange(binding.slot))?;

    let rx = encoder.attach(binding.slot)?;
    let pump = spawn_encode_channel(binding.slot, rx, Arc::clone(&sink));

    loop {
        tokio::time::sleep(config.monitor_interval).await;
        if !sink.is_active() {
            break;
        }
    }

    pump.abort();
    encoder.detach(binding.slot);
    tracing::debug!(slot = binding.slot, "Encode channel released");

    Ok(())
}
