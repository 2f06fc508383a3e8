//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Hardware limit on simultaneous encode channels (splitter ports)
pub const DEFAULT_MAX_STREAMS: usize = 4;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Number of sink slots, capped by the encoder's splitter ports
    pub max_streams: usize,

    /// Write buffer size per viewer connection, in bytes
    pub buffer_size: usize,

    /// How often a connection monitor re-checks viewer liveness
    pub monitor_interval: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:10000".parse().unwrap(),
            max_streams: DEFAULT_MAX_STREAMS,
            buffer_size: 16 * 1024,
            monitor_interval: Duration::from_secs(5),
            tcp_nodelay: true, // Important for low latency
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the number of sink slots (minimum 1)
    pub fn max_streams(mut self, max: usize) -> Self {
        self.max_streams = max.max(1);
        self
    }

    /// Set the per-viewer write buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the monitor interval
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }
}
