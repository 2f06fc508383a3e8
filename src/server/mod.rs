//! Connection dispatcher
//!
//! Accepts viewer TCP connections and binds each one to a free sink slot,
//! starting a dedicated encode channel for slots beyond 0. Per-connection
//! errors are contained and logged; the accept loop keeps running.

pub mod config;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_MAX_STREAMS};
pub use listener::VideoServer;
