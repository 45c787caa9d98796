//! httpwire - HTTP/1.1 message engine
//!
//! Incremental request parsing, ordered response writing and a
//! one-response-per-connection TCP server, built directly on tokio sockets.

pub mod app;
pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
