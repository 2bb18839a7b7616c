//! linger - HTTP/1.1 server with keep-alive and idle-timeout handling
//!
//! Core library for connection handling and the HTTP protocol.

pub mod config;
pub mod http;
pub mod server;
