//! Connection acceptance and dispatch.
//!
//! [`listener::Server`] owns the accept loop and the table of live
//! connections. [`dispatcher::drive`] runs one connection's state machine
//! against its socket and idle timer.

pub mod dispatcher;
pub mod listener;

pub use dispatcher::ConnectionSettings;
pub use listener::{Server, ServerHandle};
