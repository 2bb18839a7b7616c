//! HTTP/1.1 protocol handling.
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: Per-connection state machine for request reception and idle timeouts
//! - **`buffer`**: Bounded receive buffer holding unparsed request bytes
//! - **`timer`**: Last-activity tracking and idle deadline
//! - **`parser`**: Finds request boundaries and parses requests from byte buffers
//! - **`request`**: HTTP request representation and header helpers
//! - **`response`**: HTTP response representation with builder pattern
//! - **`resolver`**: Maps requests to responses
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Awaiting   │ ← No byte of the next request yet
//!        └──────┬──────┘
//!               │ Bytes arrive            timer, buffer empty → Closing (silent)
//!               ▼
//!        ┌──────────────────┐
//!        │   Receiving      │ ← Request incomplete
//!        └──────┬───────────┘             timer, buffer non-empty → 408, Closing
//!               │ Request complete        malformed → 4xx/5xx, Closing
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve and write response
//!        └──────┬───────────┘
//!               │ Response written
//!               ├─ Keep-Alive → Awaiting (same connection, timer reset)
//!               └─ Close → Closing → Closed
//! ```
//!
//! A peer close in any state goes straight to `Closing` without a response.

pub mod buffer;
pub mod connection;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod timer;
pub mod writer;
