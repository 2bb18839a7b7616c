//! Per-connection request reception and idle-timeout state machine.
//!
//! [`Connection`] performs no I/O. The driver in
//! [`crate::server::dispatcher`] feeds it socket and timer events and carries
//! out the [`Step`] each event returns.

use std::time::Duration;
use tokio::time::Instant;

use crate::http::buffer::{BufferError, RecvBuffer};
use crate::http::parser::{Boundary, detect_boundary, leading_crlf_len};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::timer::IdleTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No byte of the next request has arrived yet.
    Awaiting,
    /// Some bytes arrived but no complete request yet.
    Receiving,
    /// A complete request is being turned into a response.
    Processing,
    /// Terminal. The socket is being shut down.
    Closing,
    /// Terminal. Nothing may touch the socket again.
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closing | ConnectionState::Closed)
    }
}

/// What the pending request bytes amount to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Empty,
    Incomplete,
    Complete,
}

/// Work the driver must perform after feeding an event.
#[derive(Debug)]
pub enum Step {
    /// Keep waiting for the socket or the timer.
    Continue,
    /// Resolve this request, write the response, then call
    /// [`Connection::on_response_written`].
    Process(Request),
    /// Write this response, then close.
    Reply(Response),
    /// Close without writing anything.
    Close,
}

#[derive(Debug)]
pub struct Connection {
    buffer: RecvBuffer,
    timer: IdleTimer,
    state: ConnectionState,
    keep_alive: bool,
}

impl Connection {
    pub fn new(idle_timeout: Duration, max_request_size: usize, now: Instant) -> Self {
        Self {
            buffer: RecvBuffer::new(max_request_size),
            timer: IdleTimer::new(idle_timeout, now),
            state: ConnectionState::Awaiting,
            keep_alive: true,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Keep-alive flag of the most recently completed request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn deadline(&self) -> Instant {
        self.timer.deadline()
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn fragment(&self) -> Fragment {
        match self.state {
            ConnectionState::Processing => Fragment::Complete,
            _ if self.buffer.is_empty() => Fragment::Empty,
            _ => Fragment::Incomplete,
        }
    }

    /// Feeds bytes read from the socket. An empty slice means the peer closed.
    pub fn on_bytes(&mut self, data: &[u8], now: Instant) -> Step {
        if data.is_empty() {
            return self.on_peer_closed();
        }
        if self.state.is_terminal() {
            return Step::Continue;
        }

        self.timer.touch(now);
        self.buffer.append(data);

        match self.state {
            ConnectionState::Awaiting => {
                self.transition(ConnectionState::Receiving);
                self.advance()
            }
            ConnectionState::Receiving => self.advance(),
            // Bytes of the next request wait until the response is out.
            _ => Step::Continue,
        }
    }

    /// The peer went away: a zero-length read, a reset, or a failed write.
    ///
    /// Buffered bytes are dropped and no response is attempted.
    pub fn on_peer_closed(&mut self) -> Step {
        if self.state.is_terminal() {
            return Step::Continue;
        }
        if !self.buffer.is_empty() {
            tracing::debug!(discarded = self.buffer.len(), "Peer closed mid-request");
        }
        self.buffer.clear();
        self.transition(ConnectionState::Closing);
        Step::Close
    }

    /// The idle timer fired at `now`.
    ///
    /// Stale firings (before the current deadline) are ignored. Otherwise the
    /// outcome depends only on whether any request bytes are buffered.
    pub fn on_timer(&mut self, now: Instant) -> Step {
        if !self.timer.is_expired(now) {
            return Step::Continue;
        }

        match self.state {
            ConnectionState::Awaiting | ConnectionState::Receiving => {
                self.transition(ConnectionState::Closing);
                if self.buffer.is_empty() {
                    tracing::debug!("Idle timeout, closing silently");
                    Step::Close
                } else {
                    tracing::debug!(
                        buffered = self.buffer.len(),
                        "Idle timeout on partial request"
                    );
                    self.buffer.clear();
                    Step::Reply(Response::timeout())
                }
            }
            _ => Step::Continue,
        }
    }

    /// The response to the request handed out by [`Step::Process`] has been
    /// fully written.
    pub fn on_response_written(&mut self, now: Instant) -> Step {
        if self.state != ConnectionState::Processing {
            return Step::Continue;
        }

        self.timer.touch(now);

        if !self.keep_alive {
            self.transition(ConnectionState::Closing);
            return Step::Close;
        }

        if self.buffer.is_empty() {
            self.transition(ConnectionState::Awaiting);
            Step::Continue
        } else {
            // A pipelined request is already buffered.
            self.transition(ConnectionState::Receiving);
            self.advance()
        }
    }

    /// Moves to `Closed`. Returns false if the connection was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.buffer.clear();
        self.transition(ConnectionState::Closed);
        true
    }

    fn advance(&mut self) -> Step {
        // Stray CRLFs between requests are not the start of a new one.
        let stray = leading_crlf_len(self.buffer.peek());
        self.buffer.consume(stray);
        if self.buffer.is_empty() {
            self.transition(ConnectionState::Awaiting);
            return Step::Continue;
        }

        match detect_boundary(self.buffer.peek()) {
            Boundary::Incomplete => match self.buffer.ensure_within_limit() {
                Ok(()) => Step::Continue,
                Err(e) => self.reject_oversized(e),
            },
            Boundary::Complete(request, consumed) => {
                if let Err(e) = self.buffer.check_request_len(consumed) {
                    return self.reject_oversized(e);
                }
                self.buffer.consume(consumed);
                self.keep_alive = request.keep_alive();
                self.transition(ConnectionState::Processing);
                Step::Process(request)
            }
            Boundary::Malformed(e) => {
                tracing::warn!(error = ?e, "Malformed request");
                self.buffer.clear();
                self.transition(ConnectionState::Closing);
                Step::Reply(Response::error(e.status()))
            }
        }
    }

    fn reject_oversized(&mut self, e: BufferError) -> Step {
        tracing::warn!(error = %e, "Request too large");
        self.buffer.clear();
        self.transition(ConnectionState::Closing);
        Step::Reply(Response::error(StatusCode::PayloadTooLarge))
    }

    fn transition(&mut self, to: ConnectionState) {
        tracing::trace!(from = ?self.state, to = ?to, "Connection state change");
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn conn(now: Instant) -> Connection {
        Connection::new(TIMEOUT, 1024, now)
    }

    #[test]
    fn starts_awaiting_with_empty_fragment() {
        let c = conn(Instant::now());
        assert_eq!(c.state(), ConnectionState::Awaiting);
        assert_eq!(c.fragment(), Fragment::Empty);
        assert!(c.keep_alive());
    }

    #[test]
    fn partial_bytes_move_to_receiving() {
        let now = Instant::now();
        let mut c = conn(now);

        assert!(matches!(c.on_bytes(b"GET / HT", now), Step::Continue));
        assert_eq!(c.state(), ConnectionState::Receiving);
        assert_eq!(c.fragment(), Fragment::Incomplete);
    }

    #[test]
    fn bytes_arriving_push_deadline() {
        let now = Instant::now();
        let mut c = conn(now);
        let later = now + Duration::from_millis(60);

        c.on_bytes(b"GET", later);

        assert_eq!(c.deadline(), later + TIMEOUT);
    }

    #[test]
    fn close_while_processing_is_handled() {
        let now = Instant::now();
        let mut c = conn(now);

        assert!(matches!(c.on_bytes(b"GET / HTTP/1.1\r\n\r\n", now), Step::Process(_)));
        assert!(matches!(c.on_peer_closed(), Step::Close));
        assert!(matches!(c.on_response_written(now), Step::Continue));
        assert_eq!(c.state(), ConnectionState::Closing);
    }
}
