//! Per-connection receive buffer.
//!
//! Bytes accumulate here until the parser recognises a request boundary.
//! The limit applies to a single unfinished request: bytes that complete a
//! request may arrive together with the start of the next one, so the check
//! runs after parsing rather than on every append.

use bytes::{Buf, BytesMut};

/// Default upper bound on buffered request bytes (headers + body).
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 8 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum BufferError {
    /// An unfinished request holds more than the configured maximum.
    Overflow { limit: usize, buffered: usize },
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::Overflow { limit, buffered } => {
                write!(f, "request of {} bytes exceeds limit of {} bytes", buffered, limit)
            }
        }
    }
}

impl std::error::Error for BufferError {}

#[derive(Debug)]
pub struct RecvBuffer {
    buf: BytesMut,
    limit: usize,
}

impl RecvBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit.min(4096)),
            limit,
        }
    }

    /// Appends received bytes. Growth per call is bounded by the read size.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Fails if the buffered bytes, known to be an unfinished request,
    /// exceed the limit.
    pub fn ensure_within_limit(&self) -> Result<(), BufferError> {
        self.check_request_len(self.buf.len())
    }

    /// Fails if a request occupying `len` bytes exceeds the limit.
    pub fn check_request_len(&self, len: usize) -> Result<(), BufferError> {
        if len > self.limit {
            return Err(BufferError::Overflow {
                limit: self.limit,
                buffered: len,
            });
        }
        Ok(())
    }

    pub fn peek(&self) -> &[u8] {
        &self.buf
    }

    /// Removes the first `n` bytes. Consuming more than is buffered empties it.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_consume() {
        let mut buf = RecvBuffer::new(64);
        assert!(buf.is_empty());

        buf.append(b"GET / HTTP/1.1\r\n");
        buf.append(b"\r\nGET");
        assert_eq!(buf.len(), 21);

        buf.consume(18);
        assert_eq!(buf.peek(), b"GET");
        assert!(!buf.is_empty());
    }

    #[test]
    fn limit_is_checked_on_demand() {
        let mut buf = RecvBuffer::new(8);
        buf.append(b"12345678");
        assert!(buf.ensure_within_limit().is_ok());

        buf.append(b"9");
        let err = buf.ensure_within_limit().unwrap_err();
        assert_eq!(err, BufferError::Overflow { limit: 8, buffered: 9 });

        buf.consume(4);
        assert!(buf.ensure_within_limit().is_ok());
    }

    #[test]
    fn consume_past_end_empties() {
        let mut buf = RecvBuffer::new(8);
        buf.append(b"abc");
        buf.consume(10);
        assert!(buf.is_empty());
    }
}
