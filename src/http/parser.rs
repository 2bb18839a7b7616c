use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    UnsupportedVersion,
    UnsupportedTransferEncoding,
    Incomplete,
}

impl ParseError {
    /// Status code sent back before closing a connection on this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion => StatusCode::HttpVersionNotSupported,
            ParseError::UnsupportedTransferEncoding => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        }
    }
}

/// Outcome of looking for a request boundary in buffered bytes.
#[derive(Debug)]
pub enum Boundary {
    /// More bytes are needed.
    Incomplete,
    /// A full request and how many bytes it occupied.
    Complete(Request, usize),
    Malformed(ParseError),
}

/// Incremental entry point used by the connection state machine.
pub fn detect_boundary(buf: &[u8]) -> Boundary {
    match parse_http_request(buf) {
        Ok((request, consumed)) => Boundary::Complete(request, consumed),
        Err(ParseError::Incomplete) => Boundary::Incomplete,
        Err(e) => Boundary::Malformed(e),
    }
}

/// Length of the stray CRLF pairs a client may send before a request line
/// (RFC 9112 section 2.2). They belong to no request.
pub fn leading_crlf_len(buf: &[u8]) -> usize {
    buf.chunks(2).take_while(|c| *c == b"\r\n").count() * 2
}

pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let leading = leading_crlf_len(buf);
    let buf = &buf[leading..];

    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split(' ');

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    if parts.next().is_some() || path.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(ParseError::UnsupportedVersion);
    }

    // Headers
    let mut headers: HashMap<String, String> = HashMap::new();

    for line in lines {
        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        // No whitespace is allowed between the field name and the colon.
        if key.is_empty() || key.ends_with(|c: char| c == ' ' || c == '\t') {
            return Err(ParseError::InvalidHeader);
        }

        let value = value.trim();
        let existing = headers.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned();
        match existing {
            None => {
                headers.insert(key.to_string(), value.to_string());
            }
            Some(name) if name.eq_ignore_ascii_case("Content-Length") => {
                if headers[&name] != value {
                    return Err(ParseError::InvalidContentLength);
                }
            }
            // Repeated fields combine into one comma-separated list.
            Some(name) => {
                if let Some(prev) = headers.get_mut(&name) {
                    prev.push_str(", ");
                    prev.push_str(value);
                }
            }
        }
    }

    let lookup = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };

    if lookup("Transfer-Encoding").is_some() {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    // Body
    let content_length = lookup("Content-Length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = leading + headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
