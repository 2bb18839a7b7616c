//! Drives one connection's state machine from socket and timer events.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::http::connection::{Connection, Step};
use crate::http::resolver::Resolver;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// Per-connection limits shared by every driver.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub idle_timeout: Duration,
    pub max_request_size: usize,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_request_size: cfg.max_request_size,
        }
    }
}

/// Serves a single connection until it closes.
///
/// The connection owns one idle timer. It is reset to the state machine's
/// deadline after every event, so an old deadline can never fire. Errors
/// never escape: a failed read or write counts as the peer going away.
pub async fn drive<S>(mut stream: S, settings: ConnectionSettings, resolver: Arc<dyn Resolver>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(
        settings.idle_timeout,
        settings.max_request_size,
        Instant::now(),
    );
    let idle = tokio::time::sleep_until(conn.deadline());
    tokio::pin!(idle);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let mut step = tokio::select! {
            res = stream.read(&mut chunk) => match res {
                Ok(n) => conn.on_bytes(&chunk[..n], Instant::now()),
                Err(e) => {
                    debug!(error = %e, "Read failed");
                    conn.on_peer_closed()
                }
            },
            () = &mut idle => conn.on_timer(Instant::now()),
        };

        loop {
            step = match step {
                Step::Continue => break,
                Step::Process(request) => {
                    let mut response = resolver.resolve(&request);
                    response.set_keep_alive(conn.keep_alive());

                    match write_response(&mut stream, &response, settings.idle_timeout).await {
                        Ok(()) => {
                            info!(
                                method = request.method.as_str(),
                                path = %request.path,
                                status = response.status.as_u16(),
                                keep_alive = conn.keep_alive(),
                                "Request served"
                            );
                            conn.on_response_written(Instant::now())
                        }
                        Err(e) => {
                            debug!(error = %e, "Write failed");
                            conn.on_peer_closed()
                        }
                    }
                }
                Step::Reply(response) => {
                    info!(status = response.status.as_u16(), "Closing with error response");
                    let limit = settings.idle_timeout;
                    if let Err(e) = write_response(&mut stream, &response, limit).await {
                        debug!(error = %e, "Write failed");
                    }
                    Step::Close
                }
                Step::Close => {
                    // The peer may already be gone.
                    let _ = stream.shutdown().await;
                    if conn.close() {
                        debug!("Connection closed");
                    }
                    return;
                }
            };
        }

        idle.as_mut().reset(conn.deadline());
    }
}

/// Writes a response, giving up if the peer does not drain it within `limit`.
async fn write_response<S>(
    stream: &mut S,
    response: &Response,
    limit: Duration,
) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut writer = ResponseWriter::new(response);
    let res = tokio::time::timeout(limit, writer.write_to_stream(stream)).await;
    match res {
        Ok(res) => res,
        Err(_) => Err(anyhow::anyhow!(
            "write stalled with {} bytes pending",
            writer.remaining()
        )),
    }
}
