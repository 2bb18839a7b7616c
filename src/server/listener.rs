use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::Config;
use crate::http::resolver::{Resolver, StaticSite};
use crate::server::dispatcher::{self, ConnectionSettings};

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub struct Server {
    listener: TcpListener,
    settings: ConnectionSettings,
    resolver: Arc<dyn Resolver>,
    active: Arc<AtomicUsize>,
}

/// Read-only view of a running server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    addr: SocketAddr,
    active: Arc<AtomicUsize>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of connections registered with the accept loop.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

impl Server {
    /// Binds using the configured address, limits and site.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let resolver = Arc::new(StaticSite::new(cfg.site.index.clone()));
        Self::bind_with(&cfg.server.listen_addr, (&cfg.server).into(), resolver).await
    }

    pub async fn bind_with(
        addr: &str,
        settings: ConnectionSettings,
        resolver: Arc<dyn Resolver>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {}", addr))?;

        Ok(Self {
            listener,
            settings,
            resolver,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> anyhow::Result<ServerHandle> {
        Ok(ServerHandle {
            addr: self.local_addr()?,
            active: self.active.clone(),
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts and serves connections until `shutdown` resolves.
    ///
    /// Every connection runs as its own task in a `JoinSet` owned by this
    /// loop. Only this loop adds or reaps entries.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            addr = %self.local_addr()?,
            idle_timeout_ms = self.settings.idle_timeout.as_millis() as u64,
            "Listening"
        );

        let mut connections: JoinSet<()> = JoinSet::new();
        let mut next_id: u64 = 0;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                res = self.listener.accept() => match res {
                    Ok((socket, peer)) => {
                        next_id += 1;
                        info!(conn_id = next_id, %peer, "Accepted connection");

                        if let Err(e) = socket.set_nodelay(true) {
                            warn!(conn_id = next_id, error = %e, "Failed to set TCP_NODELAY");
                        }

                        let span = info_span!("conn", id = next_id, %peer);
                        let resolver = self.resolver.clone();
                        let driver = dispatcher::drive(socket, self.settings, resolver);
                        connections.spawn(driver.instrument(span));
                    }
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },

                Some(res) = connections.join_next(), if !connections.is_empty() => {
                    match res {
                        Err(e) if e.is_panic() => error!(error = %e, "Connection task panicked"),
                        _ => {}
                    }
                }

                () = &mut shutdown => {
                    info!(active = connections.len(), "Shutting down");
                    break;
                }
            }

            self.active.store(connections.len(), Ordering::Release);
        }

        connections.shutdown().await;
        self.active.store(0, Ordering::Release);
        Ok(())
    }
}
