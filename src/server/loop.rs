// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::connection::{serve_connection, ConnectionOptions};
use super::listener::create_reusable_listener;
use crate::config::AppState;
use crate::error::ServeError;
use crate::logger;

/// Configuration for server loop behavior
#[derive(Debug, Clone, Copy)]
pub struct ServerLoopConfig {
    pub connection: ConnectionOptions,
    /// How long shutdown waits for in-flight connections before aborting them
    pub shutdown_grace: Duration,
}

impl Default for ServerLoopConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// A bound server that owns its listening socket
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    config: ServerLoopConfig,
}

impl Server {
    /// Bind the listening socket
    ///
    /// Address-in-use becomes [`ServeError::PortInUse`].
    pub fn bind(
        addr: SocketAddr,
        reuse_port: bool,
        state: Arc<AppState>,
        config: ServerLoopConfig,
    ) -> Result<Self, ServeError> {
        let listener = create_reusable_listener(addr, reuse_port)
            .map_err(|source| ServeError::from_bind(addr, source))?;
        Ok(Self {
            listener,
            state,
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// The listener is closed before in-flight connections are drained, so a
    /// new server can bind the same port while old responses finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServeError> {
        let Self {
            listener,
            state,
            config,
        } = self;
        let mut connections = JoinSet::new();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            logger::log_debug(&format!("Accepted connection from {peer_addr}"));
                            connections.spawn(serve_connection(
                                stream,
                                peer_addr,
                                Arc::clone(&state),
                                config.connection,
                                shutdown.clone(),
                            ));
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                // Reap finished connection tasks
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        drain_connections(connections, config.shutdown_grace).await;
        logger::log_shutdown_complete();
        Ok(())
    }
}

/// Wait for in-flight connections, aborting whatever is left after `grace`.
async fn drain_connections(mut connections: JoinSet<()>, grace: Duration) {
    logger::log_shutdown_started(connections.len());

    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        logger::log_warning(&format!(
            "Aborting {} connection(s) still open after {}s",
            connections.len(),
            grace.as_secs()
        ));
        connections.abort_all();
        while connections.join_next().await.is_some() {}
    }
}
