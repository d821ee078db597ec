// Connection handling module
// Serves a single accepted TCP connection with hyper's HTTP/1 implementation

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Per-connection settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub keep_alive: bool,
    /// Upper bound on the connection's total lifetime
    pub timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Serve one connection until it closes, times out or shutdown is requested.
///
/// On shutdown the in-flight request is allowed to finish and the
/// connection is closed instead of being kept alive.
///
/// # Arguments
///
/// * `stream` - The accepted TCP stream
/// * `peer_addr` - The peer's socket address, used for access logging
/// * `state` - Shared application state
/// * `options` - Keep-alive and timeout settings
/// * `shutdown` - Shutdown signal; a dropped sender counts as shutdown
pub async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    options: ConnectionOptions,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder.keep_alive(options.keep_alive);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
    );
    let mut conn = pin!(conn);

    let served = tokio::time::timeout(options.timeout, async {
        tokio::select! {
            result = conn.as_mut() => result,
            _ = shutdown.changed() => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        }
    })
    .await;

    match served {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => {
            logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {}s timeout",
                options.timeout.as_secs()
            ));
        }
    }
}
