//! Shared utilities for integration testing.

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use devserve::config::AppState;
use devserve::handler::{Responder, ResponderConfig};
use devserve::logger::AccessLogFormat;
use devserve::server::{Server, ServerLoopConfig, Shutdown};
use devserve::ServeError;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Temporary document root, removed on drop.
pub struct TestRoot {
    path: PathBuf,
}

impl TestRoot {
    pub fn new() -> Self {
        let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("devserve-it-{}-{n}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self {
            path: path.canonicalize().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.path.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

impl Drop for TestRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// A server running in a background task.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub handle: JoinHandle<Result<(), ServeError>>,
}

impl RunningServer {
    /// Trigger shutdown and wait for the loop to return.
    pub async fn stop(self) -> Result<(), ServeError> {
        self.shutdown.trigger();
        self.handle.await.unwrap()
    }
}

pub fn state_for(config: ResponderConfig) -> Arc<AppState> {
    Arc::new(AppState {
        responder: Responder::new(config),
        access_log: false,
        access_log_format: AccessLogFormat::Common,
    })
}

/// Bind `addr` and run the server loop in a background task.
pub fn start_server_at(
    addr: SocketAddr,
    config: ResponderConfig,
) -> Result<RunningServer, ServeError> {
    start_server_with(addr, config, ServerLoopConfig::default())
}

/// Like [`start_server_at`] with explicit loop settings.
pub fn start_server_with(
    addr: SocketAddr,
    config: ResponderConfig,
    loop_config: ServerLoopConfig,
) -> Result<RunningServer, ServeError> {
    let server = Server::bind(addr, false, state_for(config), loop_config)?;
    let addr = server.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let handle = tokio::spawn(server.run(shutdown.subscribe()));
    Ok(RunningServer {
        addr,
        shutdown,
        handle,
    })
}

/// Serve `root` with the default profile on an ephemeral loopback port.
pub fn start_server(root: &Path) -> RunningServer {
    start_server_at(
        "127.0.0.1:0".parse().unwrap(),
        ResponderConfig::new(root),
    )
    .unwrap()
}

/// Collected response parts.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Send one request on a fresh connection.
pub async fn request(addr: SocketAddr, method: Method, path: &str) -> TestResponse {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let req = Request::builder()
        .method(method)
        .uri(path)
        .header("Host", addr.to_string())
        .body(Empty::<Bytes>::new())
        .unwrap();
    let response = sender.send_request(req).await.unwrap();
    let (parts, body) = response.into_parts();
    let body = body.collect().await.unwrap().to_bytes();

    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

pub async fn get(addr: SocketAddr, path: &str) -> TestResponse {
    request(addr, Method::GET, path).await
}
