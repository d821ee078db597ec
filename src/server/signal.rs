// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use tokio::sync::watch;

use crate::logger;

/// Shutdown coordinator
///
/// Holds the sending half of a `watch` channel; the server loop and every
/// connection task hold receivers.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Request shutdown; later calls are no-ops
    pub fn trigger(&self) {
        self.tx.send_if_modified(|requested| !std::mem::replace(requested, true));
    }

    #[cfg(test)]
    fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT or SIGTERM (Unix)
///
/// Handlers are registered before this returns its future, so a signal sent
/// right after startup is not lost.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl std::future::Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => logger::log_info("SIGTERM received, shutting down"),
            _ = sigint.recv() => logger::log_info("SIGINT (Ctrl+C) received, shutting down"),
        }
    })
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl std::future::Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => logger::log_info("Ctrl+C received, shutting down"),
            Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
        }
    })
}

/// Spawn a task that triggers `shutdown` on the first termination signal
pub fn start_signal_handler(shutdown: std::sync::Arc<Shutdown>) -> std::io::Result<()> {
    let signal = shutdown_signal()?;
    tokio::spawn(async move {
        signal.await;
        shutdown.trigger();
    });
    Ok(())
}
