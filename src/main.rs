use std::sync::Arc;
use std::time::Duration;

use devserve::config::{self, AppState, Config};
use devserve::logger;
use devserve::server::{start_signal_handler, ConnectionOptions, Server, ServerLoopConfig, Shutdown};
use devserve::startup;
use devserve::ServeError;

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(e) => {
            logger::log_error(&e.to_string());
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<(), ServeError> {
    // Optional single argument: config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    cfg.validate()?;

    logger::init(&cfg)
        .map_err(|e| ServeError::Startup(format!("cannot open log files: {e}")))?;

    // Create the Tokio runtime, honoring the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder
        .build()
        .map_err(|e| ServeError::Startup(format!("cannot build runtime: {e}")))?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), ServeError> {
    let addr = cfg.socket_addr()?;
    let state = Arc::new(AppState::new(&cfg)?);
    let document_root = state.responder.config().document_root.clone();

    startup::check_required_assets(
        &document_root,
        &cfg.startup.required_assets,
        &cfg.server.index_file,
    );

    let loop_config = ServerLoopConfig {
        connection: ConnectionOptions {
            keep_alive: cfg.server.keep_alive,
            timeout: Duration::from_secs(cfg.server.connection_timeout_secs),
        },
        shutdown_grace: Duration::from_secs(cfg.server.shutdown_grace_secs),
    };
    let server = Server::bind(addr, cfg.server.reuse_port, state, loop_config)?;
    logger::log_server_start(&server.local_addr().unwrap_or(addr), &cfg, &document_root);

    let shutdown = Arc::new(Shutdown::new());
    start_signal_handler(Arc::clone(&shutdown))
        .map_err(|e| ServeError::Startup(format!("cannot register signal handlers: {e}")))?;

    server.run(shutdown.subscribe()).await
}
