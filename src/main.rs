use anyhow::{bail, Context, Result};
use axum::serve;
use skillbox::core::config::Config;
use skillbox::core::routes::build_router;
use skillbox::core::startup::seed_default_users;
use skillbox::core::state::AppState;
use skillbox::core::tracing_init::init_tracing;
use skillbox::core::unix_server::serve_unix_socket;
use skillbox::security::login_throttle::LoginThrottle;
use skillbox::stores::session_store::SessionStore;
use skillbox::stores::storage::Storage;
use skillbox::utils::time::current_timestamp;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, Level};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'",
        config_path.display()
    ))?;

    init_tracing(&config.logging);

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        storage = ?config.storage.backend,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "SkillBox starting"
    );

    let storage = Storage::from_config(&config.storage).context("Failed to initialize storage")?;
    info!(backend = storage.backend_name(), "Storage ready");

    seed_default_users(&storage)
        .await
        .context("Failed to bootstrap user store")?;

    let state = AppState::new(config.clone(), storage);

    spawn_cleanup_task(
        Arc::clone(&state.sessions),
        Arc::clone(&state.login_throttle),
        config.security.cleanup_interval,
    );

    info!(
        cleanup_interval_seconds = config.security.cleanup_interval,
        session_ttl_seconds = config.security.session_ttl,
        "Session cleanup task started"
    );

    // Build the router with middleware
    let app = build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let tcp_handle = if let Some(port) = config.server.port {
        let addr = format!("0.0.0.0:{}", port);
        info!(address = %addr, "Starting TCP listener");

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind TCP listener to {}", addr))?;

        let app_clone = app.clone();
        Some(tokio::spawn(async move {
            serve(
                listener,
                app_clone.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
        }))
    } else {
        None
    };

    let unix_handle = if let Some(unix_socket) = &config.server.unix_socket {
        info!(path = %unix_socket.display(), "Starting Unix socket listener");

        if unix_socket.exists() {
            std::fs::remove_file(unix_socket).context(format!(
                "Failed to remove existing Unix socket: {}",
                unix_socket.display()
            ))?;
        }

        let listener = UnixListener::bind(unix_socket).context(format!(
            "Failed to bind Unix socket listener to {}",
            unix_socket.display()
        ))?;

        Some(tokio::spawn(serve_unix_socket(
            listener,
            app,
            unix_socket.clone(),
            shutdown_signal(),
        )))
    } else {
        None
    };

    info!("HTTP server(s) started, waiting for shutdown signal");

    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => {
                    if let Err(e) = result {
                        error!(error = %e, "TCP server task failed");
                    }
                }
                result = unix => {
                    if let Err(e) = result {
                        error!(error = %e, "Unix socket server task failed");
                    }
                }
            }
        }
        (Some(tcp), None) => {
            if let Err(e) = tcp.await {
                error!(error = %e, "TCP server task failed");
            }
        }
        (None, Some(unix)) => {
            if let Err(e) = unix.await {
                error!(error = %e, "Unix socket server task failed");
            }
        }
        (None, None) => {
            error!("No listeners configured");
            bail!("No listeners configured");
        }
    }

    info!("Shutting down gracefully");

    Ok(())
}

/// Periodically drop expired sessions and stale login counters
fn spawn_cleanup_task(
    sessions: Arc<SessionStore>,
    login_throttle: Arc<LoginThrottle>,
    cleanup_interval: u64,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));

        loop {
            interval.tick().await;

            let now = current_timestamp();
            let expired = sessions.cleanup_expired(now);
            let throttled = login_throttle.cleanup_old_entries(now);

            if expired > 0 || throttled > 0 {
                info!(
                    expired_sessions = expired,
                    active_sessions = sessions.len(),
                    throttle_entries_removed = throttled,
                    throttle_entries = login_throttle.len(),
                    "Session cleanup completed"
                );
            } else {
                debug!("Session cleanup completed, nothing expired");
            }
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
