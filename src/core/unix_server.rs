use axum::Router;
use std::future::Future;
use std::path::PathBuf;
use tokio::net::UnixListener;
use tower::Service;
use tracing::{debug, error, info};

/// Accept loop for the unix socket listener
///
/// Stops accepting once `shutdown` resolves and removes the socket file.
/// Connections already accepted run to completion on their own tasks.
pub async fn serve_unix_socket<F>(listener: UnixListener, app: Router, socket_path: PathBuf, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut make_service = app.into_make_service();
    tokio::pin!(shutdown);

    loop {
        let (socket, _remote_addr) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "Failed to accept Unix socket connection");
                    continue;
                }
            },
        };

        let tower_service = match make_service.call(&socket).await {
            Ok(svc) => svc,
            Err(infallible) => match infallible {},
        };

        tokio::spawn(async move {
            let socket = hyper_util::rt::TokioIo::new(socket);

            let hyper_service = hyper::service::service_fn(
                move |request: hyper::Request<hyper::body::Incoming>| {
                    tower_service.clone().call(request)
                },
            );

            if let Err(err) = hyper_util::server::conn::auto::Builder::new(
                hyper_util::rt::TokioExecutor::new(),
            )
            .serve_connection_with_upgrades(socket, hyper_service)
            .await
            {
                error!(error = %err, "Error serving Unix socket connection");
            }
        });
    }

    info!(path = %socket_path.display(), "Unix socket listener stopped");
    if let Err(e) = std::fs::remove_file(&socket_path) {
        debug!(error = %e, "Failed to remove Unix socket file");
    }
}
