use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;

use beacon_core::group::{ReadySignal, RunFuture, Runnable};
use beacon_core::{BeaconError, Result};

/// HTTP listener run as a process group member.
///
/// Readiness is signalled once the socket is bound, so the next member
/// only starts when this one already accepts connections.
pub struct HttpServer {
    addr: SocketAddr,
    router: Router,
}

impl HttpServer {
    /// Create a new server for `router` on `addr`.
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        let router = router.layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)));
        Self { addr, router }
    }

    /// Bind, signal readiness, and serve until `shutdown`.
    pub async fn serve(self, shutdown: CancellationToken, ready: ReadySignal) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| BeaconError::Transport(format!("bind {}: {}", self.addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!("HTTP server listening on {}", local_addr);
        ready.notify();

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

        tracing::info!("HTTP server on {} stopped", local_addr);
        Ok(())
    }
}

impl Runnable for HttpServer {
    fn run(self: Box<Self>, shutdown: CancellationToken, ready: ReadySignal) -> RunFuture {
        Box::pin(async move { (*self).serve(shutdown, ready).await })
    }
}

/// Log every request together with the peer address.
async fn log_request(req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!(
        method = %req.method(),
        path = %req.uri().path(),
        peer = %peer,
        "Request received"
    );

    next.run(req).await
}
