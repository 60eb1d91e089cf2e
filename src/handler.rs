use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{ProxyConfig, UpstreamConfig};
use crate::credential::Credential;
use crate::error::Result;
use crate::relay::{relay, relay_as_event};
use crate::route::{RelayMode, Route};
use crate::translate::{translate, translate_for_stream};
use crate::upstream::UpstreamClient;

/// Read-only state shared by every in-flight request.
pub struct AppState {
    pub upstream: UpstreamClient,
    pub base_url: String,
    pub credential: Credential,
    pub stream_error_events: bool,
}

impl AppState {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(config)?,
            base_url: config.base_url.clone(),
            credential: config.api_key.clone(),
            stream_error_events: config.stream_error_events,
        })
    }
}

/// Builds the router: one handler per public path, each bound to its route
/// and the relay mode configured for it.
pub fn build_router(config: &ProxyConfig) -> Result<Router> {
    let state = Arc::new(AppState::new(&config.upstream)?);

    let mut router = Router::new();
    for route in Route::ALL {
        let mode = config.mode_for(route);
        info!(route = %route, path = route.public_path(), mode = ?mode, "Registering route");
        router = router.route(
            route.public_path(),
            any(
                move |State(state): State<Arc<AppState>>, request: Request| async move {
                    proxy_request(state, route, mode, request).await
                },
            ),
        );
    }

    Ok(router
        .with_state(state)
        .layer(middleware::from_fn(access_log)))
}

pub async fn proxy_request(
    state: Arc<AppState>,
    route: Route,
    mode: RelayMode,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let query = parts.uri.query();

    match mode {
        RelayMode::Buffered => {
            match translate(
                parts.method.clone(),
                route,
                query,
                &state.base_url,
                &state.credential,
            ) {
                Ok(outbound) => relay(&state.upstream, outbound, body).await,
                Err(e) => {
                    error!(route = %route, error = %e, "Failed to build upstream request");
                    e.into_response()
                }
            }
        }
        RelayMode::Streamed => {
            // Streamed requests are always GETs upstream
            drop(body);
            match translate_for_stream(route, query, &state.base_url, &state.credential) {
                Ok(outbound) => {
                    relay_as_event(&state.upstream, outbound, state.stream_error_events).await
                }
                Err(e) => {
                    error!(route = %route, error = %e, "Failed to build upstream request");
                    e.into_response()
                }
            }
        }
    }
}

/// Logs method, path, status and duration of every request.
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Serves `router` on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
