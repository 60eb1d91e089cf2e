use axum::{
    body::Body,
    http::{Request, Response, header::AUTHORIZATION},
};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::translate::OutboundRequest;

/// Shared HTTP client for the upstream provider.
///
/// Cloning is cheap; every clone shares the same connection pool. Requests
/// are sent with the outbound [`Uri`](axum::http::Uri) untouched, so the
/// query reaches the provider exactly as the caller sent it.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        // Err means a provider is already installed
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Upper bound for one upstream call and, separately, for reading a
    /// whole upstream body.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `request` with `body`. Transport failures (DNS, refused
    /// connection, timeout before response headers) map to
    /// [`ProxyError::UpstreamError`]; any HTTP status, including errors, is
    /// a successful send.
    pub async fn send(
        &self,
        request: OutboundRequest,
        body: Body,
    ) -> Result<Response<Incoming>> {
        debug!(
            method = %request.method,
            path = request.uri.path(),
            query = request.uri.query().unwrap_or(""),
            "Calling upstream"
        );

        let outbound = Request::builder()
            .method(request.method)
            .uri(request.uri)
            .header(AUTHORIZATION, request.authorization)
            .body(body)
            .map_err(|e| {
                ProxyError::InternalError(format!("Failed to build upstream request: {}", e))
            })?;

        let pending = self.client.request(outbound);
        let response = match tokio::time::timeout(self.timeout, pending).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ProxyError::UpstreamError(format!(
                    "Kakao API request failed: {}",
                    e
                )));
            }
            Err(_) => {
                return Err(ProxyError::UpstreamError(format!(
                    "Kakao API request timed out after {:?}",
                    self.timeout
                )));
            }
        };

        debug!(status = %response.status(), "Upstream responded");
        Ok(response)
    }
}
