//! Single-frame server-sent-event relay.
//!
//! The upstream body is read fully and sent back as one `data:` frame. The
//! upstream status and headers are dropped; the caller always sees 200 with
//! the three fixed event-stream headers. With error events disabled, a
//! failed upstream call leaves the body empty.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};
use bytes::{BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use std::fmt::Display;
use std::time::Duration;
use tracing::error;

use crate::error::{ProxyError, Result};
use crate::translate::OutboundRequest;
use crate::upstream::UpstreamClient;

pub fn event_stream_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// `data: <body>\n\n`, with the body bytes copied as-is.
pub fn format_data_frame(body: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(body.len() + 8);
    frame.put_slice(b"data: ");
    frame.put_slice(body);
    frame.put_slice(b"\n\n");
    frame.freeze()
}

pub fn format_error_frame(status: u16, message: &str) -> Bytes {
    let data = serde_json::json!({
        "status": status,
        "message": message,
    });
    Bytes::from(format!("event: error\ndata: {}\n\n", data))
}

/// Executes `request` (always a GET) and wraps the whole upstream body in
/// one event frame. The frame is the complete response body, so hyper
/// writes and flushes it in one go.
pub async fn relay_as_event(
    upstream: &UpstreamClient,
    request: OutboundRequest,
    error_events: bool,
) -> Response {
    let headers = event_stream_headers();

    let frame = match upstream.send(request, Body::empty()).await {
        Ok(response) => {
            let status = response.status();
            match read_full_body(response.into_body(), upstream.timeout()).await {
                Ok(body) if error_events && !status.is_success() => Some(format_error_frame(
                    status.as_u16(),
                    &String::from_utf8_lossy(&body),
                )),
                Ok(body) => Some(format_data_frame(&body)),
                Err(e) => {
                    error!(error = %e, "Failed to read Kakao API response body");
                    error_events.then(|| format_error_frame(502, "failed to read upstream body"))
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Kakao API request failed");
            error_events.then(|| format_error_frame(502, "upstream request failed"))
        }
    };

    let body = match frame {
        Some(frame) => Body::from(frame),
        None => Body::empty(),
    };

    let mut response = Response::new(body);
    *response.headers_mut() = headers;
    response
}

async fn read_full_body<B>(body: B, limit: Duration) -> Result<Bytes>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Display,
{
    match tokio::time::timeout(limit, body.collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) => Err(ProxyError::UpstreamError(format!(
            "Failed to read response body: {}",
            e
        ))),
        Err(_) => Err(ProxyError::UpstreamError(format!(
            "Reading response body timed out after {:?}",
            limit
        ))),
    }
}
