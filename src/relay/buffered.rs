use axum::{
    BoxError,
    body::Body,
    http::Method,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use std::fmt::Display;
use tracing::error;

use crate::translate::OutboundRequest;
use crate::upstream::UpstreamClient;

/// Executes `request` and copies the upstream response back verbatim.
///
/// The inbound body is forwarded as-is for methods that carry one. A
/// transport failure yields 502 and is not retried.
pub async fn relay(
    upstream: &UpstreamClient,
    request: OutboundRequest,
    inbound: Body,
) -> Response {
    let body = if request.method == Method::GET || request.method == Method::HEAD {
        Body::empty()
    } else {
        inbound
    };

    match upstream.send(request, body).await {
        Ok(response) => relay_response(response),
        Err(e) => {
            error!(error = %e, "Kakao API request failed");
            e.into_response()
        }
    }
}

/// Turns an upstream response into the caller's response.
///
/// Every header value is appended (multi-valued headers survive), the
/// status is copied, and the body is streamed frame by frame. A failure
/// mid-copy is logged and ends the body with an error; the status line is
/// already sent. The upstream connection is released when the body is
/// dropped.
pub fn relay_response<B>(upstream: axum::http::Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Display + Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();

    let body = body.map_err(|e| {
        error!(error = %e, "Failed to copy upstream response body");
        e
    });

    let mut response = Response::new(Body::new(body));
    let headers = response.headers_mut();
    for (name, value) in parts.headers.iter() {
        headers.append(name.clone(), value.clone());
    }
    *response.status_mut() = parts.status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};
    use http_body_util::{Full, StreamBody};
    use hyper::body::Frame;
    use std::io;

    fn upstream_response(
        status: u16,
        headers: &[(&str, &str)],
        body: &'static str,
    ) -> axum::http::Response<Full<Bytes>> {
        let mut builder = axum::http::Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
    }

    #[tokio::test]
    async fn test_status_headers_and_body_are_copied() {
        let upstream = upstream_response(
            200,
            &[
                ("content-type", "application/json;charset=UTF-8"),
                ("x-request-id", "r-1"),
            ],
            r#"{"documents":[],"meta":{"total_count":0}}"#,
        );

        let response = relay_response(upstream);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json;charset=UTF-8"
        );
        assert_eq!(response.headers().get("x-request-id").unwrap(), "r-1");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"documents":[],"meta":{"total_count":0}}"#);
    }

    #[tokio::test]
    async fn test_multi_valued_headers_are_preserved() {
        let upstream = upstream_response(
            200,
            &[("set-cookie", "a=1"), ("set-cookie", "b=2"), ("vary", "Origin")],
            "",
        );

        let response = relay_response(upstream);
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[tokio::test]
    async fn test_error_status_is_relayed_not_rewritten() {
        let upstream = upstream_response(
            401,
            &[("content-type", "application/json")],
            r#"{"errorType":"AccessDeniedError","message":"wrong appKey"}"#,
        );

        let response = relay_response(upstream);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.starts_with(b"{\"errorType\""));
    }

    type FrameStream = futures::stream::Iter<std::vec::IntoIter<io::Result<Frame<Bytes>>>>;

    /// Upstream that sends one chunk and then drops the connection.
    fn broken_upstream() -> axum::http::Response<StreamBody<FrameStream>> {
        let frames = vec![
            Ok(Frame::data(Bytes::from_static(b"{\"documents\":["))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ];
        axum::http::Response::builder()
            .status(200)
            .header("content-type", "application/json")
            .header("x-kakao-trace", "t-1")
            .body(StreamBody::new(futures::stream::iter(frames)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_copy_failure_keeps_head_and_ends_body_with_error() {
        let response = relay_response(broken_upstream());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-kakao-trace"], "t-1");

        let mut body = response.into_body();
        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(
            first.into_data().unwrap(),
            Bytes::from_static(b"{\"documents\":[")
        );

        let next = body.frame().await.unwrap();
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_copy_failure_fails_collect() {
        let response = relay_response(broken_upstream());
        assert!(response.into_body().collect().await.is_err());
    }
}
