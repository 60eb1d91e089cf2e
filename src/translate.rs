//! Inbound request -> outbound upstream request.
//!
//! The query string is forwarded byte-for-byte: it is neither parsed,
//! re-encoded nor validated. Caller headers are not forwarded.

use axum::http::{HeaderValue, Method, Uri};

use crate::credential::Credential;
use crate::error::{ProxyError, Result};
use crate::route::Route;

/// A fully-resolved request against the upstream provider.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub authorization: HeaderValue,
}

/// Builds the outbound request for `route`.
///
/// `base_url` is the upstream origin (e.g. `https://dapi.kakao.com`). The
/// target is assembled as text and parsed once into a [`Uri`], which keeps
/// the query bytes exactly as given. Any query accepted by the inbound
/// server is accepted here too. A target that is not an absolute URI is a
/// local configuration failure, reported as
/// [`ProxyError::InvalidUpstreamUrl`] for this request only.
pub fn translate(
    method: Method,
    route: Route,
    query: Option<&str>,
    base_url: &str,
    credential: &Credential,
) -> Result<OutboundRequest> {
    let mut target = format!("{}{}", base_url.trim_end_matches('/'), route.upstream_path());
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(q);
    }

    let uri: Uri = target
        .parse()
        .map_err(|e| ProxyError::InvalidUpstreamUrl(format!("{}: {}", target, e)))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ProxyError::InvalidUpstreamUrl(format!(
            "{} is not an absolute URL",
            target
        )));
    }

    let authorization = credential.authorization_header()?;

    Ok(OutboundRequest {
        method,
        uri,
        authorization,
    })
}

/// Translation for the event-stream relay: the method is always GET.
pub fn translate_for_stream(
    route: Route,
    query: Option<&str>,
    base_url: &str,
    credential: &Credential,
) -> Result<OutboundRequest> {
    translate(Method::GET, route, query, base_url, credential)
}
