//! Server-held upstream API key.
//!
//! The key is loaded once at startup and handed to the proxy state. It is
//! only ever rendered into the outbound `Authorization` header; `Debug` and
//! `Display` are redacted so it cannot leak through logs or error messages.

use axum::http::HeaderValue;
use serde::Deserialize;
use std::fmt;

use crate::error::{ProxyError, Result};

/// Authorization scheme the Kakao Local API expects.
pub const AUTH_SCHEME: &str = "KakaoAK";

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Builds `KakaoAK <key>` as a sensitive header value.
    pub fn authorization_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::try_from(format!("{} {}", AUTH_SCHEME, self.0))
            .map_err(|_| {
                ProxyError::ConfigError(
                    "API key contains characters not allowed in a header".to_string(),
                )
            })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
