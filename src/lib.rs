//! # Korean Map Proxy
//!
//! A thin reverse proxy in front of the Kakao Local API.
//!
//! ## Overview
//!
//! Six fixed endpoints are forwarded to their Kakao Local counterparts. The
//! proxy injects the server-held API key as `Authorization: KakaoAK <key>`,
//! passes the query string through untouched, and relays the response in
//! one of two modes:
//!
//! - **Buffered**: upstream status, headers and body are copied back.
//! - **Streamed**: the whole upstream body is sent as a single
//!   `data: <body>\n\n` server-sent event.
//!
//! | Path | Default mode | Upstream path |
//! |---|---|---|
//! | `/search/address` | buffered | `/v2/local/search/address.json` |
//! | `/search/category` | streamed | `/v2/local/search/category.json` |
//! | `/geo/coord2address` | buffered | `/v2/local/geo/coord2address.json` |
//! | `/geo/coord2regioncode` | buffered | `/v2/local/geo/coord2regioncode.json` |
//! | `/search/keyword` | buffered | `/v2/local/search/keyword.json` |
//! | `/geo/transcoord` | buffered | `/v2/local/geo/transcoord.json` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use korean_map_proxy::{config::ProxyConfig, handler::build_router};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Requires KAKAO_API_KEY
//! let config = ProxyConfig::from_env()?;
//! config.validate()?;
//! let router = build_router(&config)?;
//! # let _ = router;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`credential`] - Redacted API key holder
//! - [`error`] - Error types and their HTTP mapping
//! - [`handler`] - Router, per-route handler and access logging
//! - [`relay`] - Buffered and event-stream response relays
//! - [`route`] - Route table and relay modes
//! - [`translate`] - Inbound to outbound request translation
//! - [`upstream`] - Shared upstream HTTP client

pub mod config;
pub mod credential;
pub mod error;
pub mod handler;
pub mod relay;
pub mod route;
pub mod translate;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
