use serde::Deserialize;
use std::fmt;

/// How an upstream response is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// Upstream status, headers and body are copied through.
    Buffered,
    /// The whole upstream body is wrapped in one `data:` event frame.
    Streamed,
}

/// The six public endpoints, each bound to one Kakao Local API path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Address,
    Category,
    #[serde(rename = "coord2address")]
    Coord2Address,
    #[serde(rename = "coord2regioncode")]
    Coord2RegionCode,
    Keyword,
    #[serde(rename = "transcoord")]
    TransCoord,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Address,
        Route::Category,
        Route::Coord2Address,
        Route::Coord2RegionCode,
        Route::Keyword,
        Route::TransCoord,
    ];

    pub fn public_path(self) -> &'static str {
        match self {
            Route::Address => "/search/address",
            Route::Category => "/search/category",
            Route::Coord2Address => "/geo/coord2address",
            Route::Coord2RegionCode => "/geo/coord2regioncode",
            Route::Keyword => "/search/keyword",
            Route::TransCoord => "/geo/transcoord",
        }
    }

    pub fn upstream_path(self) -> &'static str {
        match self {
            Route::Address => "/v2/local/search/address.json",
            Route::Category => "/v2/local/search/category.json",
            Route::Coord2Address => "/v2/local/geo/coord2address.json",
            Route::Coord2RegionCode => "/v2/local/geo/coord2regioncode.json",
            Route::Keyword => "/v2/local/search/keyword.json",
            Route::TransCoord => "/v2/local/geo/transcoord.json",
        }
    }

    /// Relay mode used when the configuration does not override it.
    ///
    /// Address search clients parse the body as plain JSON, category search
    /// clients strip the `data:` prefix, so only category is streamed.
    pub fn default_mode(self) -> RelayMode {
        match self {
            Route::Category => RelayMode::Streamed,
            _ => RelayMode::Buffered,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Route::Address => "address",
            Route::Category => "category",
            Route::Coord2Address => "coord2address",
            Route::Coord2RegionCode => "coord2regioncode",
            Route::Keyword => "keyword",
            Route::TransCoord => "transcoord",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
