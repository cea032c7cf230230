//! Map imagery provider abstraction
//!
//! A provider supplies the projection used to lay out the mosaic and the URL of
//! each patch. Downloading goes through the [`HttpClient`] seam so tests can run
//! without a network.
//!
//! ```ignore
//! use earthmosaic::provider::{BingStaticProvider, ReqwestClient};
//!
//! let http_client = ReqwestClient::new()?;
//! let provider = BingStaticProvider::new(api_key).with_tile_size(768);
//! ```

mod bing;
mod http;
mod types;

pub use bing::{
    BingStaticProvider, DEFAULT_BASE_URL, DEFAULT_HEADER_CROP, DEFAULT_HEADER_PADDING,
    DEFAULT_TILE_SIZE,
};
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use types::{ProviderError, TileProvider};

#[cfg(test)]
pub use http::tests::MockHttpClient;
