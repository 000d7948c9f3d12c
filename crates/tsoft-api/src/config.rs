// Resolved settings for a `TsoftClient`.

use secrecy::SecretString;
use url::Url;

use crate::transport::TransportConfig;

/// Default concurrent image fetches in bulk image retrieval.
pub const DEFAULT_IMAGE_CONCURRENCY: usize = 3;

/// Default concurrent detail fetches when enriching orders.
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 5;

/// Everything the client needs to talk to one shop.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Shop API root, e.g. `https://shop.example.com/rest1`.
    pub base_url: Url,
    pub token: SecretString,
    /// Log request payloads and response bodies (truncated) at debug.
    pub debug: bool,
    pub transport: TransportConfig,
    pub image_concurrency: usize,
    pub detail_concurrency: usize,
}

impl ClientConfig {
    pub fn new(base_url: Url, token: SecretString) -> Self {
        Self {
            base_url,
            token,
            debug: false,
            transport: TransportConfig::default(),
            image_concurrency: DEFAULT_IMAGE_CONCURRENCY,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}
