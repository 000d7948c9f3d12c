// JSON API HTTP client
//
// Bearer-only auth injected as a default header; JSON bodies are sent as
// already-serialized values.

use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::{AuthStrategy, Credentials};
use crate::error::Error;
use crate::request::Query;
use crate::transport::{DEBUG_PREVIEW, RawResponse, TransportConfig, endpoint_url, preview};

/// Raw HTTP client for the JSON API.
pub struct ModernClient {
    http: reqwest::Client,
    base_url: Url,
    verbose: bool,
}

impl ModernClient {
    pub fn new(
        base_url: Url,
        credentials: &Credentials,
        transport: &TransportConfig,
        verbose: bool,
    ) -> Result<Self, Error> {
        let mut headers = credentials.headers(AuthStrategy::Bearer)?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = transport.build_client(headers)?;

        Ok(Self {
            http,
            base_url,
            verbose,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &Query) -> RawResponse {
        let url = endpoint_url(&self.base_url, path);
        debug!("GET {url} params={query:?}");

        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        RawResponse::read(request.send().await, &url, self.verbose).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> RawResponse {
        let url = endpoint_url(&self.base_url, path);
        debug!("POST {url}");

        if self.verbose {
            debug!(json = %preview(&body.to_string(), DEBUG_PREVIEW), "json request");
        }

        let result = self.http.post(&url).json(body).send().await;
        RawResponse::read(result, &url, self.verbose).await
    }
}
