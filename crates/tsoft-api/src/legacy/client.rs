// Legacy API HTTP client
//
// Wraps `reqwest::Client` with the form-POST conventions of the legacy
// API: token headers injected as defaults, the `token` form field added to
// every body, and debug echo of the (redacted) form.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use crate::auth::{AuthStrategy, Credentials, TOKEN_FIELD};
use crate::error::Error;
use crate::request::Form;
use crate::transport::{DEBUG_PREVIEW, RawResponse, TransportConfig, endpoint_url, preview};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const LEGACY_ACCEPT: &str = "application/json, text/plain, */*";

/// Raw HTTP client for the legacy form API.
pub struct LegacyClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    verbose: bool,
}

impl LegacyClient {
    /// Create a legacy client. Bearer and `X-Auth-Token` headers are
    /// installed as client defaults.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
        verbose: bool,
    ) -> Result<Self, Error> {
        let mut headers = credentials.headers(AuthStrategy::LegacyForm)?;
        headers.insert(ACCEPT, HeaderValue::from_static(LEGACY_ACCEPT));
        let http = transport.build_client(headers)?;

        Ok(Self {
            http,
            base_url,
            credentials,
            verbose,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// POST `form` (plus the token field) to `path`.
    pub async fn post_form(&self, path: &str, form: &Form) -> RawResponse {
        let url = endpoint_url(&self.base_url, path);
        debug!("POST {url}");

        let mut form = form.clone();
        form.set(TOKEN_FIELD, self.credentials.expose());

        if self.verbose {
            let echoed = form.redacted(TOKEN_FIELD);
            debug!(form = %preview(&echoed, DEBUG_PREVIEW), "legacy request");
        }

        let result = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.encode())
            .send()
            .await;

        RawResponse::read(result, &url, self.verbose).await
    }
}
