// Shared transport plumbing for both upstream API styles.
//
// Builds reqwest clients with common TLS and timeout settings, defines the
// `RawResponse` every call resolves to, and the `Transport` seam the
// fallback orchestrator drives.

use std::borrow::Cow;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::legacy::LegacyClient;
use crate::modern::ModernClient;
use crate::request::Request;

/// Characters of request/response text echoed by debug logging.
pub(crate) const DEBUG_PREVIEW: usize = 500;

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (staging shops with self-signed certs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` carrying `headers` on every request.
    pub fn build_client(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tsoft/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder.build().map_err(Error::ClientBuild)
    }
}

// ── Raw responses ────────────────────────────────────────────────────

/// Outcome of a single upstream call.
///
/// `ok` is true only when the request went out and came back 2xx. A
/// non-2xx reply keeps its body and status; a network failure has an
/// empty body and status 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub ok: bool,
    pub body: String,
    pub status: u16,
}

impl RawResponse {
    /// A call that never produced an HTTP response.
    pub fn failed() -> Self {
        Self::default()
    }

    /// A 2xx response with the given body.
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            ok: true,
            body: body.into(),
            status: 200,
        }
    }

    /// Drain a reqwest result into a `RawResponse`, logging but never
    /// propagating failures.
    pub(crate) async fn read(
        result: Result<reqwest::Response, reqwest::Error>,
        url: &str,
        verbose: bool,
    ) -> Self {
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url, error = %e, "upstream request failed");
                return Self::failed();
            }
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, status = status.as_u16(), error = %e, "failed to read response body");
                return Self {
                    ok: false,
                    body: String::new(),
                    status: status.as_u16(),
                };
            }
        };

        if verbose {
            debug!(
                status = status.as_u16(),
                body = %preview(&body, DEBUG_PREVIEW),
                "response"
            );
        }

        Self {
            ok: status.is_success(),
            body,
            status: status.as_u16(),
        }
    }
}

// ── Transport seam ───────────────────────────────────────────────────

/// Executes one upstream call.
///
/// The request variant picks the wire style. Implementations never fail:
/// every problem is folded into the returned [`RawResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, path: &str, request: &Request) -> impl Future<Output = RawResponse> + Send;
}

/// Production transport: legacy form POSTs and JSON-API calls over reqwest.
pub struct HttpTransport {
    legacy: LegacyClient,
    modern: ModernClient,
}

impl HttpTransport {
    /// Build both wire clients from a resolved client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let scheme = config.base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Error::UnsupportedScheme {
                scheme: scheme.to_owned(),
            });
        }

        let credentials = Credentials::new(config.token.clone());
        let legacy = LegacyClient::new(
            config.base_url.clone(),
            credentials.clone(),
            &config.transport,
            config.debug,
        )?;
        let modern = ModernClient::new(
            config.base_url.clone(),
            &credentials,
            &config.transport,
            config.debug,
        )?;

        Ok(Self { legacy, modern })
    }

    pub fn legacy(&self) -> &LegacyClient {
        &self.legacy
    }

    pub fn modern(&self) -> &ModernClient {
        &self.modern
    }
}

impl Transport for HttpTransport {
    async fn send(&self, path: &str, request: &Request) -> RawResponse {
        match request {
            Request::Form(form) => self.legacy.post_form(path, form).await,
            Request::Query(query) => self.modern.get(path, query).await,
            Request::Json(body) => self.modern.post_json(path, body).await,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Join an endpoint path onto the base URL.
///
/// Endpoint paths are appended to the base path, never resolved against
/// it, so `https://shop/rest1` + `/product/get` keeps the `rest1` segment.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// First `max` characters of `text`, with `...` appended when cut.
pub(crate) fn preview(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &text[..idx])),
        None => Cow::Borrowed(text),
    }
}
