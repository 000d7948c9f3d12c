use thiserror::Error;

/// Construction-time errors for the `tsoft-api` crate.
///
/// Upstream operations never return this type: once a [`TsoftClient`]
/// exists, every failure is folded into an [`Envelope`]. These variants
/// only surface while building the HTTP stack from configuration.
///
/// [`TsoftClient`]: crate::TsoftClient
/// [`Envelope`]: crate::Envelope
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The token cannot be carried in an HTTP header.
    #[error("Invalid API token: {message}")]
    InvalidToken { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Base URL uses a scheme the HTTP stack cannot talk to.
    #[error("Unsupported base URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    /// TLS handshake or certificate setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The underlying `reqwest::Client` could not be built.
    #[error("HTTP client setup failed: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl Error {
    /// Returns `true` if this error stems from the credential rather
    /// than the endpoint configuration.
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }
}
