// Credential handling for both upstream API styles.
//
// The platform accepts the same opaque token three ways and different
// deployments honour different ones, so the legacy API sends all of them.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::Error;

/// Duplicate token header honoured by some legacy deployments.
pub const AUTH_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-auth-token");

/// Form field carrying the token on legacy POSTs.
pub const TOKEN_FIELD: &str = "token";

/// Which credential mechanisms a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Bearer header, `X-Auth-Token` header and `token` form field.
    LegacyForm,
    /// Bearer header only.
    Bearer,
}

/// The upstream API token.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: SecretString,
}

impl Credentials {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Raw token text, for the legacy `token` form field.
    pub(crate) fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Build the header set for a request style.
    ///
    /// Values are marked sensitive so they never show up in `Debug`
    /// output of the request.
    pub fn headers(&self, strategy: AuthStrategy) -> Result<HeaderMap, Error> {
        let token = self.token.expose_secret();
        if token.trim().is_empty() {
            return Err(Error::InvalidToken {
                message: "token is empty".into(),
            });
        }

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| Error::InvalidToken {
                message: format!("invalid Authorization header value: {e}"),
            })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        if strategy == AuthStrategy::LegacyForm {
            let mut raw = HeaderValue::from_str(token).map_err(|e| Error::InvalidToken {
                message: format!("invalid X-Auth-Token header value: {e}"),
            })?;
            raw.set_sensitive(true);
            headers.insert(AUTH_TOKEN_HEADER, raw);
        }

        Ok(headers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn creds(token: &str) -> Credentials {
        Credentials::new(SecretString::from(token.to_owned()))
    }

    #[test]
    fn legacy_headers_carry_both_mechanisms() {
        let headers = creds("abc").headers(AuthStrategy::LegacyForm).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[AUTH_TOKEN_HEADER], "abc");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn bearer_headers_omit_duplicate() {
        let headers = creds("abc").headers(AuthStrategy::Bearer).unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers.get(AUTH_TOKEN_HEADER).is_none());
    }

    #[test]
    fn blank_token_is_rejected() {
        let err = creds("   ").headers(AuthStrategy::Bearer).unwrap_err();
        assert!(err.is_credential());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(creds("bad\ntoken").headers(AuthStrategy::LegacyForm).is_err());
    }
}
