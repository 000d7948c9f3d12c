//! Shared configuration for tsoft tools.
//!
//! TOML profiles layered with `TSOFT_` environment variables, token
//! resolution (env + keyring + plaintext), and translation to
//! `tsoft_api::ClientConfig`. The CLI adds flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tsoft_api::{ClientConfig, TlsMode, TransportConfig};

/// Keyring service name for stored tokens.
pub const KEYRING_SERVICE: &str = "tsoft";

/// Environment variable consulted when a profile names no `token_env`.
pub const TOKEN_ENV: &str = "TSOFT_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token configured for profile '{profile}'")]
    MissingToken { profile: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named shop profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Requested name, else the configured default, else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| ConfigError::UnknownProfile {
            name: name.into(),
            available: self.profiles.keys().cloned().collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Log request payloads and truncated response bodies.
    #[serde(default)]
    pub debug: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            insecure: false,
            debug: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named shop profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Shop API root (e.g., "https://shop.example.com/rest1").
    pub base_url: String,

    /// API token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    /// Concurrent image fetches in bulk image retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_concurrency: Option<usize>,

    /// Concurrent detail fetches when enriching orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_concurrency: Option<usize>,
}

impl Profile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tsoft", "tsoft").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tsoft");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then layer `TSOFT_` env vars
/// (`TSOFT_DEFAULTS__TIMEOUT=60`). A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TSOFT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the API token: profile `token_env`, then `TSOFT_TOKEN`, then
/// the system keyring (`tsoft`, `<profile>/token`), then plaintext.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |key| {
            keyring::Entry::new(KEYRING_SERVICE, key)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let found = profile
        .token_env
        .as_deref()
        .and_then(&env)
        .or_else(|| env(TOKEN_ENV))
        .or_else(|| keyring(&keyring_key(profile_name)))
        .or_else(|| profile.token.clone())
        .filter(|token| !token.trim().is_empty());

    found.map(SecretString::from).ok_or_else(|| ConfigError::MissingToken {
        profile: profile_name.into(),
    })
}

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))?;
    entry.set_password(token)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.into(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.into(),
            reason: "scheme must be http or https".into(),
        });
    }
    Ok(url)
}

/// TLS mode for a profile: `insecure` wins over `ca_cert`.
pub fn tls_mode(profile: &Profile, defaults: &Defaults) -> TlsMode {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    }
}

/// Build a `ClientConfig` from a profile. No CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let base_url = parse_base_url(&profile.base_url)?;
    let token = resolve_token(profile, profile_name)?;

    let transport = TransportConfig {
        tls: tls_mode(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    };

    let mut config = ClientConfig::new(base_url, token)
        .with_debug(profile.debug.unwrap_or(defaults.debug))
        .with_transport(transport);
    if let Some(n) = profile.image_concurrency {
        config.image_concurrency = n.max(1);
    }
    if let Some(n) = profile.detail_concurrency {
        config.detail_concurrency = n.max(1);
    }
    Ok(config)
}
