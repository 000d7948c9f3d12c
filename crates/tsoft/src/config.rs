//! CLI configuration: a thin wrapper around `tsoft_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--base-url`, `--token`, `--timeout`, `--insecure`, `--debug`).

use std::time::Duration;

use secrecy::SecretString;

use tsoft_api::{ClientConfig, TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use tsoft_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build a `ClientConfig` from the config file, profile, and flags.
///
/// Without a matching profile, `--base-url` plus a token from the flag or
/// `TSOFT_TOKEN` is enough.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(tsoft_config::ConfigError::UnknownProfile {
                name: profile_name,
                available: cfg.profiles.keys().cloned().collect(),
            }
            .into());
        }
        None => {
            let base_url = global.base_url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(base_url)
        }
    };

    resolve_profile(&profile, &profile_name, &cfg, global)
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<ClientConfig, CliError> {
    // 1. Base URL (flag > env > profile)
    let raw_url = global.base_url.as_deref().unwrap_or(&profile.base_url);
    let base_url = tsoft_config::parse_base_url(raw_url)?;

    // 2. Token (flag > profile chain)
    let token = match global.token.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(token) => SecretString::from(token.to_owned()),
        None => tsoft_config::resolve_token(profile, profile_name)?,
    };

    // 3. TLS
    let tls = if global.insecure {
        TlsMode::DangerAcceptInvalid
    } else {
        tsoft_config::tls_mode(profile, &cfg.defaults)
    };

    // 4. Timeout (flag > profile > defaults)
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);

    let debug = global.debug || profile.debug.unwrap_or(cfg.defaults.debug);

    let mut config = ClientConfig::new(base_url, token)
        .with_debug(debug)
        .with_transport(TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
        });
    if let Some(n) = profile.image_concurrency {
        config.image_concurrency = n.max(1);
    }
    if let Some(n) = profile.detail_concurrency {
        config.detail_concurrency = n.max(1);
    }
    Ok(config)
}
