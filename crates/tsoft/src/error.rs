//! CLI error types with miette diagnostics.
//!
//! Maps config, client-setup and service errors into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use tsoft_config::ConfigError;
use tsoft_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Upstream ─────────────────────────────────────────────────────
    #[error("{operation} failed: {message}")]
    #[diagnostic(
        code(tsoft::upstream),
        help(
            "Every known endpoint for this call was tried.\n\
             Re-run with --debug -vv to see each attempt."
        )
    )]
    Upstream { operation: String, message: String },

    #[error("Could not set up the HTTP client for {url}")]
    #[diagnostic(
        code(tsoft::client_setup),
        help("Check the base URL, the token, and any ca_cert configured for the profile.")
    )]
    ClientSetup {
        url: String,
        #[source]
        source: tsoft_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(tsoft::no_token),
        help(
            "Store one with: tsoft config set-token --profile {profile}\n\
             Or set the TSOFT_TOKEN environment variable."
        )
    )]
    NoToken { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(tsoft::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(code(tsoft::conflict))]
    Conflict { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tsoft::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tsoft::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tsoft config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No shop configured")]
    #[diagnostic(
        code(tsoft::no_config),
        help(
            "Create a profile with: tsoft config init\n\
             Or pass --base-url and --token.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tsoft::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tsoft::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(tsoft::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ClientSetup { source, .. } if source.is_credential() => exit_code::AUTH,
            Self::ClientSetup { .. } => exit_code::CONNECTION,
            Self::NoToken { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Upstream failure from an envelope's messages.
    pub fn upstream(operation: &str, messages: &[String]) -> Self {
        Self::Upstream {
            operation: operation.into(),
            message: if messages.is_empty() {
                "no details returned".into()
            } else {
                messages.join("; ")
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingToken { profile } => Self::NoToken { profile },
            ConfigError::InvalidUrl { url, reason } => Self::Validation {
                field: "base_url".into(),
                reason: format!("{url}: {reason}"),
            },
            ConfigError::UnknownProfile { name, available } => Self::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::WarehouseNotFound { id } => Self::NotFound {
                resource_type: "warehouse".into(),
                identifier: id.to_string(),
            },
            CoreError::LicenseNotFound { key } => Self::NotFound {
                resource_type: "license".into(),
                identifier: key,
            },
            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            other => Self::Conflict {
                message: other.to_string(),
            },
        }
    }
}
