// ── Core error types ──
//
// Errors from the warehouse and license services. Upstream failures never
// reach this crate as errors; they arrive as envelopes.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Warehouse errors ─────────────────────────────────────────────
    #[error("Warehouse not found: {id}")]
    WarehouseNotFound { id: u64 },

    #[error("Insufficient stock for {barcode}: {available} available, {requested} requested")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    // ── License errors ───────────────────────────────────────────────
    #[error("License not found: {key}")]
    LicenseNotFound { key: String },

    #[error("License expired on {}", .expires_at.format("%d/%m/%Y"))]
    LicenseExpired { expires_at: DateTime<Utc> },

    #[error("License has been revoked: {key}")]
    LicenseRevoked { key: String },

    #[error("License is registered to another machine")]
    MachineMismatch,

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
