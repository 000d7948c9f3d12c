// ── License registry and gate ──
//
// License keys with typed durations, machine binding on first activation,
// and a per-request gate that HTTP collaborators consult before serving a
// page.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::store::{MemoryStore, Record, Store};

/// Days before expiry at which a valid license starts warning.
const EXPIRING_SOON_DAYS: i64 = 7;

/// Source of "now". Injected so expiry can be tested without waiting.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ── Types ────────────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LicenseType {
    Trial,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Lifetime,
}

impl LicenseType {
    pub fn duration(self) -> TimeDelta {
        let days = match self {
            Self::Trial => 7,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Yearly => 365,
            Self::Lifetime => 36_500,
        };
        TimeDelta::days(days)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: u64,
    pub license_key: String,
    pub company_name: String,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub max_users: u32,
    pub notes: Option<String>,
    pub machine_id: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Record for License {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Input for issuing a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLicense {
    pub company_name: String,
    pub contact_email: String,
    #[serde(default, rename = "type")]
    pub license_type: LicenseType,
    #[serde(default = "default_max_users")]
    pub max_users: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_max_users() -> u32 {
    5
}

impl NewLicense {
    pub fn new(company_name: impl Into<String>, contact_email: impl Into<String>, license_type: LicenseType) -> Self {
        Self {
            company_name: company_name.into(),
            contact_email: contact_email.into(),
            license_type,
            max_users: default_max_users(),
            notes: None,
        }
    }
}

/// Activation request. Company and contact only apply on first activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub license_key: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
}

/// Outcome of checking a key. Always produced, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub valid: bool,
    pub message: String,
    pub license: Option<License>,
    pub days_remaining: i64,
    pub expired: bool,
    pub expiring_soon: bool,
}

impl Validation {
    fn rejected(message: impl Into<String>, license: Option<License>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            license,
            expired: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatistics {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub expiring_soon: usize,
    pub by_type: BTreeMap<LicenseType, usize>,
}

// ── Registry ─────────────────────────────────────────────────────────

/// License bookkeeping over an injected store.
pub struct LicenseRegistry {
    store: Arc<dyn Store<String, License>>,
    next_id: AtomicU64,
    clock: Clock,
}

impl LicenseRegistry {
    /// In-memory registry on the system clock, seeded with a trial license.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), Arc::new(Utc::now))
    }

    /// Registry over an injected store and clock. An empty store gets a
    /// seven-day trial license.
    pub fn with_store(store: Arc<dyn Store<String, License>>, clock: Clock) -> Self {
        let next_id = store.list().iter().map(|l| l.id).max().unwrap_or(0) + 1;
        let registry = Self {
            store,
            next_id: AtomicU64::new(next_id),
            clock,
        };

        if registry.store.is_empty() {
            let trial = registry.issue(
                "TRIAL",
                NewLicense {
                    max_users: 3,
                    ..NewLicense::new("Trial User", "trial@example.com", LicenseType::Trial)
                },
            );
            info!(
                key = %trial.license_key,
                expires = %trial.expires_at.format("%d/%m/%Y"),
                "trial license created"
            );
        }
        registry
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn find(&self, key: &str) -> Option<License> {
        self.store.get(&key.to_owned())
    }

    fn issue(&self, prefix: &str, input: NewLicense) -> License {
        let now = self.now();
        let license = License {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            license_key: generate_key(prefix),
            company_name: input.company_name,
            contact_email: input.contact_email,
            created_at: now,
            expires_at: now + input.license_type.duration(),
            is_active: true,
            license_type: input.license_type,
            max_users: input.max_users,
            notes: input.notes,
            machine_id: None,
            last_checked: None,
        };
        self.store.upsert(license.license_key.clone(), license.clone());
        license
    }

    /// Check a key and stamp its `last_checked`.
    pub fn validate(&self, key: &str) -> Validation {
        let Some(license) = self.find(key) else {
            return Validation::rejected("Invalid license key", None);
        };
        if !license.is_active {
            return Validation::rejected(
                CoreError::LicenseRevoked { key: key.to_owned() }.to_string(),
                Some(license),
            );
        }

        let now = self.now();
        let license = self
            .store
            .modify(&license.license_key, &mut |l: &mut License| l.last_checked = Some(now))
            .unwrap_or(license);

        if license.expires_at <= now {
            warn!(key, expired = %license.expires_at.format("%d/%m/%Y"), "license expired");
            return Validation::rejected(
                CoreError::LicenseExpired {
                    expires_at: license.expires_at,
                }
                .to_string(),
                Some(license),
            );
        }

        let days_remaining = (license.expires_at - now).num_days();
        debug!(key, days_remaining, "license valid");
        Validation {
            valid: true,
            message: format!("License valid ({days_remaining} days remaining)"),
            license: Some(license),
            days_remaining,
            expired: false,
            expiring_soon: days_remaining > 0 && days_remaining <= EXPIRING_SOON_DAYS,
        }
    }

    /// The unexpired, non-revoked license that runs longest.
    pub fn active_license(&self) -> Option<License> {
        let now = self.now();
        self.store
            .list()
            .into_iter()
            .filter(|l| l.is_active && l.expires_at > now)
            .max_by_key(|l| l.expires_at)
    }

    pub fn create(&self, input: NewLicense) -> Result<License, CoreError> {
        if input.company_name.trim().is_empty() {
            return Err(CoreError::validation("company name is required"));
        }
        if input.contact_email.trim().is_empty() {
            return Err(CoreError::validation("contact email is required"));
        }

        let license = self.issue("TSOFT", input);
        info!(
            key = %license.license_key,
            company = %license.company_name,
            license_type = %license.license_type,
            expires = %license.expires_at.format("%d/%m/%Y"),
            "license created"
        );
        Ok(license)
    }

    /// Activate a key on a machine.
    ///
    /// The first activation binds the machine id and may fill in company
    /// and contact. Later activations must come from the bound machine.
    /// Activating a revoked, unexpired key re-enables it.
    pub fn activate(&self, request: &Activation) -> Result<License, CoreError> {
        let license = self.find(&request.license_key).ok_or_else(|| CoreError::LicenseNotFound {
            key: request.license_key.clone(),
        })?;

        let now = self.now();
        if license.expires_at <= now {
            return Err(CoreError::LicenseExpired {
                expires_at: license.expires_at,
            });
        }

        let bound = license.machine_id.as_deref().filter(|id| !id.is_empty());
        if let Some(bound) = bound {
            if request.machine_id.as_deref() != Some(bound) {
                warn!(key = %license.license_key, "activation from another machine rejected");
                return Err(CoreError::MachineMismatch);
            }
        }
        let first = bound.is_none();

        let activated = self
            .store
            .modify(&license.license_key, &mut |l: &mut License| {
                if first {
                    l.machine_id.clone_from(&request.machine_id);
                    if let Some(company) = &request.company_name {
                        l.company_name.clone_from(company);
                    }
                    if let Some(email) = &request.contact_email {
                        l.contact_email.clone_from(email);
                    }
                }
                l.last_checked = Some(now);
                l.is_active = true;
            })
            .unwrap_or(license);

        info!(key = %activated.license_key, company = %activated.company_name, "license activated");
        Ok(activated)
    }

    /// Push the expiry date out by `days`.
    pub fn extend(&self, key: &str, days: i64) -> Result<License, CoreError> {
        let license = self.find(key).ok_or_else(|| CoreError::LicenseNotFound { key: key.to_owned() })?;
        let old_expiry = license.expires_at;
        let extended = self
            .store
            .modify(&license.license_key, &mut |l: &mut License| {
                l.expires_at += TimeDelta::days(days);
            })
            .unwrap_or(license);

        info!(
            key,
            from = %old_expiry.format("%d/%m/%Y"),
            to = %extended.expires_at.format("%d/%m/%Y"),
            "license extended"
        );
        Ok(extended)
    }

    pub fn revoke(&self, key: &str) -> Result<(), CoreError> {
        if !self.store.soft_delete(&key.to_owned()) {
            return Err(CoreError::LicenseNotFound { key: key.to_owned() });
        }
        warn!(key, "license revoked");
        Ok(())
    }

    /// Every license, newest first.
    pub fn list(&self) -> Vec<License> {
        let mut licenses = self.store.list();
        licenses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        licenses
    }

    pub fn statistics(&self) -> LicenseStatistics {
        let now = self.now();
        let soon = now + TimeDelta::days(EXPIRING_SOON_DAYS);
        let licenses = self.store.list();

        let mut by_type = BTreeMap::new();
        for license in &licenses {
            *by_type.entry(license.license_type).or_insert(0) += 1;
        }

        LicenseStatistics {
            total: licenses.len(),
            active: licenses.iter().filter(|l| l.is_active && l.expires_at > now).count(),
            expired: licenses.iter().filter(|l| l.expires_at <= now).count(),
            expiring_soon: licenses
                .iter()
                .filter(|l| l.is_active && l.expires_at > now && l.expires_at <= soon)
                .count(),
            by_type,
        }
    }

    /// Active licenses expiring within `days`, soonest first.
    pub fn expiring_soon(&self, days: i64) -> Vec<License> {
        let now = self.now();
        let threshold = now + TimeDelta::days(days);
        let mut licenses: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|l| l.is_active && l.expires_at > now && l.expires_at <= threshold)
            .collect();
        licenses.sort_by_key(|l| l.expires_at);
        licenses
    }
}

impl Default for LicenseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `PREFIX-XXXX-XXXX-XXXX-XXXX` from the first 16 hex digits of a v4 uuid.
fn generate_key(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    let segments: Vec<&str> = (0..4).filter_map(|i| hex.get(i * 4..i * 4 + 4)).collect();
    format!("{prefix}-{}", segments.join("-"))
}

// ── Gate ─────────────────────────────────────────────────────────────

/// Path prefixes served without a license.
const EXCLUDED_PATHS: [&str; 10] = [
    "/account/login",
    "/login",
    "/api/license/validate",
    "/api/license/activate",
    "/api/license/machine-id",
    "/license",
    "/css",
    "/js",
    "/lib",
    "/favicon.ico",
];

/// Where non-API requests are sent when denied.
const LICENSE_PAGE: &str = "/License";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Serve the request, optionally surfacing an expiry warning.
    Allow { warning: Option<String> },
    /// Refuse. `api` requests get a 403 JSON body, others a redirect.
    Deny { message: String, api: bool },
}

impl GateDecision {
    /// JSON body for a denied API request.
    pub fn deny_body(&self) -> Option<DenyBody> {
        match self {
            Self::Deny { message, api: true } => Some(DenyBody {
                success: false,
                message: message.clone(),
                license_expired: true,
            }),
            _ => None,
        }
    }

    /// Redirect target for a denied page request.
    pub fn redirect_location(&self) -> Option<String> {
        match self {
            Self::Deny { message, api: false } => {
                let escaped: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
                Some(format!("{LICENSE_PAGE}?message={escaped}"))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyBody {
    pub success: bool,
    pub message: String,
    pub license_expired: bool,
}

/// Per-request license check.
pub struct LicenseGate {
    registry: Arc<LicenseRegistry>,
}

impl LicenseGate {
    pub fn new(registry: Arc<LicenseRegistry>) -> Self {
        Self { registry }
    }

    pub fn check(&self, path: &str) -> GateDecision {
        let path = path.to_ascii_lowercase();
        if EXCLUDED_PATHS.iter().any(|excluded| path.starts_with(excluded)) {
            return GateDecision::Allow { warning: None };
        }
        let api = path == "/api" || path.starts_with("/api/");

        let Some(license) = self.registry.active_license() else {
            warn!(path = %path, "no active license");
            return GateDecision::Deny {
                message: "No active license found. Please activate a license.".into(),
                api,
            };
        };

        let validation = self.registry.validate(&license.license_key);
        if !validation.valid {
            warn!(path = %path, message = %validation.message, "license check failed");
            return GateDecision::Deny {
                message: validation.message,
                api,
            };
        }

        let warning = validation
            .expiring_soon
            .then(|| format!("Your license expires in {} days!", validation.days_remaining));
        GateDecision::Allow { warning }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn frozen() -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
        let now = Arc::new(Mutex::new(
            DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (now, clock)
    }

    fn registry() -> (Arc<Mutex<DateTime<Utc>>>, LicenseRegistry) {
        let (now, clock) = frozen();
        (now, LicenseRegistry::with_store(Arc::new(MemoryStore::new()), clock))
    }

    #[test]
    fn keys_have_four_hex_segments() {
        let key = generate_key("TSOFT");
        let parts: Vec<_> = key.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "TSOFT");
        assert!(
            parts[1..]
                .iter()
                .all(|p| p.len() == 4 && p.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()))
        );
    }

    #[test]
    fn durations_by_type() {
        let days: Vec<_> = LicenseType::iter().map(|t| t.duration().num_days()).collect();
        assert_eq!(days, [7, 30, 90, 365, 36_500]);
        assert_eq!("yearly".parse::<LicenseType>().unwrap(), LicenseType::Yearly);
    }

    #[test]
    fn seeded_trial_is_valid_and_expiring_soon() {
        let (_, registry) = registry();
        let trial = registry.active_license().unwrap();
        assert!(trial.license_key.starts_with("TRIAL-"));

        let validation = registry.validate(&trial.license_key);
        assert!(validation.valid);
        assert_eq!(validation.days_remaining, 7);
        assert!(validation.expiring_soon);
        assert!(validation.license.unwrap().last_checked.is_some());
    }

    #[test]
    fn unknown_and_revoked_keys_are_rejected() {
        let (_, registry) = registry();
        assert_eq!(registry.validate("NOPE").message, "Invalid license key");

        let key = registry.active_license().unwrap().license_key;
        registry.revoke(&key).unwrap();
        let validation = registry.validate(&key);
        assert!(!validation.valid);
        assert!(validation.expired);
        assert!(registry.active_license().is_none());
    }

    #[test]
    fn expiry_follows_the_clock() {
        let (now, registry) = registry();
        let key = registry.active_license().unwrap().license_key;

        *now.lock().unwrap() += TimeDelta::days(8);

        let validation = registry.validate(&key);
        assert!(!validation.valid);
        assert_eq!(validation.message, "License expired on 08/03/2025");
        assert_eq!(registry.statistics().expired, 1);
    }

    #[test]
    fn activation_binds_machine() {
        let (_, registry) = registry();
        let license = registry
            .create(NewLicense::new("Acme", "ops@acme.test", LicenseType::Yearly))
            .unwrap();

        let first = registry
            .activate(&Activation {
                license_key: license.license_key.clone(),
                company_name: Some("Acme Ltd".into()),
                machine_id: Some("M-1".into()),
                ..Activation::default()
            })
            .unwrap();
        assert_eq!(first.machine_id.as_deref(), Some("M-1"));
        assert_eq!(first.company_name, "Acme Ltd");

        let other = registry.activate(&Activation {
            license_key: license.license_key.clone(),
            machine_id: Some("M-2".into()),
            ..Activation::default()
        });
        assert_eq!(other, Err(CoreError::MachineMismatch));
    }

    #[test]
    fn statistics_and_expiring_listing() {
        let (_, registry) = registry();
        let yearly = registry
            .create(NewLicense::new("Acme", "ops@acme.test", LicenseType::Yearly))
            .unwrap();
        registry.extend(&yearly.license_key, 10).unwrap();

        let stats = registry.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expiring_soon, 1);
        assert_eq!(stats.by_type[&LicenseType::Yearly], 1);

        let soon = registry.expiring_soon(7);
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].license_type, LicenseType::Trial);
        assert_eq!(registry.list()[0].license_key, yearly.license_key);
        assert_eq!(registry.active_license().unwrap().license_key, yearly.license_key);
    }

    #[test]
    fn gate_skips_excluded_paths_case_insensitively() {
        let (_, registry) = registry();
        let key = registry.active_license().unwrap().license_key;
        registry.revoke(&key).unwrap();
        let gate = LicenseGate::new(Arc::new(registry));

        assert_eq!(gate.check("/CSS/site.css"), GateDecision::Allow { warning: None });
        assert_eq!(gate.check("/Api/License/Validate"), GateDecision::Allow { warning: None });
    }

    #[test]
    fn gate_denies_without_license() {
        let (_, registry) = registry();
        let key = registry.active_license().unwrap().license_key;
        registry.revoke(&key).unwrap();
        let gate = LicenseGate::new(Arc::new(registry));

        let api = gate.check("/api/orders");
        let body = serde_json::to_value(api.deny_body().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "message": "No active license found. Please activate a license.",
                "licenseExpired": true
            })
        );

        let page = gate.check("/Orders");
        assert_eq!(
            page.redirect_location().unwrap(),
            "/License?message=No+active+license+found.+Please+activate+a+license."
        );
        assert!(page.deny_body().is_none());
    }

    #[test]
    fn gate_warns_when_expiring() {
        let (_, registry) = registry();
        let gate = LicenseGate::new(Arc::new(registry));

        assert_eq!(
            gate.check("/products"),
            GateDecision::Allow {
                warning: Some("Your license expires in 7 days!".into())
            }
        );
    }
}
