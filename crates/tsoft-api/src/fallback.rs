// Endpoint fallback orchestrator
//
// Each operation knows several candidate endpoints grouped into tiers
// (legacy form API first, JSON API second, sometimes an `order2` tier in
// front). The orchestrator walks them in order and stops at the first
// acceptable result. Failed candidates are logged and skipped; only full
// exhaustion produces a failure envelope.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::decode::{Payload, decode};
use crate::envelope::Envelope;
use crate::request::{Form, Query, Request};
use crate::transport::{RawResponse, Transport};

// ── Plan ─────────────────────────────────────────────────────────────

/// One endpoint to try.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: String,
    pub request: Request,
}

impl Candidate {
    /// Legacy form POST.
    pub fn form(path: impl Into<String>, form: Form) -> Self {
        Self {
            path: path.into(),
            request: Request::Form(form),
        }
    }

    /// JSON-API GET with query parameters.
    pub fn query(path: impl Into<String>, query: Query) -> Self {
        Self {
            path: path.into(),
            request: Request::Query(query),
        }
    }

    /// JSON-API GET without parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self::query(path, Vec::new())
    }

    /// JSON-API POST.
    pub fn json(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            request: Request::Json(body),
        }
    }
}

/// An ordered group of candidates sharing an API style.
#[derive(Debug, Clone)]
pub struct Tier {
    pub name: &'static str,
    pub candidates: Vec<Candidate>,
}

/// How a transport-ok response is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Reads: the decode must succeed with non-blank data. An empty
    /// success counts as a miss, and a plan of misses is a failure.
    NonEmpty,
    /// Mutations: the first transport-ok response is final, so a write
    /// is never replayed against a second endpoint.
    FirstResponse,
    /// Void calls: transport success is the whole answer.
    TransportOk,
}

/// Everything the orchestrator needs to run one operation.
#[derive(Debug, Clone)]
pub struct Plan {
    operation: String,
    tiers: Vec<Tier>,
    not_found: Option<String>,
    critical: bool,
    acceptance: Acceptance,
}

impl Plan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            tiers: Vec::new(),
            not_found: None,
            critical: false,
            acceptance: Acceptance::NonEmpty,
        }
    }

    pub fn tier(mut self, name: &'static str, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        self.tiers.push(Tier {
            name,
            candidates: candidates.into_iter().collect(),
        });
        self
    }

    /// Extra message attached to the exhaustion failure.
    pub fn not_found(mut self, message: impl Into<String>) -> Self {
        self.not_found = Some(message.into());
        self
    }

    /// Exhaustion is logged at error instead of warn.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn accept(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    fn candidates(&self) -> impl Iterator<Item = (&'static str, &Candidate)> {
        self.tiers
            .iter()
            .flat_map(|tier| tier.candidates.iter().map(move |c| (tier.name, c)))
    }

    fn exhausted<T>(&self) -> Envelope<T> {
        if self.critical {
            error!(operation = %self.operation, "all endpoints failed");
        } else {
            warn!(operation = %self.operation, "all endpoints failed");
        }
        let envelope = Envelope::failure(format!("All {} endpoints failed", self.operation));
        match &self.not_found {
            Some(message) => envelope.with_message(message.clone()),
            None => envelope,
        }
    }

    fn cancelled<T>(&self) -> Envelope<T> {
        info!(operation = %self.operation, "cancelled");
        Envelope::failure(format!("{} cancelled", self.operation))
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Walks a [`Plan`] against a [`Transport`].
pub struct Orchestrator<'a, T> {
    transport: &'a T,
    cancel: &'a CancellationToken,
}

impl<'a, T: Transport> Orchestrator<'a, T> {
    pub fn new(transport: &'a T, cancel: &'a CancellationToken) -> Self {
        Self { transport, cancel }
    }

    /// Send one candidate, racing cancellation. `None` means cancelled.
    pub(crate) async fn attempt(&self, candidate: &Candidate) -> Option<RawResponse> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            raw = self.transport.send(&candidate.path, &candidate.request) => Some(raw),
        }
    }

    /// Run a plan whose responses decode into `P`.
    pub async fn run<P: Payload>(&self, plan: &Plan) -> Envelope<P> {
        for (tier, candidate) in plan.candidates() {
            let Some(raw) = self.attempt(candidate).await else {
                return plan.cancelled();
            };

            if !raw.ok {
                debug!(
                    operation = %plan.operation,
                    tier,
                    path = %candidate.path,
                    status = raw.status,
                    "endpoint failed"
                );
                continue;
            }

            let envelope = decode::<P>(&raw.body);

            if plan.acceptance != Acceptance::NonEmpty {
                info!(operation = %plan.operation, tier, path = %candidate.path, "endpoint succeeded");
                return envelope;
            }

            let populated = envelope.data.as_ref().is_some_and(|data| !data.is_blank());
            if envelope.success && populated {
                info!(operation = %plan.operation, tier, path = %candidate.path, "endpoint succeeded");
                return envelope;
            }

            debug!(
                operation = %plan.operation,
                tier,
                path = %candidate.path,
                success = envelope.success,
                "endpoint returned no usable data"
            );
        }

        plan.exhausted()
    }

    /// Run a plan where only transport success matters.
    pub async fn run_void(&self, plan: &Plan) -> Envelope<()> {
        for (tier, candidate) in plan.candidates() {
            let Some(raw) = self.attempt(candidate).await else {
                return plan.cancelled();
            };
            if raw.ok {
                info!(operation = %plan.operation, tier, path = %candidate.path, "endpoint succeeded");
                return Envelope::done(true);
            }
            debug!(
                operation = %plan.operation,
                tier,
                path = %candidate.path,
                status = raw.status,
                "endpoint failed"
            );
        }
        plan.exhausted()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Category, Product};

    /// Scripted transport that records every path it is asked for.
    #[derive(Default)]
    pub(crate) struct Recorder {
        replies: HashMap<String, RawResponse>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub(crate) fn reply(mut self, path: &str, body: &str) -> Self {
            self.replies.insert(path.to_owned(), RawResponse::success(body));
            self
        }

        pub(crate) fn status(mut self, path: &str, status: u16) -> Self {
            self.replies.insert(
                path.to_owned(),
                RawResponse {
                    ok: false,
                    body: String::new(),
                    status,
                },
            );
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for Recorder {
        async fn send(&self, path: &str, _request: &Request) -> RawResponse {
            self.calls.lock().unwrap().push(path.to_owned());
            self.replies.get(path).cloned().unwrap_or_default()
        }
    }

    fn three_way(acceptance: Acceptance) -> Plan {
        Plan::new("product")
            .tier(
                "legacy",
                [
                    Candidate::form("/a", Form::new()),
                    Candidate::form("/b", Form::new()),
                ],
            )
            .tier("json", [Candidate::get("/c")])
            .not_found("Product not found: X")
            .accept(acceptance)
    }

    #[tokio::test]
    async fn only_third_candidate_succeeds() {
        let transport = Recorder::default()
            .status("/a", 404)
            .reply("/c", r#"{"Success":true,"Data":[{"CategoryCode":"T1"}]}"#);
        let cancel = CancellationToken::new();

        let env: Envelope<Vec<Category>> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::NonEmpty))
            .await;

        assert_eq!(transport.calls(), ["/a", "/b", "/c"]);
        assert!(env.success);
        assert_eq!(env.data.unwrap()[0].category_code.as_str(), "T1");
    }

    #[tokio::test]
    async fn empty_successes_exhaust_the_plan() {
        let transport = Recorder::default()
            .reply("/a", r#"{"Success":true,"Data":[]}"#)
            .reply("/b", r#"{"Success":false,"Data":[{"CategoryCode":"T1"}]}"#);
        let cancel = CancellationToken::new();

        let env: Envelope<Vec<Category>> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::NonEmpty))
            .await;

        assert_eq!(transport.calls(), ["/a", "/b", "/c"]);
        assert!(!env.success);
        assert_eq!(env.data, None);
        assert_eq!(
            env.messages,
            ["All product endpoints failed", "Product not found: X"]
        );
    }

    #[tokio::test]
    async fn status_only_miss_is_not_a_blank_entity() {
        let transport = Recorder::default()
            .reply("/a", r#"{"success":false,"message":"Product not found"}"#)
            .reply("/b", r#"{"Success":true,"Data":[]}"#);
        let cancel = CancellationToken::new();

        let env: Envelope<Product> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::NonEmpty))
            .await;

        assert_eq!(transport.calls(), ["/a", "/b", "/c"]);
        assert!(!env.success);
        assert_eq!(env.data, None);
    }

    #[tokio::test]
    async fn exhaustion_reports_operation_and_detail() {
        let transport = Recorder::default();
        let cancel = CancellationToken::new();

        let env: Envelope<Product> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::NonEmpty))
            .await;

        assert!(!env.success);
        assert_eq!(
            env.messages,
            ["All product endpoints failed", "Product not found: X"]
        );
    }

    #[tokio::test]
    async fn first_response_never_replays() {
        let transport = Recorder::default()
            .reply("/a", r#"{"Success":false,"Message":"duplicate code"}"#)
            .reply("/b", r#"{"Success":true,"Data":{"ProductCode":"P1"}}"#);
        let cancel = CancellationToken::new();

        let env: Envelope<Product> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::FirstResponse))
            .await;

        assert_eq!(transport.calls(), ["/a"]);
        assert!(!env.success);
        assert_eq!(env.messages, ["duplicate code"]);
    }

    #[tokio::test]
    async fn void_plans_stop_at_transport_success() {
        let transport = Recorder::default().status("/a", 500).reply("/b", "");
        let cancel = CancellationToken::new();

        let env = Orchestrator::new(&transport, &cancel)
            .run_void(&three_way(Acceptance::TransportOk))
            .await;

        assert_eq!(transport.calls(), ["/a", "/b"]);
        assert!(env.success);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_any_call() {
        let transport = Recorder::default().reply("/a", r#"[{"CategoryCode":"T1"}]"#);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let env: Envelope<Vec<Category>> = Orchestrator::new(&transport, &cancel)
            .run(&three_way(Acceptance::NonEmpty))
            .await;

        assert!(transport.calls().is_empty());
        assert_eq!(env.messages, ["product cancelled"]);
    }
}
