// High-level T-Soft client
//
// `TsoftClient` is the single entry point for collaborators. Every
// operation builds a fallback plan, runs it through the orchestrator and
// returns an `Envelope`; nothing here returns `Err` once the client
// exists. Operations are split by resource into sibling modules as
// inherent methods.

mod categories;
mod customers;
mod images;
mod orders;
mod products;
mod reference;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::breaker::DetailBreaker;
use crate::config::{ClientConfig, DEFAULT_DETAIL_CONCURRENCY, DEFAULT_IMAGE_CONCURRENCY};
use crate::error::Error;
use crate::fallback::Orchestrator;
use crate::transport::{HttpTransport, Transport};

pub use orders::{EnrichmentOutcome, EnrichmentReport, order_page_filters};
pub use products::{BulkFailure, BulkOutcome, ProductQuery};

/// Fan-out bounds for batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub image_concurrency: usize,
    pub detail_concurrency: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            image_concurrency: DEFAULT_IMAGE_CONCURRENCY,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }
}

struct Inner<T> {
    transport: T,
    breaker: DetailBreaker,
    limits: Limits,
}

/// Tolerant client for one shop.
///
/// Cheap to clone; clones share the transport and the detail breaker.
/// Each clone carries its own cancellation token (see
/// [`with_cancellation`](Self::with_cancellation)).
pub struct TsoftClient<T = HttpTransport> {
    inner: Arc<Inner<T>>,
    cancel: CancellationToken,
}

impl<T> Clone for TsoftClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: self.cancel.clone(),
        }
    }
}

impl TsoftClient<HttpTransport> {
    /// Build a client with the reqwest transport.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(config)?;
        let limits = Limits {
            image_concurrency: config.image_concurrency,
            detail_concurrency: config.detail_concurrency,
        };
        Ok(Self::with_transport(transport, limits))
    }
}

impl<T: Transport> TsoftClient<T> {
    /// Build a client over any transport.
    pub fn with_transport(transport: T, limits: Limits) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                breaker: DetailBreaker::new(),
                limits,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// A clone whose operations observe `token`.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: token,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn limits(&self) -> Limits {
        self.inner.limits
    }

    pub fn detail_breaker(&self) -> &DetailBreaker {
        &self.inner.breaker
    }

    /// Re-arm guarded order-detail fetching after a failure opened the
    /// breaker.
    pub fn reset_detail_breaker(&self) {
        self.inner.breaker.reset();
    }

    fn orchestrator(&self) -> Orchestrator<'_, T> {
        Orchestrator::new(&self.inner.transport, &self.cancel)
    }
}
