// tsoft-api: Tolerant async client for T-Soft shop APIs (legacy form API + JSON API)
//
// The upstream's endpoint paths, payload shapes and field types vary
// between deployments. Every operation walks an ordered list of candidate
// endpoints, decodes whatever comes back as leniently as possible and
// reports the outcome in an `Envelope` instead of an error.

pub mod auth;
pub mod breaker;
pub mod client;
pub mod config;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod legacy;
pub mod model;
pub mod modern;
pub mod request;
pub mod transport;
pub mod variants;

pub use auth::{AuthStrategy, Credentials};
pub use breaker::DetailBreaker;
pub use client::{
    BulkFailure, BulkOutcome, EnrichmentOutcome, EnrichmentReport, Limits, ProductQuery, TsoftClient,
    order_page_filters,
};
pub use config::ClientConfig;
pub use decode::{Payload, Scalar, decode};
pub use envelope::Envelope;
pub use error::Error;
pub use fallback::{Acceptance, Candidate, Orchestrator, Plan, Tier};
pub use legacy::LegacyClient;
pub use model::{
    CargoCompany, Category, Customer, NewProduct, Order, OrderDetail, OrderStatus, PaymentType, Product,
    ProductImage, ProductVariant, Reference,
};
pub use modern::ModernClient;
pub use request::{Form, Query, Request};
pub use transport::{HttpTransport, RawResponse, TlsMode, Transport, TransportConfig};
