// Order endpoints and order-detail enrichment

use futures_util::{StreamExt, stream};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::TsoftClient;
use crate::envelope::Envelope;
use crate::fallback::{Candidate, Plan};
use crate::model::{Order, OrderDetail};
use crate::request::Form;
use crate::transport::Transport;

const LIST_LEGACY: [&str; 3] = ["/order/getOrders", "/order/get", "/orders/get"];
const LIST_JSON: [&str; 2] = ["/orders", "/api/v3/orders"];
const DETAILS_LEGACY: [&str; 5] = [
    "/order/getOrderDetailsByOrderId",
    "/order/getOrderDetails",
    "/order/details",
    "/orders/details",
    "/orderdetails/get",
];
const DETAILS_BY_CODE_LEGACY: [&str; 2] = ["/order/getOrderDetailsByOrderCode", "/order/getDetails"];

/// Paging filters for [`TsoftClient::list_orders`]. Shops disagree on
/// the paging parameter, so page, offset and start are all sent.
pub fn order_page_filters(page: u32, limit: u32) -> IndexMap<String, String> {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
    IndexMap::from([
        ("page".to_owned(), page.to_string()),
        ("offset".to_owned(), offset.to_string()),
        ("start".to_owned(), offset.to_string()),
    ])
}

/// How an enrichment pass went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    /// Nothing to enrich.
    NoOrders,
    /// The detail breaker was already open; no request was made.
    Disabled,
    /// The first order has no numeric id to probe with.
    NoProbe,
    /// The probe failed and opened the detail breaker.
    Unavailable,
    /// The probe worked but the first order has no lines.
    NoDetails,
    /// Details were fetched for the page.
    Enriched,
}

/// Result of [`TsoftClient::enrich_orders`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub outcome: EnrichmentOutcome,
    pub succeeded: usize,
    pub failed: usize,
}

impl EnrichmentReport {
    fn bare(outcome: EnrichmentOutcome) -> Self {
        Self {
            outcome,
            succeeded: 0,
            failed: 0,
        }
    }

    /// A user-facing warning when item counts and packing status could not
    /// be shown.
    pub fn warning(&self) -> Option<&'static str> {
        match self.outcome {
            EnrichmentOutcome::Disabled => {
                Some("Order details are unavailable (disabled after an earlier failure)")
            }
            EnrichmentOutcome::Unavailable => {
                Some("Order details API is not accessible; item counts and packing status are not shown")
            }
            EnrichmentOutcome::Enriched if self.succeeded == 0 && self.failed > 0 => {
                Some("Order details could not be loaded; the token may lack permission")
            }
            _ => None,
        }
    }
}

impl<T: Transport> TsoftClient<T> {
    /// List orders. Filters go out verbatim on both API styles; see
    /// [`order_page_filters`] for paging.
    pub async fn list_orders(
        &self,
        limit: u32,
        filters: &IndexMap<String, String>,
    ) -> Envelope<Vec<Order>> {
        let form = Form::new().field("limit", limit).merge(filters);
        let query = form.to_query();

        let plan = Plan::new("order")
            .tier(
                "legacy",
                LIST_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .tier(
                "json",
                LIST_JSON.map(|path| Candidate::query(path, query.clone())),
            );

        self.orchestrator().run(&plan).await
    }

    /// Order lines by numeric order id.
    pub async fn order_details_by_id(&self, order_id: i64) -> Envelope<Vec<OrderDetail>> {
        info!(order_id, "fetching order details");

        let form = Form::new()
            .field("OrderId", order_id)
            .field("orderId", order_id)
            .field("id", order_id);

        let plan = Plan::new("order detail")
            .tier(
                "order2",
                [
                    Candidate::form(format!("/order2/getOrderDetailsByOrderId/{order_id}"), Form::new()),
                    Candidate::form(format!("/order2/getOrderDetails/{order_id}"), Form::new()),
                    Candidate::form("/order2/getOrderDetailsByOrderId", form.clone()),
                    Candidate::form("/order2/getOrderDetails", form.clone()),
                ],
            )
            .tier(
                "legacy",
                DETAILS_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .tier(
                "json",
                [
                    format!("/orders/{order_id}/details"),
                    format!("/api/v3/orders/{order_id}/details"),
                    format!("/order/{order_id}/items"),
                ]
                .map(Candidate::get),
            )
            .not_found(format!("Order details not found for OrderId: {order_id}"))
            .critical();

        self.orchestrator().run(&plan).await
    }

    /// Order lines by order code.
    pub async fn order_details_by_code(&self, order_code: &str) -> Envelope<Vec<OrderDetail>> {
        info!(order_code, "fetching order details");

        let form = Form::new()
            .field("OrderCode", order_code)
            .field("orderCode", order_code)
            .field("code", order_code);

        let plan = Plan::new("order detail")
            .tier(
                "order2",
                [
                    Candidate::form(format!("/order2/getOrderDetailsByOrderCode/{order_code}"), Form::new()),
                    Candidate::form("/order2/getOrderDetailsByOrderCode", form.clone()),
                ],
            )
            .tier(
                "legacy",
                DETAILS_BY_CODE_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .not_found(format!("Order details not found for OrderCode: {order_code}"))
            .critical();

        self.orchestrator().run(&plan).await
    }

    /// [`order_details_by_id`](Self::order_details_by_id) behind the detail
    /// breaker. An open breaker answers without touching the network; a
    /// failed fetch opens it.
    pub async fn order_details_guarded(&self, order_id: i64) -> Envelope<Vec<OrderDetail>> {
        if self.detail_breaker().is_open() {
            debug!(order_id, "order details disabled by breaker");
            return Envelope::failure("Order details are disabled after an earlier failure");
        }

        let envelope = self.order_details_by_id(order_id).await;
        if !envelope.success && self.detail_breaker().trip() {
            warn!(order_id, "order details API not available, disabling further attempts");
        }
        envelope
    }

    /// Fill order lines, item count, city and supply status in place.
    ///
    /// The first order is probed through the breaker. Only when the probe
    /// returns lines are the remaining orders fetched, at most
    /// `detail_concurrency` at a time.
    pub async fn enrich_orders(&self, orders: &mut [Order]) -> EnrichmentReport {
        let Some(first) = orders.first() else {
            return EnrichmentReport::bare(EnrichmentOutcome::NoOrders);
        };

        if self.detail_breaker().is_open() {
            info!("order details API is disabled (previous check failed)");
            return EnrichmentReport::bare(EnrichmentOutcome::Disabled);
        }

        let Some(probe_id) = first.numeric_id() else {
            debug!(order_id = %first.order_id, "first order has no numeric id, skipping details");
            return EnrichmentReport::bare(EnrichmentOutcome::NoProbe);
        };

        let probe = self.order_details_guarded(probe_id).await;
        if !probe.success {
            return EnrichmentReport::bare(EnrichmentOutcome::Unavailable);
        }
        let Some(lines) = probe.data.filter(|lines| !lines.is_empty()) else {
            info!(order_id = probe_id, "first order has no details");
            return EnrichmentReport::bare(EnrichmentOutcome::NoDetails);
        };

        let mut report = EnrichmentReport::bare(EnrichmentOutcome::Enriched);
        if let Some(order) = orders.first_mut() {
            order.apply_details(lines);
            report.succeeded += 1;
        }

        let pending: Vec<(usize, i64)> = orders
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, order)| order.numeric_id().map(|id| (index, id)))
            .collect();

        let results: Vec<(usize, Envelope<Vec<OrderDetail>>)> = stream::iter(pending)
            .map(|(index, id)| async move { (index, self.order_details_by_id(id).await) })
            .buffer_unordered(self.limits().detail_concurrency.max(1))
            .collect()
            .await;

        for (index, envelope) in results {
            match (envelope.success, envelope.data, orders.get_mut(index)) {
                (true, Some(lines), Some(order)) => {
                    order.apply_details(lines);
                    report.succeeded += 1;
                }
                _ => report.failed += 1,
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "order details fetched"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::Limits;
    use crate::decode::Scalar;
    use crate::fallback::tests::Recorder;

    fn order(id: &str) -> Order {
        Order {
            order_id: Scalar::from(id),
            ..Order::default()
        }
    }

    #[test]
    fn page_filters_send_every_spelling() {
        let filters = order_page_filters(3, 25);
        assert_eq!(filters["page"], "3");
        assert_eq!(filters["offset"], "50");
        assert_eq!(filters["start"], "50");
    }

    #[tokio::test]
    async fn breaker_blocks_other_orders_until_reset() {
        let client = TsoftClient::with_transport(Recorder::default(), Limits::default());

        let first = client.order_details_guarded(1).await;
        assert!(!first.success);
        assert!(client.detail_breaker().is_open());
        let after_first = client.transport().calls().len();
        assert_eq!(after_first, 12);

        let second = client.order_details_guarded(2).await;
        assert!(!second.success);
        assert_eq!(client.transport().calls().len(), after_first);

        client.reset_detail_breaker();
        let _ = client.order_details_guarded(2).await;
        assert!(client.transport().calls().len() > after_first);
    }

    #[tokio::test]
    async fn empty_detail_lists_still_trip_the_breaker() {
        let transport = Recorder::default().reply(
            "/order2/getOrderDetailsByOrderId/1",
            r#"{"Success":true,"Data":[]}"#,
        );
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.order_details_guarded(1).await;

        assert!(!env.success);
        assert_eq!(env.data, None);
        assert_eq!(client.transport().calls().len(), 12);
        assert!(client.detail_breaker().is_open());
    }

    #[tokio::test]
    async fn details_prefer_order2_tier() {
        let transport = Recorder::default().reply(
            "/order2/getOrderDetails/7",
            r#"{"Success":true,"Data":[{"ProductCode":"P1","Quantity":2}]}"#,
        );
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.order_details_by_id(7).await;

        assert!(env.success);
        assert_eq!(
            client.transport().calls(),
            ["/order2/getOrderDetailsByOrderId/7", "/order2/getOrderDetails/7"]
        );
        assert_eq!(env.data.unwrap()[0].quantity.as_str(), "2");
    }

    #[tokio::test]
    async fn enrichment_fills_every_order_after_a_good_probe() {
        let line = r#"{"Success":true,"Data":[{"DeliveryCity":"Izmir","SupplyStatus":"Packed"}]}"#;
        let transport = Recorder::default()
            .reply("/order2/getOrderDetailsByOrderId/1", line)
            .reply("/order2/getOrderDetailsByOrderId/2", line)
            .reply("/order2/getOrderDetailsByOrderId/3", line);
        let client = TsoftClient::with_transport(transport, Limits::default());
        let mut orders = vec![order("1"), order("2"), order("3"), order("x")];

        let report = client.enrich_orders(&mut orders).await;

        assert_eq!(report.outcome, EnrichmentOutcome::Enriched);
        assert_eq!((report.succeeded, report.failed), (3, 0));
        assert!(orders[..3].iter().all(|o| o.item_count == 1 && o.city.as_str() == "Izmir"));
        assert_eq!(orders[3].item_count, 0);
        assert_eq!(report.warning(), None);
    }

    #[tokio::test]
    async fn failed_probe_disables_later_passes() {
        let client = TsoftClient::with_transport(Recorder::default(), Limits::default());
        let mut orders = vec![order("1"), order("2")];

        let report = client.enrich_orders(&mut orders).await;
        assert_eq!(report.outcome, EnrichmentOutcome::Unavailable);
        assert!(report.warning().is_some());

        let calls = client.transport().calls().len();
        let again = client.enrich_orders(&mut orders).await;
        assert_eq!(again.outcome, EnrichmentOutcome::Disabled);
        assert_eq!(client.transport().calls().len(), calls);
    }
}
