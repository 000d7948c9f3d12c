// Lookup lists: payment types, cargo companies, order statuses

use super::TsoftClient;
use crate::envelope::Envelope;
use crate::fallback::{Candidate, Plan};
use crate::model::{CargoCompany, OrderStatus, PaymentType};
use crate::request::Form;
use crate::transport::Transport;

const PAYMENT_TYPES: [&str; 3] = ["/order/getPaymentTypeList", "/payment/getTypes", "/paymenttype/get"];
const CARGO_COMPANIES: [&str; 3] = ["/order/getCargoCompanyList", "/cargo/getCompanies", "/cargocompany/get"];
const ORDER_STATUSES: [&str; 3] = ["/order/getOrderStatusList", "/orderstatus/get", "/order/statuses"];

fn lookup_plan(operation: &str, paths: [&str; 3]) -> Plan {
    Plan::new(operation).tier(
        "legacy",
        paths.map(|path| Candidate::form(path, Form::new())),
    )
}

impl<T: Transport> TsoftClient<T> {
    pub async fn payment_types(&self) -> Envelope<Vec<PaymentType>> {
        self.orchestrator()
            .run(&lookup_plan("payment type", PAYMENT_TYPES))
            .await
    }

    pub async fn cargo_companies(&self) -> Envelope<Vec<CargoCompany>> {
        self.orchestrator()
            .run(&lookup_plan("cargo company", CARGO_COMPANIES))
            .await
    }

    pub async fn order_statuses(&self) -> Envelope<Vec<OrderStatus>> {
        self.orchestrator()
            .run(&lookup_plan("order status", ORDER_STATUSES))
            .await
    }
}
