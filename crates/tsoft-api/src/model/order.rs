// Order and order-line entities.

use serde::{Deserialize, Serialize};

use crate::decode::{Scalar, entity_payload, lenient_list};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Order {
    pub id: Scalar,
    pub order_id: Scalar,
    pub order_code: Scalar,
    pub status: Scalar,
    pub order_status: Scalar,
    pub order_status_id: Scalar,
    pub supply_status: Scalar,

    // ── Customer ──
    pub customer_id: Scalar,
    pub customer_code: Scalar,
    pub customer_name: Scalar,
    pub customer_username: Scalar,
    pub customer_email: Scalar,
    pub customer_phone: Scalar,
    pub customer_group_id: Scalar,

    // ── Dates ──
    pub order_date: Scalar,
    pub order_date_time_stamp: Scalar,
    pub created_date: Scalar,
    pub date_created: Scalar,
    pub update_date: Scalar,
    pub update_date_time_stamp: Scalar,
    pub approval_time: Scalar,

    // ── Addresses ──
    pub city: Scalar,
    pub shipping_city: Scalar,
    pub shipping_address: Scalar,
    pub billing_city: Scalar,

    // ── Totals ──
    pub total: Scalar,
    pub total_amount: Scalar,
    pub order_total_price: Scalar,
    pub order_subtotal: Scalar,
    pub general_total: Scalar,
    pub sub_total: Scalar,
    pub discount_total: Scalar,
    pub tax_total: Scalar,
    pub shipping_total: Scalar,
    pub currency: Scalar,
    pub site_default_currency: Scalar,

    // ── Payment ──
    pub payment_type_id: Scalar,
    pub payment_type: Scalar,
    pub payment_type_name: Scalar,
    pub sub_payment_type_id: Scalar,
    pub payment_sub_method: Scalar,
    pub payment_bank_name: Scalar,
    pub bank: Scalar,
    pub payment_info: Scalar,

    // ── Shipping ──
    pub cargo_id: Scalar,
    pub cargo_code: Scalar,
    pub cargo: Scalar,
    pub cargo_company_id: Scalar,
    pub cargo_company_name: Scalar,
    pub shipping_company_name: Scalar,
    pub cargo_tracking_code: Scalar,
    pub cargo_payment_method: Scalar,
    pub cargo_charge_with_vat: Scalar,
    pub cargo_charge_without_vat: Scalar,

    // ── Misc ──
    pub application: Scalar,
    pub language: Scalar,
    pub exchange_rate: Scalar,
    pub installment: Scalar,
    pub is_transferred: Scalar,
    pub non_member_shopping: Scalar,
    pub waybill_number: Scalar,
    pub invoice_number: Scalar,

    /// Number of order lines, filled by enrichment.
    #[serde(skip_deserializing)]
    pub item_count: usize,
    #[serde(deserialize_with = "lenient_list")]
    pub order_details: Vec<OrderDetail>,
    #[serde(deserialize_with = "lenient_list")]
    pub items: Vec<OrderDetail>,
}

impl Order {
    /// Numeric order id used by the detail endpoints.
    pub fn numeric_id(&self) -> Option<i64> {
        self.order_id.as_i64()
    }

    /// Order lines: first non-empty of `OrderDetails`, `Items`.
    pub fn lines(&self) -> &[OrderDetail] {
        if self.order_details.is_empty() {
            &self.items
        } else {
            &self.order_details
        }
    }

    /// Best available total for display.
    pub fn display_total(&self) -> &str {
        [
            &self.order_total_price,
            &self.total_amount,
            &self.total,
            &self.general_total,
        ]
        .into_iter()
        .find_map(Scalar::non_empty)
        .unwrap_or_default()
    }

    /// Merge fetched detail lines into the order.
    ///
    /// Lines and item count are always replaced. City fields are filled
    /// from the first line only when both are empty on the order, and
    /// supply status only when it is empty.
    pub fn apply_details(&mut self, details: Vec<OrderDetail>) {
        self.item_count = details.len();

        if let Some(first) = details.first() {
            if !self.city.is_present() && !self.shipping_city.is_present() {
                self.city = [&first.delivery_city, &first.invoice_city, &first.city]
                    .into_iter()
                    .find(|city| city.as_deref().is_some())
                    .cloned()
                    .unwrap_or_default();
                self.shipping_city = first.delivery_city.clone();
            }
            if !self.supply_status.is_present() {
                self.supply_status = first.supply_status.clone();
            }
        }

        self.order_details = details;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OrderDetail {
    pub id: Scalar,
    pub order_id: Scalar,
    pub product_id: Scalar,
    pub product_code: Scalar,
    pub product_name: Scalar,
    pub quantity: Scalar,
    pub price: Scalar,
    pub total: Scalar,
    pub city: Scalar,
    pub shipping_city: Scalar,
    pub delivery_city: Scalar,
    pub invoice_city: Scalar,
    pub supply_status: Scalar,
}

entity_payload!(Order, OrderDetail);
