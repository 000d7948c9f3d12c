// Small lookup lists: order statuses, payment types, cargo companies.
//
// All three come back with either the short (`Id`, `Name`) or the
// qualified (`OrderStatusId`, `OrderStatusName`) spelling.

use serde::{Deserialize, Serialize};

use crate::decode::{Scalar, entity_payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OrderStatus {
    pub id: Scalar,
    pub order_status_id: Scalar,
    pub name: Scalar,
    pub order_status_name: Scalar,
    pub code: Scalar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PaymentType {
    pub id: Scalar,
    pub payment_type_id: Scalar,
    pub name: Scalar,
    pub payment_type_name: Scalar,
    pub code: Scalar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CargoCompany {
    pub id: Scalar,
    pub cargo_company_id: Scalar,
    pub name: Scalar,
    pub cargo_company_name: Scalar,
    pub code: Scalar,
}

entity_payload!(OrderStatus, PaymentType, CargoCompany);

/// Uniform id/name view over the lookup types.
pub trait Reference {
    fn reference_id(&self) -> &str;
    fn reference_name(&self) -> &str;
    fn reference_code(&self) -> &str;
}

fn first<'a>(a: &'a Scalar, b: &'a Scalar) -> &'a str {
    a.non_empty().or_else(|| b.non_empty()).unwrap_or_default()
}

macro_rules! reference {
    ($ty:ty, $id:ident, $name:ident) => {
        impl Reference for $ty {
            fn reference_id(&self) -> &str {
                first(&self.id, &self.$id)
            }

            fn reference_name(&self) -> &str {
                first(&self.name, &self.$name)
            }

            fn reference_code(&self) -> &str {
                self.code.as_str()
            }
        }
    };
}

reference!(OrderStatus, order_status_id, order_status_name);
reference!(PaymentType, payment_type_id, payment_type_name);
reference!(CargoCompany, cargo_company_id, cargo_company_name);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn qualified_spelling_fills_the_gap() {
        let status: OrderStatus =
            serde_json::from_value(json!({ "OrderStatusId": 3, "Name": "Shipped" })).unwrap();
        assert_eq!(status.reference_id(), "3");
        assert_eq!(status.reference_name(), "Shipped");
        assert_eq!(status.reference_code(), "");
    }
}
