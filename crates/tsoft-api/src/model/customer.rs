// Customer entity.

use serde::{Deserialize, Serialize};

use crate::decode::{Scalar, entity_payload};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Customer {
    pub customer_id: Scalar,
    pub customer_code: Scalar,
    pub customer_name: Scalar,
    pub email: Scalar,
    pub phone: Scalar,
    pub is_active: Scalar,
    pub created_date: Scalar,
    pub date_created: Scalar,
    pub update_date: Scalar,
    pub update_date_time_stamp: Scalar,
    pub last_modified: Scalar,
    pub customer_group_id: Scalar,
    pub customer_group: Scalar,
    pub city: Scalar,
    pub country: Scalar,
    pub address: Scalar,
}

entity_payload!(Customer);
