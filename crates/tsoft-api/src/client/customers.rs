// Customer endpoints

use indexmap::IndexMap;

use super::TsoftClient;
use crate::envelope::Envelope;
use crate::fallback::{Candidate, Plan};
use crate::model::Customer;
use crate::request::Form;
use crate::transport::Transport;

const LIST_LEGACY: [&str; 3] = ["/customer/getCustomers", "/customer/get", "/customers/get"];
const LIST_JSON: [&str; 2] = ["/customers", "/api/v3/customers"];
const BY_ID_LEGACY: [&str; 3] = ["/customer/getCustomerById", "/customer/get", "/customers/get"];

impl<T: Transport> TsoftClient<T> {
    /// List customers. Filters go out verbatim on both API styles.
    pub async fn list_customers(
        &self,
        limit: u32,
        filters: &IndexMap<String, String>,
    ) -> Envelope<Vec<Customer>> {
        let form = Form::new().field("limit", limit).merge(filters);
        let query = form.to_query();

        let plan = Plan::new("customer")
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

    pub async fn customer_by_id(&self, id: i64) -> Envelope<Customer> {
        let form = Form::new()
            .field("CustomerId", id)
            .field("customerId", id)
            .field("Id", id);

        let plan = Plan::new("customer").tier(
            "legacy",
            BY_ID_LEGACY.map(|path| Candidate::form(path, form.clone())),
        );

        self.orchestrator().run(&plan).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::Limits;
    use crate::fallback::tests::Recorder;

    #[tokio::test]
    async fn customer_list_falls_through_to_json_api() {
        let transport = Recorder::default().reply(
            "/customers",
            r#"{"success":"1","data":[{"customerId":12,"email":"a@b.c"}]}"#,
        );
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.list_customers(10, &IndexMap::new()).await;

        let customers = env.data.unwrap();
        assert_eq!(customers[0].customer_id.as_str(), "12");
        assert_eq!(customers[0].email.as_str(), "a@b.c");
    }
}
