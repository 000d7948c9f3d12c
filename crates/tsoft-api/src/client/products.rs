// Product endpoints

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::TsoftClient;
use crate::envelope::Envelope;
use crate::fallback::{Acceptance, Candidate, Plan};
use crate::model::{NewProduct, Product};
use crate::request::Form;
use crate::transport::Transport;

const LIST_LEGACY: [&str; 3] = ["/product/getProducts", "/product/get", "/products/get"];
const LIST_JSON: [&str; 2] = ["/catalog/products", "/api/v3/catalog/products"];
const BY_CODE_LEGACY: [&str; 3] = ["/product/getProduct", "/product/getProductByCode", "/product/get"];
const VARIANTS_LEGACY: [&str; 4] = [
    "/product/get",
    "/product/getProduct",
    "/product/getProductDetail",
    "/product/detail",
];
const CREATE_LEGACY: [&str; 3] = ["/product/addProduct", "/product/add", "/products/create"];
const CREATE_JSON: [&str; 3] = ["/catalog/products", "/api/v3/catalog/products", "/products"];
const VARIANT_STOCK_LEGACY: [&str; 3] = [
    "/product/updateVariantStock",
    "/product/updateStock",
    "/stock/update",
];

/// Columns requested alongside variant flags on the legacy API.
const VARIANT_COLUMNS: &str = "ProductId,ProductName,Name,ProductCode,Barcode,Stock,ModelCode";

/// Product listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub limit: u32,
    pub page: u32,
    pub search: Option<String>,
    /// Extra upstream filters, passed through verbatim.
    pub filters: IndexMap<String, String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            page: 1,
            search: None,
            filters: IndexMap::new(),
        }
    }
}

impl ProductQuery {
    pub fn page(limit: u32, page: u32) -> Self {
        Self {
            limit,
            page,
            ..Self::default()
        }
    }
}

/// Outcome of bulk product creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub created: Vec<Product>,
    pub failures: Vec<BulkFailure>,
}

/// A product that could not be created, with the upstream's reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub code: String,
    pub messages: Vec<String>,
}

impl<T: Transport> TsoftClient<T> {
    /// List products, legacy endpoints first.
    pub async fn list_products(&self, query: &ProductQuery) -> Envelope<Vec<Product>> {
        let form = Form::new().field("limit", query.limit).merge(&query.filters);

        let mut params = vec![
            ("page".to_owned(), query.page.to_string()),
            ("limit".to_owned(), query.limit.to_string()),
        ];
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search".to_owned(), search.to_owned()));
        }
        params.extend(query.filters.iter().map(|(k, v)| (k.clone(), v.clone())));

        let plan = Plan::new("product")
            .tier(
                "legacy",
                LIST_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .tier(
                "json",
                LIST_JSON.map(|path| Candidate::query(path, params.clone())),
            );

        self.orchestrator().run(&plan).await
    }

    /// Fetch one product by code.
    pub async fn product_by_code(&self, code: &str) -> Envelope<Product> {
        let form = Form::new()
            .field("ProductCode", code)
            .field("productCode", code)
            .field("ProductId", code)
            .field("productId", code);

        let plan = Plan::new("product")
            .tier(
                "legacy",
                BY_CODE_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .tier(
                "json",
                [
                    Candidate::get(format!("/catalog/products/{code}")),
                    Candidate::get(format!("/products/{code}")),
                ],
            )
            .not_found(format!("Product not found: {code}"));

        self.orchestrator().run(&plan).await
    }

    /// Fetch a product with its variant lists populated.
    ///
    /// Some shops key products by the numeric part of the code, so the
    /// legacy tier is tried with the code as given and again without its
    /// leading `T`.
    pub async fn product_with_variants(&self, code: &str) -> Envelope<Product> {
        info!(code, "fetching product with variants");

        let numeric = code.trim_start_matches(['T', 't']);
        let mut codes = vec![code];
        if !numeric.is_empty() && numeric != code {
            codes.push(numeric);
        }

        let mut plan = Plan::new("product");
        for attempt in codes {
            let form = variant_form(code, attempt);
            plan = plan.tier(
                "legacy",
                VARIANTS_LEGACY.map(|path| Candidate::form(path, form.clone())),
            );
        }

        let params: Vec<(String, String)> = [
            ("includeVariants", "1"),
            ("includeSubProducts", "1"),
            ("expand", "variants,subProducts"),
            ("FetchSubProducts", "1"),
            ("WithVariants", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let plan = plan
            .tier(
                "json",
                [
                    format!("/catalog/products/{code}"),
                    format!("/api/v3/catalog/products/{code}"),
                    format!("/products/{code}"),
                ]
                .map(|path| Candidate::query(path, params.clone())),
            )
            .not_found(format!("Product not found: {code}"));

        let envelope = self.orchestrator().run::<Product>(&plan).await;
        if let Some(product) = envelope.data.as_ref() {
            info!(code, variants = product.variants().len(), "product variants loaded");
        }
        envelope
    }

    /// Create a product. The first endpoint that answers decides the
    /// outcome; a create is never sent twice.
    pub async fn create_product(&self, input: &NewProduct) -> Envelope<Product> {
        let mut form = Form::new().merge(&input.extra);
        form.set("ProductCode", &input.code);
        form.set("ProductName", &input.name);
        form.set("CategoryCode", &input.category_code);
        form.set("Price", input.price);
        form.set("Stock", input.stock);

        let body = json!({
            "name": input.name,
            "wsProductCode": input.code,
            "priceSale": input.price,
            "stock": input.stock,
            "vat": input.vat(),
            "visibility": true,
            "relation_hierarchy": [{ "id": input.category_id(), "type": "category" }],
        });

        let plan = Plan::new("add product")
            .tier(
                "legacy",
                CREATE_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .tier(
                "json",
                CREATE_JSON.map(|path| Candidate::json(path, body.clone())),
            )
            .accept(Acceptance::FirstResponse);

        self.orchestrator().run(&plan).await
    }

    /// Create products one after another and tally the results.
    pub async fn create_products(&self, inputs: &[NewProduct]) -> Envelope<BulkOutcome> {
        let mut outcome = BulkOutcome::default();

        for input in inputs {
            let result = self.create_product(input).await;
            if result.success {
                outcome.succeeded += 1;
                outcome.created.extend(result.data);
            } else {
                outcome.failed += 1;
                outcome.failures.push(BulkFailure {
                    code: input.code.clone(),
                    messages: result.messages,
                });
            }
        }

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "bulk product creation finished"
        );

        Envelope {
            success: outcome.failed == 0,
            data: Some(outcome),
            messages: Vec::new(),
        }
    }

    /// Update a product's name, price or stock; empty fields are not sent.
    pub async fn update_product(&self, product: &Product) -> Envelope<Product> {
        let mut form = Form::new()
            .field("ProductCode", product.product_code.as_str())
            .field("ProductId", product.product_id.as_str());
        for (key, value) in [
            ("ProductName", &product.product_name),
            ("Price", &product.price),
            ("Stock", &product.stock),
        ] {
            if let Some(value) = value.non_empty() {
                form.set(key, value);
            }
        }

        let plan = Plan::new("update product")
            .tier("legacy", [Candidate::form("/product/updateProduct", form)])
            .not_found("Update product failed")
            .accept(Acceptance::FirstResponse);

        self.orchestrator().run(&plan).await
    }

    pub async fn delete_product(&self, code: &str) -> Envelope<()> {
        let plan = Plan::new("delete product")
            .tier(
                "legacy",
                [Candidate::form(
                    "/product/deleteProduct",
                    Form::new().field("ProductCode", code),
                )],
            )
            .accept(Acceptance::TransportOk);

        self.orchestrator().run_void(&plan).await
    }

    pub async fn update_stock(&self, code: &str, stock: i64) -> Envelope<()> {
        let plan = Plan::new("stock update")
            .tier(
                "legacy",
                [Candidate::form(
                    "/product/updateStock",
                    Form::new().field("ProductCode", code).field("Stock", stock),
                )],
            )
            .accept(Acceptance::TransportOk);

        self.orchestrator().run_void(&plan).await
    }

    pub async fn update_variant_stock(&self, code: &str, variant_code: &str, stock: i64) -> Envelope<()> {
        info!(code, variant_code, stock, "updating variant stock");

        let form = Form::new()
            .field("productCode", code)
            .field("variantCode", variant_code)
            .field("stock", stock)
            .field("stockQuantity", stock);

        let plan = Plan::new("variant stock")
            .tier(
                "legacy",
                VARIANT_STOCK_LEGACY.map(|path| Candidate::form(path, form.clone())),
            )
            .not_found("Failed to update variant stock")
            .accept(Acceptance::TransportOk);

        self.orchestrator().run_void(&plan).await
    }
}

/// Legacy form asking for a product with every variant flag the upstream
/// has been seen to honour.
fn variant_form(code: &str, attempt: &str) -> Form {
    Form::new()
        .field("ProductId", attempt)
        .field("productId", attempt)
        .field("ProductCode", code)
        .field("productCode", code)
        .field("code", attempt)
        .field("Id", attempt)
        .field("FetchDetails", "1")
        .field("FetchSubProducts", "1")
        .field("WithSubProducts", "1")
        .field("WithVariants", "1")
        .field("IncludeSubProducts", "1")
        .field("includeVariants", "1")
        .field("includeSubProducts", "1")
        .field("withVariants", "true")
        .field("fetchDetails", "true")
        .field("columns", VARIANT_COLUMNS)
        .field("start", "0")
        .field("length", "1")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::Limits;
    use crate::fallback::tests::Recorder;

    #[tokio::test]
    async fn variants_retry_legacy_without_prefix_before_json() {
        let transport = Recorder::default();
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.product_with_variants("T2429").await;

        assert!(!env.success);
        assert_eq!(
            env.messages,
            ["All product endpoints failed", "Product not found: T2429"]
        );
        assert_eq!(
            client.transport().calls(),
            [
                "/product/get",
                "/product/getProduct",
                "/product/getProductDetail",
                "/product/detail",
                "/product/get",
                "/product/getProduct",
                "/product/getProductDetail",
                "/product/detail",
                "/catalog/products/T2429",
                "/api/v3/catalog/products/T2429",
                "/products/T2429",
            ]
        );
    }

    #[tokio::test]
    async fn missing_product_is_a_failure_not_a_blank_product() {
        let transport = Recorder::default()
            .reply("/product/getProduct", r#"{"success":false,"message":"Product not found"}"#)
            .reply("/product/getProductByCode", r#"{"Success":true,"Data":{}}"#);
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.product_by_code("NOPE").await;

        assert!(!env.success);
        assert_eq!(env.data, None);
        assert_eq!(
            env.messages,
            ["All product endpoints failed", "Product not found: NOPE"]
        );
        assert_eq!(client.transport().calls().len(), 5);
    }

    #[test]
    fn variant_form_keeps_original_code() {
        let form = variant_form("T2429", "2429");
        assert_eq!(form.get("ProductId"), Some("2429"));
        assert_eq!(form.get("ProductCode"), Some("T2429"));
        assert_eq!(form.get("length"), Some("1"));
    }

    #[tokio::test]
    async fn bulk_creation_tallies_failures() {
        let transport = Recorder::default()
            .reply("/product/addProduct", r#"{"Success":true,"Data":{"ProductCode":"P1"}}"#);
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client
            .create_products(&[NewProduct::new("P1", "Shirt", "T1", 10.0)])
            .await;

        let outcome = env.data.unwrap();
        assert!(env.success);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.created[0].product_code.as_str(), "P1");
    }
}
