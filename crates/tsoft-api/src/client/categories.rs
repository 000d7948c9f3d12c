// Category endpoints

use tracing::{debug, warn};

use super::TsoftClient;
use crate::decode::decode;
use crate::envelope::Envelope;
use crate::fallback::{Candidate, Plan};
use crate::model::Category;
use crate::model::category::{assign_paths, build_tree, is_flat};
use crate::request::Form;
use crate::transport::Transport;

const LIST_LEGACY: [&str; 3] = ["/category/getCategories", "/category/get", "/categories/get"];
const LIST_JSON: [&str; 3] = ["/catalog/categories", "/api/v3/catalog/categories", "/categories"];
const TREE_LEGACY: &str = "/category/getCategoryTree";

impl<T: Transport> TsoftClient<T> {
    /// Categories as the upstream lists them, usually flat.
    pub async fn list_categories(&self) -> Envelope<Vec<Category>> {
        let plan = Plan::new("category")
            .tier(
                "legacy",
                LIST_LEGACY.map(|path| Candidate::form(path, Form::new())),
            )
            .tier("json", LIST_JSON.map(Candidate::get));

        self.orchestrator().run(&plan).await
    }

    /// The category tree with `"A > B > C"` paths assigned.
    ///
    /// The tree endpoint's answer is used as soon as it is reachable; a
    /// flat answer is rebuilt into a tree. When the endpoint is missing the
    /// flat category list is fetched and rebuilt instead.
    pub async fn category_tree(&self) -> Envelope<Vec<Category>> {
        let candidate = Candidate::form(TREE_LEGACY, Form::new());

        match self.orchestrator().attempt(&candidate).await {
            None => return Envelope::failure("category tree cancelled"),
            Some(raw) if raw.ok => {
                return decode::<Vec<Category>>(&raw.body).map(into_tree);
            }
            Some(raw) => debug!(status = raw.status, "tree endpoint unavailable, rebuilding from list"),
        }

        let flat = self.list_categories().await;
        match flat.data {
            Some(categories) if flat.success => Envelope::ok(into_tree(categories)),
            _ => {
                warn!(messages = %flat.message_text(), "category tree unavailable");
                Envelope::failure("Category tree failed")
            }
        }
    }
}

fn into_tree(categories: Vec<Category>) -> Vec<Category> {
    let mut tree = if is_flat(&categories) {
        build_tree(categories)
    } else {
        categories
    };
    assign_paths(&mut tree);
    tree
}
