// Product images and image-enriched product listings

use std::collections::HashMap;

use futures_util::{StreamExt, stream};
use tracing::{debug, info};

use super::{ProductQuery, TsoftClient};
use crate::decode::decode;
use crate::envelope::Envelope;
use crate::fallback::Candidate;
use crate::model::category::{PATH_SEPARATOR, flatten};
use crate::model::{Product, ProductImage};
use crate::request::Form;
use crate::transport::Transport;

/// Only the first page's leading products get images attached.
const ENHANCED_IMAGE_WINDOW: usize = 20;

impl<T: Transport> TsoftClient<T> {
    /// Images of one product.
    ///
    /// Shops without the image endpoint answer with an error status; that
    /// is reported as a successful empty list.
    pub async fn product_images(&self, code: &str) -> Envelope<Vec<ProductImage>> {
        let candidate = Candidate::form(
            "/product/getProductImages",
            Form::new().field("ProductCode", code),
        );

        match self.orchestrator().attempt(&candidate).await {
            None => Envelope::failure("product images cancelled"),
            Some(raw) if raw.ok => decode(&raw.body),
            Some(raw) => {
                debug!(code, status = raw.status, "image endpoint unavailable");
                Envelope::ok(Vec::new())
            }
        }
    }

    /// Images for many products, at most `parallel` requests in flight.
    ///
    /// Products whose lookup failed are simply absent from the map.
    pub async fn bulk_product_images(
        &self,
        codes: &[String],
        parallel: usize,
    ) -> HashMap<String, Vec<ProductImage>> {
        let images: HashMap<_, _> = stream::iter(codes.iter().cloned())
            .map(|code| async move {
                let envelope = self.product_images(&code).await;
                (code, envelope)
            })
            .buffer_unordered(parallel.max(1))
            .filter_map(|(code, envelope)| async move {
                match envelope.data {
                    Some(images) if envelope.success => Some((code, images)),
                    _ => {
                        debug!(code = %code, "no images for product");
                        None
                    }
                }
            })
            .collect()
            .await;

        debug!(requested = codes.len(), found = images.len(), "bulk image lookup finished");
        images
    }

    /// A product page with category names and paths filled from the
    /// category tree, plus images for the leading products of page one.
    pub async fn enhanced_products(
        &self,
        limit: u32,
        page: u32,
        include_images: bool,
    ) -> Envelope<Vec<Product>> {
        let listing = self.list_products(&ProductQuery::page(limit, page)).await;
        let mut products = match listing.data {
            Some(products) if listing.success => products,
            _ => return listing,
        };

        let tree = self.category_tree().await;
        if let Some(tree) = tree.data.as_deref().filter(|_| tree.success) {
            let index = flatten(tree);
            for product in &mut products {
                let Some(category) = product
                    .default_category_code
                    .non_empty()
                    .and_then(|code| index.get(code))
                else {
                    continue;
                };
                product.category_name = category.category_name.clone();
                product.category_path = category
                    .path
                    .as_deref()
                    .map(|path| path.split(PATH_SEPARATOR).map(str::to_owned).collect())
                    .unwrap_or_default();
            }
        }

        if include_images && page == 1 && !products.is_empty() {
            let codes: Vec<String> = products
                .iter()
                .take(ENHANCED_IMAGE_WINDOW)
                .filter_map(|p| p.product_code.non_empty())
                .map(str::to_owned)
                .collect();
            let mut images = self
                .bulk_product_images(&codes, self.limits().image_concurrency)
                .await;

            for product in products.iter_mut().take(ENHANCED_IMAGE_WINDOW) {
                let Some(found) = product
                    .product_code
                    .non_empty()
                    .and_then(|code| images.remove(code))
                else {
                    continue;
                };
                attach_images(product, found);
            }
        }

        info!(count = products.len(), page, "enhanced product page ready");
        Envelope::ok(products)
    }
}

/// Attach images and promote the primary (or first) one to the product's
/// own image and thumbnail URLs.
fn attach_images(product: &mut Product, images: Vec<ProductImage>) {
    let Some(lead) = images
        .iter()
        .find(|image| image.is_primary_image())
        .or_else(|| images.first())
    else {
        return;
    };
    product.thumbnail_url = lead.thumb_url().map(str::to_owned).into();
    product.image_url = lead.full_url().map(str::to_owned).into();
    product.images = images;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::Limits;
    use crate::decode::Scalar;
    use crate::fallback::tests::Recorder;

    #[test]
    fn primary_image_wins_over_first() {
        let mut product = Product::default();
        let images = vec![
            ProductImage {
                image_url: Scalar::from("a.jpg"),
                ..ProductImage::default()
            },
            ProductImage {
                image: Scalar::from("b.jpg"),
                thumbnail: Scalar::from("b-thumb.jpg"),
                is_main: Scalar::from("True"),
                ..ProductImage::default()
            },
        ];

        attach_images(&mut product, images);

        assert_eq!(product.image_url.as_str(), "b.jpg");
        assert_eq!(product.thumbnail_url.as_str(), "b-thumb.jpg");
        assert_eq!(product.images.len(), 2);
    }

    #[test]
    fn first_image_is_used_without_a_primary() {
        let mut product = Product::default();
        attach_images(
            &mut product,
            vec![ProductImage {
                image_url: Scalar::from("a.jpg"),
                ..ProductImage::default()
            }],
        );
        assert_eq!(product.image_url.as_str(), "a.jpg");
        assert_eq!(product.thumbnail_url.as_str(), "a.jpg");
    }

    #[tokio::test]
    async fn missing_image_endpoint_is_an_empty_success() {
        let transport = Recorder::default().status("/product/getProductImages", 404);
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.product_images("P1").await;

        assert!(env.success);
        assert_eq!(env.data, Some(Vec::new()));
    }

    #[tokio::test]
    async fn enhanced_listing_fills_category_path() {
        let transport = Recorder::default()
            .reply(
                "/product/getProducts",
                r#"{"Success":true,"Data":[{"ProductCode":"P1","DefaultCategoryCode":"T2"}]}"#,
            )
            .reply(
                "/category/getCategoryTree",
                r#"{"Success":true,"Data":[
                    {"CategoryCode":"T1","CategoryName":"Clothing"},
                    {"CategoryCode":"T2","CategoryName":"Shirts","ParentCategoryCode":"T1"}
                ]}"#,
            );
        let client = TsoftClient::with_transport(transport, Limits::default());

        let env = client.enhanced_products(50, 2, true).await;

        let products = env.data.unwrap();
        assert_eq!(products[0].category_name.as_str(), "Shirts");
        assert_eq!(products[0].category_path, ["Clothing", "Shirts"]);
        assert!(
            !client
                .transport()
                .calls()
                .contains(&"/product/getProductImages".to_owned())
        );
    }
}
