// Catalog entities: products, their variants and images.
//
// Every scalar is a `Scalar`; the upstream mixes strings, numbers and
// booleans for the same attribute.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::decode::{Scalar, entity_payload, lenient_list, lenient_text_list};
use crate::variants;

/// A catalog product as returned by either API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Product {
    // ── Identity ──
    pub product_id: Scalar,
    pub product_code: Scalar,
    pub product_name: Scalar,
    pub default_category_code: Scalar,
    pub default_category_id: Scalar,
    pub default_category_name: Scalar,
    pub default_category_path: Scalar,

    // ── Stock ──
    pub stock: Scalar,
    pub stock_unit: Scalar,
    pub stock_unit_id: Scalar,
    pub stock_code: Scalar,

    // ── Flags ──
    pub is_active: Scalar,
    pub is_approved: Scalar,
    pub comparison_sites: Scalar,
    pub has_sub_products: Scalar,
    pub has_images: Scalar,
    pub display_on_homepage: Scalar,
    pub is_new_product: Scalar,
    pub on_sale: Scalar,
    pub is_display_product: Scalar,
    pub vendor_display_only: Scalar,
    pub display_with_vat: Scalar,
    pub customer_group_display: Scalar,

    // ── Pricing ──
    pub price: Scalar,
    pub buying_price: Scalar,
    pub selling_price: Scalar,
    pub selling_price_vat_included: Scalar,
    pub selling_price_vat_included_no_discount: Scalar,
    pub discounted_selling_price: Scalar,
    pub vat: Scalar,
    pub currency_id: Scalar,
    pub currency: Scalar,

    // ── Brand / supplier ──
    pub brand: Scalar,
    pub brand_id: Scalar,
    pub brand_link: Scalar,
    pub model: Scalar,
    pub model_id: Scalar,
    pub supplier_id: Scalar,
    pub supplier_product_code: Scalar,

    // ── Content ──
    pub barcode: Scalar,
    pub description: Scalar,
    pub short_description: Scalar,
    pub search_keywords: Scalar,
    pub seo_link: Scalar,
    pub additional1: Scalar,
    pub additional2: Scalar,
    pub additional3: Scalar,

    // ── Images ──
    pub image_url: Scalar,
    pub thumbnail_url: Scalar,
    pub image: Scalar,
    #[serde(deserialize_with = "lenient_list")]
    pub images: Vec<ProductImage>,

    // ── Category enrichment ──
    pub category_name: Scalar,
    #[serde(deserialize_with = "lenient_text_list")]
    pub category_path: Vec<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub categories: Vec<String>,

    // ── Timestamps ──
    pub update_date: Scalar,
    pub update_date_time_stamp: Scalar,
    pub created_date: Scalar,
    pub date_created: Scalar,
    pub last_modified: Scalar,

    // ── Variants ──
    #[serde(deserialize_with = "lenient_list")]
    pub sub_products: Vec<ProductVariant>,
    #[serde(deserialize_with = "lenient_list")]
    pub sub_product_list: Vec<ProductVariant>,
    #[serde(deserialize_with = "lenient_list")]
    pub products: Vec<ProductVariant>,
}

impl Product {
    /// The variant list: first non-empty of `SubProducts`,
    /// `SubProductList`, `Products`. Lists are never merged.
    pub fn variants(&self) -> &[ProductVariant] {
        [&self.sub_products, &self.sub_product_list, &self.products]
            .into_iter()
            .find(|list| !list.is_empty())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_variants(&self) -> bool {
        !self.variants().is_empty()
    }

    /// Variants grouped by color, in first-seen order.
    pub fn variants_by_color(&self) -> IndexMap<String, Vec<&ProductVariant>> {
        variants::variants_by_color(self)
    }

    /// Variants grouped by size, in first-seen order.
    pub fn variants_by_size(&self) -> IndexMap<String, Vec<&ProductVariant>> {
        variants::variants_by_size(self)
    }
}

/// A sellable color/size combination of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProductVariant {
    pub product_code: Scalar,
    pub product_id: Scalar,
    pub sub_product_id: Scalar,
    pub variant_id: Scalar,
    pub variant_code: Scalar,
    pub product_name: Scalar,
    pub variant_name: Scalar,
    pub sub_id: Scalar,
    pub id: Scalar,

    // Color spellings.
    pub color: Scalar,
    pub colour: Scalar,
    pub color_code: Scalar,
    pub color_name: Scalar,
    pub renk: Scalar,
    pub property1: Scalar,
    pub property_value1: Scalar,
    pub variant1: Scalar,
    pub attribute1: Scalar,
    pub option1: Scalar,
    pub nitelik1: Scalar,

    // Size spellings.
    pub size: Scalar,
    pub size_code: Scalar,
    pub size_name: Scalar,
    pub beden: Scalar,
    pub property2: Scalar,
    pub property_value2: Scalar,
    pub variant2: Scalar,
    pub attribute2: Scalar,
    pub option2: Scalar,
    pub nitelik2: Scalar,

    pub stock: Scalar,
    pub stock_quantity: Scalar,
    pub available_stock: Scalar,

    pub price: Scalar,
    pub selling_price: Scalar,
    pub buying_price: Scalar,

    pub is_active: Scalar,
    pub is_available: Scalar,

    pub barcode: Scalar,
    pub sku: Scalar,
    pub model_code: Scalar,

    pub image: Scalar,
    pub image_url: Scalar,
    pub thumbnail: Scalar,
    pub thumbnail_url: Scalar,
}

impl ProductVariant {
    /// Color by field-name probing; empty when no spelling is populated.
    pub fn color(&self) -> &str {
        variants::color_of(self)
    }

    /// Size by field-name probing; empty when no spelling is populated.
    pub fn size(&self) -> &str {
        variants::size_of(self)
    }

    /// First present of Stock, StockQuantity, AvailableStock as an
    /// integer; 0 when absent or unparseable.
    pub fn stock_quantity(&self) -> i64 {
        [&self.stock, &self.stock_quantity, &self.available_stock]
            .into_iter()
            .find_map(Scalar::as_deref)
            .and_then(|text| text.trim().parse().ok())
            .unwrap_or(0)
    }

    /// First present of SellingPrice, Price as a decimal; 0 otherwise.
    pub fn price(&self) -> f64 {
        [&self.selling_price, &self.price]
            .into_iter()
            .find_map(Scalar::as_deref)
            .and_then(|text| Scalar::from(text).as_f64())
            .unwrap_or(0.0)
    }

    /// Both flags empty means active; otherwise the first present flag
    /// must read as an affirmative.
    pub fn is_active(&self) -> bool {
        if !self.is_active.is_present() && !self.is_available.is_present() {
            return true;
        }
        let flag = [&self.is_active, &self.is_available]
            .into_iter()
            .find_map(Scalar::as_deref)
            .unwrap_or_default();
        matches!(
            flag.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "active"
        )
    }

    /// `"color - size"`, or whichever is known, or the first present name
    /// or code.
    pub fn display_name(&self) -> String {
        match (self.color(), self.size()) {
            (color, size) if !color.is_empty() && !size.is_empty() => format!("{color} - {size}"),
            (color, _) if !color.is_empty() => color.to_owned(),
            (_, size) if !size.is_empty() => size.to_owned(),
            _ => [
                &self.variant_name,
                &self.product_name,
                &self.variant_code,
                &self.product_code,
            ]
            .into_iter()
            .find_map(Scalar::as_deref)
            .unwrap_or("Variant")
            .to_owned(),
        }
    }
}

/// A product image record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProductImage {
    pub image_id: Scalar,
    pub product_image_id: Scalar,
    pub image_url: Scalar,
    pub image_path: Scalar,
    pub image: Scalar,
    pub thumbnail_url: Scalar,
    pub thumbnail: Scalar,
    pub is_primary: Scalar,
    pub is_main: Scalar,
    pub is_active: Scalar,
    pub order: Scalar,
    pub order_no: Scalar,
}

impl ProductImage {
    /// Flagged as the primary image via IsPrimary or IsMain.
    pub fn is_primary_image(&self) -> bool {
        [&self.is_primary, &self.is_main].into_iter().any(|flag| {
            flag.as_deref()
                .is_some_and(|text| text == "1" || text.eq_ignore_ascii_case("true"))
        })
    }

    /// Full-size URL: ImageUrl, then Image.
    pub fn full_url(&self) -> Option<&str> {
        self.image_url.as_deref().or_else(|| self.image.as_deref())
    }

    /// Thumbnail URL: ThumbnailUrl, then Thumbnail, then ImageUrl.
    pub fn thumb_url(&self) -> Option<&str> {
        self.thumbnail_url
            .as_deref()
            .or_else(|| self.thumbnail.as_deref())
            .or_else(|| self.image_url.as_deref())
    }
}

/// Input for product creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub category_code: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    /// Extra legacy form fields; `Vat` also feeds the JSON body.
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl NewProduct {
    pub fn new(code: impl Into<String>, name: impl Into<String>, category_code: impl Into<String>, price: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category_code: category_code.into(),
            price,
            stock: 0,
            extra: IndexMap::new(),
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    /// Build creation input from a decoded product, as bulk creation does.
    ///
    /// Missing category defaults to `T1`; price prefers SellingPrice.
    pub fn from_product(product: &Product) -> Self {
        Self {
            code: product.product_code.as_str().to_owned(),
            name: product.product_name.as_str().to_owned(),
            category_code: product
                .default_category_code
                .as_deref()
                .unwrap_or("T1")
                .to_owned(),
            price: [&product.selling_price, &product.price]
                .into_iter()
                .find_map(Scalar::as_deref)
                .and_then(|text| Scalar::from(text).as_f64())
                .unwrap_or(0.0),
            stock: product.stock.as_i64().unwrap_or(0),
            extra: IndexMap::new(),
        }
    }

    /// Numeric category id for the JSON API: the code without its leading
    /// `T`, or 1 when that is not a number.
    pub fn category_id(&self) -> i64 {
        self.category_code
            .trim_start_matches(['T', 't'])
            .parse()
            .unwrap_or(1)
    }

    /// VAT rate from the `Vat` extra field, defaulting to 18.
    pub fn vat(&self) -> i64 {
        self.extra
            .get("Vat")
            .and_then(|vat| vat.trim().parse().ok())
            .unwrap_or(18)
    }
}

entity_payload!(Product, ProductVariant, ProductImage);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variant(value: serde_json::Value) -> ProductVariant {
        serde_json::from_value(crate::decode::normalize(value)).unwrap()
    }

    #[test]
    fn variants_prefer_first_non_empty_list() {
        let product: Product = serde_json::from_value(crate::decode::normalize(json!({
            "subProducts": [],
            "SubProductList": [{ "VariantCode": "A" }],
            "products": [{ "VariantCode": "B" }, { "VariantCode": "C" }]
        })))
        .unwrap();

        assert_eq!(product.variants().len(), 1);
        assert_eq!(product.variants()[0].variant_code, Scalar::from("A"));
        assert!(product.has_variants());
    }

    #[test]
    fn null_variant_lists_are_empty() {
        let product: Product =
            serde_json::from_value(json!({ "SubProducts": null, "Images": "none" })).unwrap();
        assert!(!product.has_variants());
        assert!(product.images.is_empty());
    }

    #[test]
    fn stock_and_price_fall_back_in_order() {
        let v = variant(json!({ "stockQuantity": 7, "price": "19.90" }));
        assert_eq!(v.stock_quantity(), 7);
        assert!((v.price() - 19.9).abs() < f64::EPSILON);

        let v = variant(json!({ "Stock": "n/a", "StockQuantity": 3 }));
        assert_eq!(v.stock_quantity(), 0);
    }

    #[test]
    fn activity_flags() {
        assert!(variant(json!({})).is_active());
        assert!(variant(json!({ "IsActive": " Yes " })).is_active());
        assert!(!variant(json!({ "IsActive": "0" })).is_active());
        assert!(variant(json!({ "IsAvailable": true })).is_active());
        assert!(!variant(json!({ "IsActive": "", "IsAvailable": "false" })).is_active());
    }

    #[test]
    fn display_name_combines_color_and_size() {
        assert_eq!(
            variant(json!({ "Renk": "Kırmızı", "Beden": 36 })).display_name(),
            "Kırmızı - 36"
        );
        assert_eq!(variant(json!({ "size": "M" })).display_name(), "M");
        assert_eq!(variant(json!({ "VariantCode": "V1" })).display_name(), "V1");
        assert_eq!(variant(json!({})).display_name(), "Variant");
    }

    #[test]
    fn primary_image_flags() {
        let image: ProductImage =
            serde_json::from_value(crate::decode::normalize(json!({ "isMain": "TRUE" }))).unwrap();
        assert!(image.is_primary_image());
        assert!(!ProductImage::default().is_primary_image());
    }

    #[test]
    fn new_product_category_id_and_vat() {
        let mut input = NewProduct::new("P1", "Shirt", "T42", 10.0);
        assert_eq!(input.category_id(), 42);
        assert_eq!(input.vat(), 18);

        input.category_code = "root".into();
        input.extra.insert("Vat".into(), "8".into());
        assert_eq!(input.category_id(), 1);
        assert_eq!(input.vat(), 8);
    }
}
