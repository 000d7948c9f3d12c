// Variant attribute probing and grouping.
//
// Shops store color and size under whatever column their theme used. The
// probe tables below are the priority order; the first populated field wins.

use indexmap::IndexMap;

use crate::decode::Scalar;
use crate::model::{Product, ProductVariant};

/// Group key for variants without a color.
pub const DEFAULT_COLOR: &str = "default";

/// Group key for variants without a size.
pub const ONE_SIZE: &str = "one size";

type Probe = fn(&ProductVariant) -> &Scalar;

/// Color field spellings, highest priority first.
pub const COLOR_PROBES: [(&str, Probe); 11] = [
    ("color", |v| &v.color),
    ("colour", |v| &v.colour),
    ("colorName", |v| &v.color_name),
    ("colorCode", |v| &v.color_code),
    ("renk", |v| &v.renk),
    ("Property1", |v| &v.property1),
    ("PropertyValue1", |v| &v.property_value1),
    ("Variant1", |v| &v.variant1),
    ("Attribute1", |v| &v.attribute1),
    ("Option1", |v| &v.option1),
    ("Nitelik1", |v| &v.nitelik1),
];

/// Size field spellings, highest priority first.
pub const SIZE_PROBES: [(&str, Probe); 10] = [
    ("size", |v| &v.size),
    ("sizeName", |v| &v.size_name),
    ("sizeCode", |v| &v.size_code),
    ("beden", |v| &v.beden),
    ("Property2", |v| &v.property2),
    ("PropertyValue2", |v| &v.property_value2),
    ("Variant2", |v| &v.variant2),
    ("Attribute2", |v| &v.attribute2),
    ("Option2", |v| &v.option2),
    ("Nitelik2", |v| &v.nitelik2),
];

/// First populated field in `probes`, or `""`.
pub fn probe<'a>(variant: &'a ProductVariant, probes: &[(&str, Probe)]) -> &'a str {
    probes
        .iter()
        .find_map(|(_, field)| field(variant).non_empty())
        .unwrap_or_default()
}

pub fn color_of(variant: &ProductVariant) -> &str {
    probe(variant, &COLOR_PROBES)
}

pub fn size_of(variant: &ProductVariant) -> &str {
    probe(variant, &SIZE_PROBES)
}

/// Variants grouped by color in first-seen order; colorless variants go
/// under [`DEFAULT_COLOR`].
pub fn variants_by_color(product: &Product) -> IndexMap<String, Vec<&ProductVariant>> {
    group(product, color_of, DEFAULT_COLOR)
}

/// Variants grouped by size in first-seen order; sizeless variants go
/// under [`ONE_SIZE`].
pub fn variants_by_size(product: &Product) -> IndexMap<String, Vec<&ProductVariant>> {
    group(product, size_of, ONE_SIZE)
}

fn group<'a>(
    product: &'a Product,
    key: fn(&ProductVariant) -> &str,
    fallback: &str,
) -> IndexMap<String, Vec<&'a ProductVariant>> {
    let mut groups: IndexMap<String, Vec<&ProductVariant>> = IndexMap::new();
    for variant in product.variants() {
        let name = match key(variant) {
            "" => fallback,
            name => name,
        };
        groups.entry(name.to_owned()).or_default().push(variant);
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decode::normalize;
    use serde_json::json;

    fn product(variants: serde_json::Value) -> Product {
        serde_json::from_value(normalize(json!({ "SubProducts": variants }))).unwrap()
    }

    #[test]
    fn property1_alone_is_the_color() {
        let v: ProductVariant = serde_json::from_value(json!({ "Property1": "Red" })).unwrap();
        assert_eq!(v.color(), "Red");
        assert_eq!(v.size(), "");
    }

    #[test]
    fn earlier_probe_wins_and_empty_is_skipped() {
        let v: ProductVariant = serde_json::from_value(normalize(json!({
            "color": "",
            "colour": "Blue",
            "renk": "Mavi",
            "sizeCode": "38",
            "beden": "M"
        })))
        .unwrap();
        assert_eq!(v.color(), "Blue");
        assert_eq!(v.size(), "38");
    }

    #[test]
    fn groups_keep_first_seen_order_and_sentinels() {
        let p = product(json!([
            { "color": "Red", "size": "S" },
            { "color": "Blue" },
            { "color": "Red", "size": "M" },
            { "size": "S" }
        ]));

        let by_color = p.variants_by_color();
        let colors: Vec<_> = by_color.keys().map(String::as_str).collect();
        assert_eq!(colors, ["Red", "Blue", DEFAULT_COLOR]);
        assert_eq!(by_color["Red"].len(), 2);

        let by_size = variants_by_size(&p);
        let sizes: Vec<_> = by_size.keys().map(String::as_str).collect();
        assert_eq!(sizes, ["S", ONE_SIZE, "M"]);
        assert_eq!(by_size["S"].len(), 2);
    }

    #[test]
    fn product_without_variants_groups_to_nothing() {
        assert!(variants_by_color(&Product::default()).is_empty());
    }
}
