//! Product command handlers.

use tabled::Tabled;
use tsoft_api::{NewProduct, Product, ProductImage, ProductQuery, ProductVariant, TsoftClient};

use crate::cli::{GlobalOpts, ListArgs, ProductsArgs, ProductsCommand, VariantGrouping};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: String,
    #[tabled(rename = "Barcode")]
    barcode: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        let category = p
            .category_name
            .non_empty()
            .or_else(|| p.default_category_name.non_empty())
            .or_else(|| p.default_category_code.non_empty())
            .unwrap_or_default();
        Self {
            code: p.product_code.to_string(),
            name: p.product_name.to_string(),
            category: category.to_owned(),
            price: p
                .selling_price
                .non_empty()
                .unwrap_or(p.price.as_str())
                .to_owned(),
            stock: p.stock.to_string(),
            barcode: p.barcode.to_string(),
        }
    }
}

#[derive(Tabled)]
struct VariantRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Variant")]
    name: String,
    #[tabled(rename = "Stock")]
    stock: i64,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Barcode")]
    barcode: String,
}

#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Primary")]
    primary: String,
    #[tabled(rename = "URL")]
    url: String,
}

fn image_row(product: &str, image: &ProductImage) -> ImageRow {
    ImageRow {
        product: product.to_owned(),
        primary: if image.is_primary_image() { "yes".into() } else { String::new() },
        url: image.full_url().unwrap_or_default().to_owned(),
    }
}

fn product_detail(p: &Product) -> String {
    let path = p.category_path.join(" > ");
    output::detail(&[
        ("Code", p.product_code.as_str()),
        ("Id", p.product_id.as_str()),
        ("Name", p.product_name.as_str()),
        ("Category", p.default_category_code.as_str()),
        ("Category path", &path),
        ("Price", p.price.as_str()),
        ("Selling price", p.selling_price.as_str()),
        ("Stock", p.stock.as_str()),
        ("Barcode", p.barcode.as_str()),
        ("Brand", p.brand.as_str()),
        ("Active", p.is_active.as_str()),
        ("Variants", &p.variants().len().to_string()),
    ])
}

fn query(list: &ListArgs, search: Option<String>) -> Result<ProductQuery, CliError> {
    Ok(ProductQuery {
        limit: list.limit,
        page: list.page,
        search,
        filters: util::parse_pairs(&list.filter, "filter")?,
    })
}

fn print_products(products: &[Product], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        global.output,
        products,
        |p| ProductRow::from(p),
        |p| p.product_code.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &TsoftClient, args: ProductsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        ProductsCommand::List { list, search } => {
            let products = util::ensure(client.list_products(&query(&list, search)?).await, "product list")?;
            print_products(&products, global)
        }

        ProductsCommand::Enhanced { list, no_images } => {
            let products = util::ensure(
                client.enhanced_products(list.limit, list.page, !no_images).await,
                "product list",
            )?;
            print_products(&products, global)
        }

        ProductsCommand::Get { code } => {
            let envelope = client.product_by_code(&code).await;
            let product = envelope.into_result().map_err(|_| CliError::NotFound {
                resource_type: "product".into(),
                identifier: code,
            })?;
            let out = output::render_single(global.output, &product, product_detail, |p| {
                p.product_code.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Variants { code, group_by } => {
            let product = util::ensure(client.product_with_variants(&code).await, "variant lookup")?;
            let groups = match group_by {
                VariantGrouping::Color => product.variants_by_color(),
                VariantGrouping::Size => product.variants_by_size(),
            };

            let flat: Vec<(&str, &ProductVariant)> = groups
                .iter()
                .flat_map(|(group, variants)| variants.iter().map(move |v| (group.as_str(), *v)))
                .collect();
            let out = output::render_list(
                global.output,
                &flat,
                |(group, v)| VariantRow {
                    group: (*group).to_owned(),
                    name: v.display_name(),
                    stock: v.stock_quantity(),
                    price: v.price.to_string(),
                    barcode: v.barcode.to_string(),
                },
                |(_, v)| v.display_name(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Images { codes, parallel } => {
            let rows: Vec<(String, ProductImage)> = if let [code] = codes.as_slice() {
                util::ensure(client.product_images(code).await, "image lookup")?
                    .into_iter()
                    .map(|image| (code.clone(), image))
                    .collect()
            } else {
                let found = client.bulk_product_images(&codes, parallel).await;
                codes
                    .iter()
                    .filter_map(|code| found.get(code).map(|images| (code, images)))
                    .flat_map(|(code, images)| images.iter().map(move |image| (code.clone(), image.clone())))
                    .collect()
            };
            let out = output::render_list(
                global.output,
                &rows,
                |(code, image)| image_row(code, image),
                |(_, image)| image.full_url().unwrap_or_default().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Create {
            code,
            name,
            category,
            price,
            stock,
            from_file,
        } => {
            if let Some(path) = from_file {
                let inputs: Vec<NewProduct> = util::read_json_file(&path)?;
                let envelope = client.create_products(&inputs).await;
                let Some(outcome) = envelope.data else {
                    return Err(CliError::upstream("bulk product creation", &envelope.messages));
                };
                let out = output::render_single(
                    global.output,
                    &outcome,
                    |o| {
                        let mut lines = vec![format!("{} created, {} failed", o.succeeded, o.failed)];
                        lines.extend(
                            o.failures
                                .iter()
                                .map(|f| format!("  {}: {}", f.code, f.messages.join("; "))),
                        );
                        lines.join("\n")
                    },
                    |o| o.succeeded.to_string(),
                )?;
                output::print_output(&out, global.quiet);
                if outcome.failed > 0 {
                    return Err(CliError::Upstream {
                        operation: "bulk product creation".into(),
                        message: format!("{} of {} products failed", outcome.failed, inputs.len()),
                    });
                }
                return Ok(());
            }

            let (Some(code), Some(name)) = (code, name) else {
                return Err(CliError::Validation {
                    field: "code".into(),
                    reason: "--code and --name are required without --from-file".into(),
                });
            };
            let input = NewProduct::new(code, name, category, price).with_stock(stock);
            let created = util::ensure_done(client.create_product(&input).await, "product creation")?;
            output::status(&format!("Product {} created", input.code), true, color, global.quiet);
            if let Some(created) = created {
                let out = output::render_single(global.output, &created, product_detail, |p| {
                    p.product_code.to_string()
                })?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        ProductsCommand::Update { code, set } => {
            let fields = util::parse_pairs(&set, "set")?;
            let current = client.product_by_code(&code).await.into_result().map_err(|_| {
                CliError::NotFound {
                    resource_type: "product".into(),
                    identifier: code.clone(),
                }
            })?;
            let updated = util::set_fields(&current, &fields)?;
            util::ensure_done(client.update_product(&updated).await, "product update")?;
            output::status(&format!("Product {code} updated"), true, color, global.quiet);
            Ok(())
        }

        ProductsCommand::Delete { code } => {
            if !util::confirm(&format!("Delete product '{code}'?"), global.yes)? {
                return Ok(());
            }
            util::ensure(client.delete_product(&code).await, "product deletion")?;
            output::status(&format!("Product {code} deleted"), true, color, global.quiet);
            Ok(())
        }

        ProductsCommand::Stock { code, quantity } => {
            util::ensure(client.update_stock(&code, quantity).await, "stock update")?;
            output::status(&format!("Stock of {code} set to {quantity}"), true, color, global.quiet);
            Ok(())
        }

        ProductsCommand::VariantStock {
            code,
            variant,
            quantity,
        } => {
            util::ensure(
                client.update_variant_stock(&code, &variant, quantity).await,
                "variant stock update",
            )?;
            output::status(
                &format!("Stock of {code}/{variant} set to {quantity}"),
                true,
                color,
                global.quiet,
            );
            Ok(())
        }
    }
}
