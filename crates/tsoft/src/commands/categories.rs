//! Category command handlers.

use tabled::Tabled;
use tsoft_api::{Category, TsoftClient};

use crate::cli::{CategoriesArgs, CategoriesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            code: c.category_code.to_string(),
            name: c.label().to_owned(),
            parent: c.parent_category_code.to_string(),
            active: c.is_active.to_string(),
        }
    }
}

/// Indented outline, one node per line.
fn outline(nodes: &[Category], depth: usize, lines: &mut Vec<String>) {
    for node in nodes {
        lines.push(format!(
            "{:indent$}{}  {}",
            "",
            node.category_code,
            node.label(),
            indent = depth * 2
        ));
        outline(&node.children, depth + 1, lines);
    }
}

/// Full path of every node, depth first.
fn paths(nodes: &[Category], lines: &mut Vec<String>) {
    for node in nodes {
        lines.push(node.path.non_empty().unwrap_or(node.label()).to_owned());
        paths(&node.children, lines);
    }
}

pub async fn handle(client: &TsoftClient, args: CategoriesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CategoriesCommand::List => {
            let categories = util::ensure(client.list_categories().await, "category list")?;
            let out = output::render_list(
                global.output,
                &categories,
                |c| CategoryRow::from(c),
                |c| c.category_code.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CategoriesCommand::Tree => {
            let tree = util::ensure(client.category_tree().await, "category tree")?;
            let out = output::render_single(
                global.output,
                tree.as_slice(),
                |roots| {
                    let mut lines = Vec::new();
                    outline(roots, 0, &mut lines);
                    lines.join("\n")
                },
                |roots| {
                    let mut lines = Vec::new();
                    paths(roots, &mut lines);
                    lines.join("\n")
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use tsoft_api::Scalar;

    use super::*;

    #[test]
    fn outline_indents_children() {
        let tree = vec![Category {
            category_code: Scalar::from("T1"),
            category_name: Scalar::from("Home"),
            children: vec![Category {
                category_code: Scalar::from("T2"),
                category_name: Scalar::from("Kitchen"),
                ..Category::default()
            }],
            ..Category::default()
        }];
        let mut lines = Vec::new();
        outline(&tree, 0, &mut lines);
        assert_eq!(lines, ["T1  Home", "  T2  Kitchen"]);
    }
}
