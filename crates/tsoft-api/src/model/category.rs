// Category entity and tree reconstruction.
//
// The tree endpoint returns nested children on some shops and a flat list
// linked by `ParentCategoryCode` on others. Flat lists are rebuilt here;
// nothing is ever dropped, so orphans, self-parents and cycle members end
// up as roots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::decode::{Scalar, entity_payload, lenient_list};

/// Separator between ancestor names in a category path.
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Category {
    pub category_code: Scalar,
    pub category_name: Scalar,
    pub parent_category_code: Scalar,
    pub is_active: Scalar,
    pub category_id: Scalar,
    pub parent_category_id: Scalar,
    pub level: Scalar,
    pub order: Scalar,
    #[serde(deserialize_with = "lenient_list")]
    pub children: Vec<Category>,
    pub path: Scalar,
}

entity_payload!(Category);

impl Category {
    /// Display label: name, then code, then `"Unknown"`.
    pub fn label(&self) -> &str {
        self.category_name
            .non_empty()
            .or_else(|| self.category_code.non_empty())
            .unwrap_or("Unknown")
    }

    /// Path segments split back out of the assigned path.
    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .non_empty()
            .map(|path| path.split(PATH_SEPARATOR).map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// True when the list arrived flat: no node has children, yet at least one
/// node names another node in the list as its parent.
pub fn is_flat(categories: &[Category]) -> bool {
    if categories.iter().any(|c| !c.children.is_empty()) {
        return false;
    }
    let codes: std::collections::HashSet<&str> = categories
        .iter()
        .filter_map(|c| c.category_code.non_empty())
        .collect();
    categories.iter().any(|c| {
        c.parent_category_code
            .non_empty()
            .is_some_and(|parent| Some(parent) != c.category_code.non_empty() && codes.contains(parent))
    })
}

/// Rebuild a tree from a flat list.
///
/// Codes index to their first occurrence. A node attaches to its parent
/// only when the parent code is known, differs from its own, and the
/// link is not part of a cycle. Roots and siblings keep input order.
pub fn build_tree(flat: Vec<Category>) -> Vec<Category> {
    let count = flat.len();

    let mut index: HashMap<String, usize> = HashMap::with_capacity(count);
    for (i, category) in flat.iter().enumerate() {
        if let Some(code) = category.category_code.non_empty() {
            index.entry(code.to_owned()).or_insert(i);
        }
    }

    let mut parent: Vec<Option<usize>> = flat
        .iter()
        .enumerate()
        .map(|(i, category)| {
            category
                .parent_category_code
                .non_empty()
                .and_then(|code| index.get(code).copied())
                .filter(|&p| p != i)
        })
        .collect();

    // Any node that can reach itself through parent links is a cycle member.
    let in_cycle: Vec<bool> = (0..count)
        .map(|start| {
            let mut cursor = parent[start];
            for _ in 0..count {
                match cursor {
                    Some(node) if node == start => return true,
                    Some(node) => cursor = parent[node],
                    None => return false,
                }
            }
            false
        })
        .collect();
    for (link, cyclic) in parent.iter_mut().zip(&in_cycle) {
        if *cyclic {
            *link = None;
        }
    }

    let mut kids: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots = Vec::new();
    for (i, link) in parent.iter().enumerate() {
        match link {
            Some(p) => kids[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<Category>> = flat
        .into_iter()
        .map(|mut category| {
            category.children.clear();
            Some(category)
        })
        .collect();

    roots
        .into_iter()
        .filter_map(|root| assemble(root, &mut slots, &kids))
        .collect()
}

fn assemble(node: usize, slots: &mut [Option<Category>], kids: &[Vec<usize>]) -> Option<Category> {
    let mut category = slots.get_mut(node)?.take()?;
    category.children = kids
        .get(node)
        .map(|children| {
            children
                .iter()
                .filter_map(|&child| assemble(child, slots, kids))
                .collect()
        })
        .unwrap_or_default();
    Some(category)
}

/// Assign `"A > B > C"` paths down the tree.
pub fn assign_paths(categories: &mut [Category]) {
    assign_paths_under(categories, None);
}

fn assign_paths_under(categories: &mut [Category], parent: Option<&str>) {
    for category in categories {
        let path = match parent {
            None => category.label().to_owned(),
            Some(parent) => format!("{parent}{PATH_SEPARATOR}{}", category.label()),
        };
        assign_paths_under(&mut category.children, Some(&path));
        category.path = Scalar::from(path);
    }
}

/// Index every node of a tree by code. Later duplicates overwrite earlier
/// ones, matching a depth-first walk.
pub fn flatten(categories: &[Category]) -> HashMap<String, &Category> {
    let mut out = HashMap::new();
    flatten_into(categories, &mut out);
    out
}

fn flatten_into<'a>(categories: &'a [Category], out: &mut HashMap<String, &'a Category>) {
    for category in categories {
        if let Some(code) = category.category_code.non_empty() {
            out.insert(code.to_owned(), category);
        }
        flatten_into(&category.children, out);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cat(code: &str, name: &str, parent: &str) -> Category {
        Category {
            category_code: Scalar::from(code),
            category_name: Scalar::from(name),
            parent_category_code: Scalar::from(parent),
            ..Category::default()
        }
    }

    fn shape(tree: &[Category]) -> Vec<(String, Vec<String>)> {
        tree.iter()
            .map(|c| {
                (
                    c.category_code.to_string(),
                    c.children.iter().map(|k| k.category_code.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn orphan_becomes_root() {
        let tree = build_tree(vec![
            cat("T1", "Clothing", ""),
            cat("T2", "Shirts", "T1"),
            cat("T9", "Lost", "T404"),
        ]);
        assert_eq!(
            shape(&tree),
            vec![
                ("T1".to_owned(), vec!["T2".to_owned()]),
                ("T9".to_owned(), vec![]),
            ]
        );
    }

    #[test]
    fn self_parent_and_cycles_become_roots() {
        let tree = build_tree(vec![
            cat("A", "A", "A"),
            cat("B", "B", "C"),
            cat("C", "C", "B"),
            cat("D", "D", "B"),
        ]);
        assert_eq!(
            shape(&tree),
            vec![
                ("A".to_owned(), vec![]),
                ("B".to_owned(), vec!["D".to_owned()]),
                ("C".to_owned(), vec![]),
            ]
        );
    }

    #[test]
    fn duplicate_codes_attach_to_first_occurrence() {
        let tree = build_tree(vec![
            cat("P", "First", ""),
            cat("P", "Second", ""),
            cat("K", "Kid", "P"),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 1);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn paths_use_name_then_code() {
        let mut tree = build_tree(vec![
            cat("T1", "Clothing", ""),
            cat("T2", "", "T1"),
            cat("T3", "Tees", "T2"),
        ]);
        assign_paths(&mut tree);

        let index = flatten(&tree);
        assert_eq!(index["T1"].path.as_str(), "Clothing");
        assert_eq!(index["T2"].path.as_str(), "Clothing > T2");
        assert_eq!(index["T3"].path.as_str(), "Clothing > T2 > Tees");
        assert_eq!(index["T3"].path_segments(), ["Clothing", "T2", "Tees"]);
    }

    #[test]
    fn flat_detection() {
        let flat = vec![cat("T1", "A", ""), cat("T2", "B", "T1")];
        assert!(is_flat(&flat));

        let nested = build_tree(flat);
        assert!(!is_flat(&nested));
        assert!(!is_flat(&[cat("T1", "A", "")]));
    }
}
