use crate::product::Product;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductCategory {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordpress_id: Option<u64>,
}

impl ProductCategory {
    pub fn matches_slug(&self, slug: &str) -> bool {
        match &self.slug {
            Some(s) => s.eq_ignore_ascii_case(slug),
            None => self.id.eq_ignore_ascii_case(slug),
        }
    }
}

/// Rebuilds a category list from the ids products refer to, in first-seen
/// order. Names come from `known` when an id matches one of them.
pub fn derive_categories<'a, P>(products: P, known: &[ProductCategory]) -> Vec<ProductCategory>
where
    P: IntoIterator<Item = &'a Product>,
{
    let mut seen = HashSet::new();
    let mut res = vec![];
    for id in products.into_iter().flat_map(|p| p.categories.iter()) {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let category = known
            .iter()
            .find(|c| &c.id == id || c.slug.as_ref() == Some(id))
            .cloned()
            .unwrap_or_else(|| ProductCategory {
                id: id.clone(),
                name: humanize_id(id),
                slug: Some(id.clone()),
                ..Default::default()
            });
        res.push(category);
    }
    res
}

/// `acidos-y-bases` → `Acidos y bases`
pub fn humanize_id(id: &str) -> String {
    let words = id.replace(['-', '_'], " ");
    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(categories: &[&str]) -> Product {
        Product {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn derives_categories_in_first_seen_order() {
        let known = vec![ProductCategory {
            id: "c2".to_string(),
            name: "Solventes".to_string(),
            slug: Some("solventes".to_string()),
            ..Default::default()
        }];
        let products = vec![product(&["acidos-y-bases", "c2"]), product(&["c2", "sales"])];
        let derived = derive_categories(&products, &known);
        let names: Vec<_> = derived.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acidos y bases", "Solventes", "Sales"]);
        assert_eq!(derived[0].slug.as_deref(), Some("acidos-y-bases"));
    }

    #[test]
    fn slug_match_falls_back_to_id() {
        let c = ProductCategory {
            id: "sales".to_string(),
            ..Default::default()
        };
        assert!(c.matches_slug("Sales"));
        assert!(!c.matches_slug("acidos"));
    }
}
