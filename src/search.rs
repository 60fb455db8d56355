use qi_types::product::Product;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_HITS: usize = 10;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub summary: String,
}

impl From<&Product> for SearchHit {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            slug: p.slug.clone(),
            image: p.image.clone(),
            summary: p.summary.clone(),
        }
    }
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Lowercases and drops diacritics, so `Ácido` matches `acido`.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn searchable_text(p: &Product) -> String {
    normalize_text(&format!(
        "{} {} {} {}",
        p.name,
        p.summary,
        p.description,
        p.sku.as_deref().unwrap_or_default()
    ))
}

pub fn matches(product: &Product, normalized_query: &str) -> bool {
    searchable_text(product).contains(normalized_query)
}

/// Products whose text contains `query`, in catalog order.
pub fn search<'a, P>(products: P, query: &str, limit: usize) -> Vec<&'a Product>
where
    P: IntoIterator<Item = &'a Product>,
{
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return vec![];
    }
    let query = normalize_text(query);
    products
        .into_iter()
        .filter(|p| matches(p, &query))
        .take(limit)
        .collect()
}

pub fn search_hits(products: &[Product], query: &str) -> Vec<SearchHit> {
    search(products, query, MAX_HITS)
        .into_iter()
        .map(SearchHit::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, sku: Option<&str>) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            sku: sku.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_accents_and_case() {
        assert_eq!(normalize_text("Ácido Sulfúrico"), "acido sulfurico");
        assert_eq!(normalize_text("PERÓXIDO"), "peroxido");
        assert_eq!(normalize_text("ñandú"), "nandu");
    }

    #[test]
    fn short_queries_return_nothing() {
        let products = vec![product("Ácido nítrico", None)];
        assert!(search_hits(&products, "a").is_empty());
        assert!(search_hits(&products, " á ").is_empty());
        assert!(search_hits(&products, "").is_empty());
    }

    #[test]
    fn matches_name_and_sku_without_accents() {
        let products = vec![
            product("Ácido nítrico", Some("QI-HNO3")),
            product("Soda cáustica", Some("QI-NAOH")),
            product("Ácido cítrico", None),
        ];
        let hits = search_hits(&products, "ACIDO");
        assert_eq!(
            hits.iter().map(|h| h.slug.as_str()).collect::<Vec<_>>(),
            vec!["ácido-nítrico", "ácido-cítrico"]
        );
        let hits = search_hits(&products, "naoh");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Soda cáustica");
    }

    #[test]
    fn caps_hits() {
        let products = (0..25)
            .map(|i| product(&format!("Solvente {i}"), None))
            .collect::<Vec<_>>();
        assert_eq!(search_hits(&products, "solvente").len(), MAX_HITS);
    }

    #[test]
    fn hit_serializes_to_public_shape() {
        let hit = SearchHit::from(&product("Cal viva", None));
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "cal viva",
                "name": "Cal viva",
                "slug": "cal-viva",
                "image": "",
                "summary": ""
            })
        );
    }
}
