use crate::{WcCategory, WcProduct};
use qi_types::category::ProductCategory;
use qi_types::product::{
    complete_highlights, push_unique, tag_slug, Product, ProductAttribute, ProductDimensions,
    ProductImage, ProductPresentation, ProductTag, PRICE_ON_REQUEST, SUMMARY_MAX_CHARS,
};
use qi_types::text::{
    extract_list_items, first_non_empty, first_sentence, to_plain_text, truncate_summary,
};
use qi_types::StockStatus;

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.svg";
pub const CURRENCY_PREFIX: &str = "S/";
const CATEGORY_HIGHLIGHT_MAX_CHARS: usize = 120;

pub(crate) fn is_uncategorized(slug: &str) -> bool {
    matches!(slug, "uncategorized" | "sin-categorizar" | "sin-categoria")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn is_presentation_attribute(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("presentaci") || name.contains("envase")
}

pub fn adapt_product(wc: WcProduct) -> Product {
    let name = to_plain_text(&wc.name);
    let mut images = wc
        .images
        .iter()
        .filter(|i| !i.src.trim().is_empty())
        .map(|i| ProductImage {
            id: i.id as i64,
            src: i.src.clone(),
            name: non_empty(&i.name).unwrap_or_else(|| name.clone()),
            alt: non_empty(&i.alt).unwrap_or_else(|| name.clone()),
            thumbnail: i.src.clone(),
            srcset: None,
            sizes: None,
        })
        .collect::<Vec<_>>();
    if images.is_empty() {
        images.push(ProductImage::new(-1, PLACEHOLDER_IMAGE, name.clone()));
    }
    let image = images
        .first()
        .map(|i| i.src.clone())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let description = to_plain_text(&wc.description);
    let short_description = to_plain_text(&wc.short_description);
    let summary = truncate_summary(
        first_non_empty([
            Some(short_description.as_str()),
            Some(description.as_str()),
            Some(name.as_str()),
        ])
        .unwrap_or_default(),
        SUMMARY_MAX_CHARS,
    );

    let mut highlights = vec![];
    for c in wc.categories.iter().filter(|c| !is_uncategorized(&c.slug)).take(3) {
        push_unique(&mut highlights, to_plain_text(&c.name));
    }
    let bullets = extract_list_items(&wc.short_description)
        .into_iter()
        .chain(extract_list_items(&wc.description));
    for item in bullets.take(3) {
        push_unique(&mut highlights, truncate_summary(&item, 80));
    }

    let presentations = wc
        .attributes
        .iter()
        .filter(|a| is_presentation_attribute(&a.name))
        .flat_map(|a| a.options.iter())
        .enumerate()
        .map(|(i, label)| ProductPresentation {
            id: format!("{}-presentation-{i}-{label}", wc.id),
            label: label.clone(),
            minimum_order: None,
        })
        .collect();

    let price = non_empty(&wc.price);
    let price_text = Some(
        price
            .as_ref()
            .map(|p| format!("{CURRENCY_PREFIX} {p}"))
            .unwrap_or_else(|| PRICE_ON_REQUEST.to_string()),
    );
    let dimensions = ProductDimensions {
        length: wc.dimensions.length,
        width: wc.dimensions.width,
        height: wc.dimensions.height,
    };

    Product {
        id: wc.id.to_string(),
        name,
        slug: wc.slug,
        image,
        images,
        categories: wc
            .categories
            .iter()
            .map(|c| c.slug.clone())
            .filter(|s| !s.is_empty())
            .collect(),
        presentations,
        summary,
        description,
        popularity: wc.total_sales,
        created_at: wc.date_created,
        featured: Some(wc.featured),
        hero_highlights: complete_highlights(highlights),
        price,
        regular_price: non_empty(&wc.regular_price),
        sale_price: non_empty(&wc.sale_price),
        price_text,
        stock_status: StockStatus::from(wc.stock_status.as_str()),
        stock_quantity: wc.stock_quantity,
        purchasable: wc.purchasable,
        sku: non_empty(&wc.sku),
        weight: non_empty(&wc.weight),
        dimensions: (!dimensions.is_empty()).then_some(dimensions),
        tags: wc
            .tags
            .into_iter()
            .map(|t| ProductTag {
                id: t.id,
                name: t.name,
                slug: t.slug,
            })
            .collect(),
        attributes: wc
            .attributes
            .into_iter()
            .map(|a| ProductAttribute {
                id: a.id,
                slug: tag_slug(&a.name),
                name: a.name,
                position: a.position,
                visible: a.visible,
                variation: a.variation,
                options: a.options,
            })
            .collect(),
        average_rating: wc.average_rating.trim().parse().unwrap_or_default(),
        rating_count: wc.rating_count,
        total_sales: wc.total_sales,
        on_sale: wc.on_sale,
        is_virtual: wc.is_virtual,
        downloadable: wc.downloadable,
        external_url: non_empty(&wc.external_url),
        button_text: non_empty(&wc.button_text),
        purchase_note: non_empty(&to_plain_text(&wc.purchase_note)),
        reviews_allowed: wc.reviews_allowed,
        upsell_ids: wc.upsell_ids,
        cross_sell_ids: wc.cross_sell_ids,
        related_ids: wc.related_ids,
        physical_state: None,
        views: None,
        searches: None,
        total_quotes: None,
    }
}

pub fn adapt_category(wc: WcCategory) -> ProductCategory {
    let description = non_empty(&to_plain_text(&wc.description));
    ProductCategory {
        id: wc.slug.clone(),
        name: to_plain_text(&wc.name),
        hero_highlight: description
            .as_deref()
            .map(|d| first_sentence(d, CATEGORY_HIGHLIGHT_MAX_CHARS)),
        description,
        image: wc.image.map(|i| i.src).filter(|s| !s.trim().is_empty()),
        slug: Some(wc.slug),
        wordpress_id: Some(wc.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{WcAttribute, WcImage, WcTerm};

    fn term(id: u64, name: &str, slug: &str) -> WcTerm {
        WcTerm {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    fn product() -> WcProduct {
        WcProduct {
            id: 101,
            name: "Ácido Sulfúrico &amp; Derivados".to_string(),
            slug: "acido-sulfurico".to_string(),
            description: "<p>Ácido sulfúrico grado técnico.</p><ul><li>Minería</li><li>Baterías</li></ul>"
                .to_string(),
            short_description: String::new(),
            price: "120.50".to_string(),
            stock_status: "onbackorder".to_string(),
            total_sales: 33,
            categories: vec![
                term(1, "Ácidos", "acidos"),
                term(2, "Uncategorized", "uncategorized"),
            ],
            attributes: vec![WcAttribute {
                id: 4,
                name: "Presentación".to_string(),
                position: 0,
                visible: true,
                variation: false,
                options: vec!["Bidón 20 L".to_string(), "Cilindro 250 kg".to_string()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn adapts_copy_from_html_fields() {
        let p = adapt_product(product());
        assert_eq!(p.name, "Ácido Sulfúrico & Derivados");
        assert_eq!(
            p.description,
            "Ácido sulfúrico grado técnico. Minería Baterías"
        );
        assert_eq!(p.summary, p.description);
        assert_eq!(
            p.hero_highlights,
            vec![
                "Ácidos",
                "Minería",
                "Baterías",
                "Soporte técnico especializado",
                "Despacho a todo el Perú",
                "Calidad certificada"
            ]
        );
        assert_eq!(p.categories, vec!["acidos", "uncategorized"]);
    }

    #[test]
    fn adapts_commerce_fields() {
        let p = adapt_product(product());
        assert_eq!(p.price.as_deref(), Some("120.50"));
        assert_eq!(p.price_text.as_deref(), Some("S/ 120.50"));
        assert_eq!(p.stock_status, StockStatus::OnBackorder);
        assert_eq!(p.popularity, 33);
        assert_eq!(p.dimensions, None);
        assert_eq!(p.presentations.len(), 2);
        assert_eq!(p.presentations[1].id, "101-presentation-1-Cilindro 250 kg");
        assert_eq!(p.attributes[0].slug, "presentación");
    }

    #[test]
    fn missing_images_and_price_use_placeholders() {
        let p = adapt_product(WcProduct {
            id: 5,
            name: "Soda".to_string(),
            ..Default::default()
        });
        assert_eq!(p.image, PLACEHOLDER_IMAGE);
        assert_eq!(p.images[0].id, -1);
        assert_eq!(p.price_text.as_deref(), Some(PRICE_ON_REQUEST));
        assert_eq!(p.summary, "Soda");
    }

    #[test]
    fn keeps_remote_images() {
        let p = adapt_product(WcProduct {
            id: 5,
            name: "Soda".to_string(),
            images: vec![WcImage {
                id: 9,
                src: "https://cdn.example/soda.jpg".to_string(),
                name: String::new(),
                alt: "Soda en escamas".to_string(),
            }],
            ..Default::default()
        });
        assert_eq!(p.image, "https://cdn.example/soda.jpg");
        assert_eq!(p.images[0].name, "Soda");
        assert_eq!(p.images[0].alt, "Soda en escamas");
    }

    #[test]
    fn adapts_category() {
        let c = adapt_category(WcCategory {
            id: 15,
            name: "Ácidos &amp; Bases".to_string(),
            slug: "acidos-bases".to_string(),
            description: "<p>Insumos corrosivos. Manipular con cuidado.</p>".to_string(),
            ..Default::default()
        });
        assert_eq!(c.id, "acidos-bases");
        assert_eq!(c.name, "Ácidos & Bases");
        assert_eq!(c.hero_highlight.as_deref(), Some("Insumos corrosivos."));
        assert_eq!(c.wordpress_id, Some(15));
        assert_eq!(c.image, None);
    }
}
