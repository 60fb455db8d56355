use crate::qi::api::{QiBanner, QiCategory, QiPresentation, QiProduct};
use qi_types::banner::{Banner, BannerOverlay};
use qi_types::category::ProductCategory;
use qi_types::product::{
    complete_highlights, tag_slug, Product, ProductImage, ProductPresentation, ProductTag,
    PRICE_ON_REQUEST, SUMMARY_MAX_CHARS,
};
use qi_types::text::{first_non_empty, to_plain_text, truncate_summary};
use qi_types::{PhysicalState, StockStatus};
use std::collections::HashMap;

const QUOTE_WEIGHT: u64 = 10;

pub fn placeholder_image(state: Option<PhysicalState>) -> String {
    let kind = match state {
        Some(PhysicalState::Liquido) => "liquido",
        _ => "solido",
    };
    format!("/images/placeholders/presentation-placeholder-{kind}.png")
}

fn plain(field: &Option<String>) -> Option<String> {
    field.as_deref().map(to_plain_text)
}

pub fn adapt_product(
    qi: &QiProduct,
    categories: &[QiCategory],
    presentations: &[QiPresentation],
) -> Product {
    let presentation_map: HashMap<&str, &QiPresentation> =
        presentations.iter().map(|p| (p.id.as_str(), p)).collect();
    let product_presentations = qi
        .presentation_ids
        .iter()
        .filter_map(|id| presentation_map.get(id.as_str()).copied())
        .collect::<Vec<_>>();

    let mut images = vec![];
    for (index, presentation) in product_presentations.iter().enumerate() {
        let Some(image) = presentation.image.as_ref().filter(|i| !i.url.is_empty()) else {
            continue;
        };
        images.push(ProductImage::new(
            index as i64,
            image.url.clone(),
            format!("{} - {}", qi.title, presentation.pretty),
        ));
    }
    if images.is_empty() {
        images.push(ProductImage::new(
            -1,
            placeholder_image(qi.physical_state),
            qi.title.clone(),
        ));
    }
    let image = images
        .first()
        .map(|i| i.src.clone())
        .unwrap_or_else(|| placeholder_image(qi.physical_state));

    let presentation_labels = product_presentations
        .iter()
        .enumerate()
        .map(|(index, p)| ProductPresentation {
            id: format!("{}-presentation-{index}-{}", qi.id, p.pretty),
            label: p.pretty.clone(),
            minimum_order: None,
        })
        .collect();

    let (ai_description, description_text, description_html) = (
        plain(&qi.ai.description),
        plain(&qi.description_text),
        plain(&qi.description_html),
    );
    let description = first_non_empty([
        ai_description.as_deref(),
        description_text.as_deref(),
        description_html.as_deref(),
    ])
    .unwrap_or_default()
    .to_string();
    let (ai_short, short_text, short_html) = (
        plain(&qi.ai.short_description),
        plain(&qi.short_text),
        plain(&qi.short_html),
    );
    let short_description = first_non_empty([
        ai_short.as_deref(),
        short_text.as_deref(),
        short_html.as_deref(),
    ])
    .unwrap_or_default();
    let summary = truncate_summary(
        first_non_empty([
            Some(short_description),
            Some(description.as_str()),
            Some(qi.title.as_str()),
        ])
        .unwrap_or_default(),
        SUMMARY_MAX_CHARS,
    );

    let mut highlights = vec![];
    for id in qi.category_ids.iter().take(3) {
        if let Some(category) = categories.iter().find(|c| &c.id == id) {
            highlights.push(category.name.clone());
        }
    }
    for tag in qi.tags.iter().take(3) {
        if !highlights.contains(tag) {
            highlights.push(tag.clone());
        }
    }

    Product {
        id: qi.id.clone(),
        name: qi.title.clone(),
        slug: qi.slug.clone(),
        image,
        images,
        categories: qi.category_ids.clone(),
        presentations: presentation_labels,
        summary,
        description,
        popularity: qi
            .views
            .saturating_add(qi.searches)
            .saturating_add(qi.total_quotes.saturating_mul(QUOTE_WEIGHT)),
        created_at: qi.created_at.clone(),
        featured: Some(qi.featured),
        hero_highlights: complete_highlights(highlights),
        price: None,
        regular_price: None,
        sale_price: None,
        price_text: Some(PRICE_ON_REQUEST.to_string()),
        stock_status: StockStatus::InStock,
        stock_quantity: None,
        purchasable: true,
        sku: qi.sku.clone(),
        weight: None,
        dimensions: None,
        tags: qi
            .tags
            .iter()
            .enumerate()
            .map(|(index, tag)| ProductTag {
                id: index as u64,
                name: tag.clone(),
                slug: tag_slug(tag),
            })
            .collect(),
        attributes: vec![],
        average_rating: 0.0,
        rating_count: 0,
        total_sales: qi.total_quotes,
        on_sale: false,
        is_virtual: false,
        downloadable: false,
        external_url: None,
        button_text: None,
        purchase_note: None,
        reviews_allowed: false,
        upsell_ids: vec![],
        cross_sell_ids: vec![],
        related_ids: qi
            .related_product_ids
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect(),
        physical_state: qi.physical_state,
        views: Some(qi.views),
        searches: Some(qi.searches),
        total_quotes: Some(qi.total_quotes),
    }
}

pub fn adapt_category(qi: &QiCategory) -> ProductCategory {
    ProductCategory {
        id: qi.id.clone(),
        name: qi.name.clone(),
        description: plain(&qi.description).filter(|d| !d.is_empty()),
        hero_highlight: None,
        image: qi
            .image
            .as_ref()
            .map(|i| i.url.clone())
            .filter(|u| !u.is_empty()),
        slug: Some(qi.slug.clone()),
        wordpress_id: None,
    }
}

pub fn adapt_presentation(qi: &QiPresentation) -> ProductPresentation {
    ProductPresentation {
        id: qi.id.clone(),
        label: qi.pretty.clone(),
        minimum_order: None,
    }
}

pub fn adapt_banner(qi: &QiBanner) -> Banner {
    Banner {
        id: qi.id.clone(),
        title: qi.title.clone(),
        image: qi.image.url.clone(),
        image_alt: first_non_empty([Some(qi.image.alt.as_str()), Some(qi.title.as_str())])
            .unwrap_or_default()
            .to_string(),
        link_url: qi
            .link
            .as_ref()
            .map(|l| l.url.clone())
            .filter(|u| !u.is_empty()),
        open_in_new_tab: qi.link.as_ref().is_some_and(|l| l.open_in_new_tab),
        placement: qi.placement.clone(),
        sort_order: qi.sort_order,
        overlay: qi.overlay.as_ref().map(|o| BannerOverlay {
            title: o.title.clone(),
            subtitle: o.subtitle.clone(),
            button_text: o.button_text.clone(),
            text_color: o.text_color.clone(),
            background_color: o.background_color.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qi::api::{QiAi, QiImage};

    fn category(id: &str, name: &str) -> QiCategory {
        QiCategory {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            ..Default::default()
        }
    }

    fn presentation(id: &str, pretty: &str, image: Option<&str>) -> QiPresentation {
        QiPresentation {
            id: id.to_string(),
            pretty: pretty.to_string(),
            image: image.map(|url| QiImage {
                url: url.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn product() -> QiProduct {
        QiProduct {
            id: "p1".to_string(),
            title: "Hipoclorito de sodio".to_string(),
            slug: "hipoclorito-de-sodio".to_string(),
            category_ids: vec!["c1".to_string(), "missing".to_string(), "c2".to_string()],
            presentation_ids: vec!["pr1".to_string(), "pr2".to_string(), "gone".to_string()],
            related_product_ids: vec!["12".to_string(), "65f0abc".to_string()],
            tags: vec!["Desinfección".to_string(), "Limpieza".to_string()],
            views: 5,
            searches: 3,
            total_quotes: 2,
            ..Default::default()
        }
    }

    #[test]
    fn uses_presentation_images() {
        let presentations = vec![
            presentation("pr1", "Galón 4 L", None),
            presentation("pr2", "Bidón 20 L", Some("https://cdn.example/bidon.png")),
        ];
        let p = adapt_product(&product(), &[], &presentations);
        assert_eq!(p.image, "https://cdn.example/bidon.png");
        assert_eq!(p.images.len(), 1);
        assert_eq!(p.images[0].id, 1);
        assert_eq!(p.images[0].alt, "Hipoclorito de sodio - Bidón 20 L");
        assert_eq!(p.presentations.len(), 2);
        assert_eq!(p.presentations[0].id, "p1-presentation-0-Galón 4 L");
    }

    #[test]
    fn falls_back_to_placeholder_by_physical_state() {
        let mut qi = product();
        qi.physical_state = Some(PhysicalState::Liquido);
        let p = adapt_product(&qi, &[], &[]);
        assert_eq!(
            p.image,
            "/images/placeholders/presentation-placeholder-liquido.png"
        );
        assert_eq!(p.images[0].id, -1);

        qi.physical_state = Some(PhysicalState::Polvo);
        let p = adapt_product(&qi, &[], &[]);
        assert_eq!(
            p.image,
            "/images/placeholders/presentation-placeholder-solido.png"
        );
    }

    #[test]
    fn prefers_ai_copy_and_truncates_summary() {
        let mut qi = product();
        qi.ai = QiAi {
            description: Some("   ".to_string()),
            short_description: Some("x".repeat(300)),
            ..Default::default()
        };
        qi.description_text = Some(String::new());
        qi.description_html = Some("<p>Oxidante <b>fuerte</b>.</p>".to_string());
        let p = adapt_product(&qi, &[], &[]);
        assert_eq!(p.description, "Oxidante fuerte.");
        assert_eq!(p.summary.chars().count(), 220);
        assert!(p.summary.ends_with("..."));
    }

    #[test]
    fn summary_falls_back_to_title() {
        let p = adapt_product(&product(), &[], &[]);
        assert_eq!(p.summary, "Hipoclorito de sodio");
        assert_eq!(p.description, "");
    }

    #[test]
    fn builds_highlights_from_categories_tags_and_defaults() {
        let categories = vec![category("c1", "Desinfección"), category("c2", "Saneamiento")];
        let p = adapt_product(&product(), &categories, &[]);
        assert_eq!(
            p.hero_highlights,
            vec![
                "Desinfección",
                "Saneamiento",
                "Limpieza",
                "Soporte técnico especializado",
                "Despacho a todo el Perú",
                "Calidad certificada"
            ]
        );
    }

    #[test]
    fn maps_counters_and_ids() {
        let p = adapt_product(&product(), &[], &[]);
        assert_eq!(p.popularity, 5 + 3 + 2 * 10);
        assert_eq!(p.total_sales, 2);
        assert_eq!(p.related_ids, vec![12]);
        assert_eq!(p.categories, vec!["c1", "missing", "c2"]);
        assert_eq!(p.tags[0].slug, "desinfección");
        assert_eq!(p.price_text.as_deref(), Some("Consultar precio"));
        assert!(p.purchasable);
    }

    #[test]
    fn adapts_category_and_banner() {
        let mut c = category("c1", "Solventes");
        c.image = Some(QiImage {
            url: "/img/solventes.jpg".to_string(),
            ..Default::default()
        });
        c.description = Some("<p>Para limpieza &amp; dilución</p>".to_string());
        let c = adapt_category(&c);
        assert_eq!(c.slug.as_deref(), Some("solventes"));
        assert_eq!(c.image.as_deref(), Some("/img/solventes.jpg"));
        assert_eq!(c.description.as_deref(), Some("Para limpieza & dilución"));

        let b = adapt_banner(&QiBanner {
            id: "b1".to_string(),
            title: "Ofertas".to_string(),
            ..Default::default()
        });
        assert_eq!(b.image_alt, "Ofertas");
        assert_eq!(b.link_url, None);
        assert!(!b.open_in_new_tab);
    }
}
