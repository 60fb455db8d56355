use anyhow::Context;
use qi_types::category::ProductCategory;
use qi_types::product::{
    complete_highlights, push_unique, Product, ProductImage, PRICE_ON_REQUEST, SUMMARY_MAX_CHARS,
};
use qi_types::text::{first_non_empty, to_plain_text, truncate_summary};
use serde::Deserialize;
use std::path::Path;

use crate::qi::adapter::placeholder_image;

static EMBEDDED: &str = include_str!("../fallback/catalog.yaml");

/// Static catalog served when the backend cannot provide data.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FallbackCatalog {
    pub categories: Vec<ProductCategory>,
    pub products: Vec<Product>,
}

impl FallbackCatalog {
    pub fn embedded() -> Result<Self, anyhow::Error> {
        Self::parse(EMBEDDED).context("Unable to parse embedded fallback catalog")
    }

    pub fn parse(yaml: &str) -> Result<Self, anyhow::Error> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        Ok(catalog.normalize())
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Unable to read fallback catalog {}", path.display()))?;
        Self::parse(&yaml)
            .with_context(|| format!("Unable to parse fallback catalog {}", path.display()))
    }

    /// Fills the derived fields hand-written entries usually leave out.
    fn normalize(mut self) -> Self {
        for p in self.products.iter_mut() {
            if p.hero_highlights.is_empty() {
                for id in &p.categories {
                    if let Some(c) = self.categories.iter().find(|c| &c.id == id) {
                        push_unique(&mut p.hero_highlights, c.name.clone());
                    }
                }
            }
            p.description = to_plain_text(&p.description);
            if p.summary.trim().is_empty() {
                p.summary = truncate_summary(
                    first_non_empty([Some(p.description.as_str()), Some(p.name.as_str())])
                        .unwrap_or_default(),
                    SUMMARY_MAX_CHARS,
                );
            }
            if p.image.is_empty() {
                p.image = p
                    .images
                    .first()
                    .map(|i| i.src.clone())
                    .unwrap_or_else(|| placeholder_image(p.physical_state));
            }
            if p.images.is_empty() {
                p.images.push(ProductImage::new(-1, p.image.clone(), p.name.clone()));
            }
            if p.price_text.is_none() {
                p.price_text = Some(PRICE_ON_REQUEST.to_string());
            }
            p.hero_highlights = complete_highlights(std::mem::take(&mut p.hero_highlights));
            p.purchasable = true;
        }
        for c in self.categories.iter_mut() {
            if c.slug.is_none() {
                c.slug = Some(c.id.clone());
            }
        }
        self
    }
}
