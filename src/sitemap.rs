use anyhow::Context;
use derive_more::Display;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use qi_types::product::Product;
use time::macros::format_description;
use time::OffsetDateTime;

pub const PRODUCTS_PER_PAGE: usize = 18;
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChangeFreq {
    #[display("daily")]
    Daily,
    #[display("weekly")]
    Weekly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

const STATIC_PAGES: [(&str, f32, ChangeFreq); 3] = [
    ("", 1.0, ChangeFreq::Daily),
    ("/products", 0.9, ChangeFreq::Daily),
    ("/cotizacion", 0.8, ChangeFreq::Weekly),
];

pub fn entries(base_url: &str, products: &[Product]) -> Vec<SitemapEntry> {
    let base_url = base_url.trim_end_matches('/');
    let entry = |path: &str, priority, changefreq| SitemapEntry {
        loc: format!("{base_url}{path}"),
        changefreq,
        priority,
    };
    let total_pages = products.len().div_ceil(PRODUCTS_PER_PAGE);

    let mut res = STATIC_PAGES
        .iter()
        .map(|(path, priority, changefreq)| entry(path, *priority, *changefreq))
        .collect::<Vec<_>>();
    res.extend(
        (2..=total_pages)
            .map(|page| entry(&format!("/products?page={page}"), 0.7, ChangeFreq::Daily)),
    );
    res.extend(
        products
            .iter()
            .map(|p| entry(&format!("/products/{}", p.slug), 0.8, ChangeFreq::Weekly)),
    );
    res
}

/// Current UTC date as `YYYY-MM-DD`.
pub fn today() -> Result<String, anyhow::Error> {
    OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .context("Unable to format sitemap date")
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), anyhow::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn render(entries: &[SitemapEntry], lastmod: &str) -> Result<String, anyhow::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;
    for e in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_element(&mut writer, "loc", &e.loc)?;
        write_element(&mut writer, "lastmod", lastmod)?;
        write_element(&mut writer, "changefreq", &e.changefreq.to_string())?;
        write_element(&mut writer, "priority", &format!("{:.1}", e.priority))?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    String::from_utf8(writer.into_inner()).context("Sitemap is not valid UTF-8")
}
