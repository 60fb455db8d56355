//! Heuristics that turn raw CMS fields into plain marketing copy.

use lazy_regex::regex;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

#[allow(clippy::unwrap_used)]
static LIST_ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

pub const ELLIPSIS: &str = "...";

pub fn looks_like_html(input: &str) -> bool {
    regex!(r"<[a-zA-Z/!][^>]*>|&(?:[a-zA-Z]+|#\d+|#x[0-9a-fA-F]+);").is_match(input)
        || has_shortcodes(input)
}

fn has_shortcodes(input: &str) -> bool {
    shortcode_regex().is_match(input)
}

fn shortcode_regex() -> &'static lazy_regex::Regex {
    regex!(r"\[/?(?:vc_|et_pb_|fusion_|caption|gallery|embed|audio|video)[^\]]*\]")
}

/// Removes markup and returns whitespace-collapsed text. Entities are decoded
/// by the HTML parser; block-level boundaries become spaces so adjacent
/// paragraphs and list items do not run together.
pub fn strip_html(html: &str) -> String {
    let s = regex!(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .replace_all(html, " ");
    let s = shortcode_regex().replace_all(&s, " ");
    let s = regex!(
        r"(?i)<br\s*/?>|</?(?:p|div|li|ul|ol|h[1-6]|tr|td|th|table|thead|tbody|section|article|blockquote|figure|figcaption)\b[^>]*>"
    )
    .replace_all(&s, " ");
    let fragment = Html::parse_fragment(&s);
    let text = fragment.root_element().text().collect::<String>();
    collapse_whitespace(&text)
}

/// Joins every whitespace run (non-breaking spaces included) into a single
/// space and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    itertools::join(input.split_whitespace(), " ")
}

/// Plain text passes through trimmed, anything resembling markup is stripped.
pub fn to_plain_text(input: &str) -> String {
    if looks_like_html(input) {
        strip_html(input)
    } else {
        input.trim().to_string()
    }
}

/// Keeps at most `max` characters; longer input is cut to `max - 3`
/// characters and suffixed with `...`.
pub fn truncate_summary(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let mut res: String = input.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    res.push_str(ELLIPSIS);
    res
}

pub fn extract_list_items(html: &str) -> Vec<String> {
    if !html.contains('<') {
        return vec![];
    }
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&LIST_ITEM_SELECTOR)
        .map(|li| collapse_whitespace(&li.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn first_sentence(input: &str, max: usize) -> String {
    let text = collapse_whitespace(input);
    let sentence = regex!(r"^(.+?[.!?])(?:\s|$)")
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(&text);
    truncate_summary(sentence, max)
}

/// First candidate that is not blank, like a chain of `a || b || c` over
/// optional strings.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|c| !c.trim().is_empty())
}
