use crate::parsers::text::block_text;
use scraper::{Html, Selector};

/// Description text of a rendered detail page.
///
/// Empty when the container is missing or blank; the caller decides what to
/// record instead.
pub fn extract_description(html: &str, container: &Selector) -> String {
    let doc = Html::parse_document(html);
    doc.select(container)
        .next()
        .map(block_text)
        .unwrap_or_default()
}
