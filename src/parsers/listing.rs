use crate::classifier::{PropertyCategory, resolve_href};
use crate::config::Selectors;
use crate::parsers::text::{first_grouped_number, first_number, inline_text};
use crate::results::PartialListing;
use scraper::{ElementRef, Html, Selector};

/// Tokens that mark a paragraph as carrying the floor area
const AREA_TOKENS: [&str; 3] = ["sqft", "sq ft", "square feet"];

/// Everything read from one rendered index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    pub category: PropertyCategory,
    pub listings: Vec<PartialListing>,
    /// Resolved target of the "next page" control, if the page has one
    pub next_page: Option<String>,
}

/// Parse a rendered index page
pub fn parse_index_page(html: &str, page_url: &str, selectors: &Selectors) -> IndexPage {
    let doc = Html::parse_document(html);

    let label = doc
        .select(&selectors.category)
        .next()
        .map(inline_text)
        .unwrap_or_default();
    let category = PropertyCategory::from_label(&label);
    ::log::debug!("Category control reads {:?} -> {:?}", label, category);

    let listings = extract_listings(&doc, selectors, page_url, category.as_str()).collect();

    let next_page = doc
        .select(&selectors.next_page)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve_href(page_url, href));

    IndexPage {
        category,
        listings,
        next_page,
    }
}

/// Read one listing per card in document order.
///
/// The iterator borrows the document and is single-pass.
pub fn extract_listings<'a>(
    doc: &'a Html,
    selectors: &'a Selectors,
    source_url: &'a str,
    property_type: &'a str,
) -> impl Iterator<Item = PartialListing> + 'a {
    doc.select(&selectors.card)
        .map(move |card| read_card(card, selectors, source_url, property_type))
}

fn read_card(
    card: ElementRef<'_>,
    selectors: &Selectors,
    source_url: &str,
    property_type: &str,
) -> PartialListing {
    let image_url = card
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| resolve_href(source_url, src))
        .unwrap_or_default();

    let link = card.select(&selectors.link).next();
    let full_title = link
        .and_then(|a| a.value().attr("title"))
        .map(str::trim)
        .unwrap_or_default();
    let listing_url = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_href(source_url, href))
        .unwrap_or_default();

    let paragraphs = card.select(&selectors.paragraph).map(inline_text);

    PartialListing {
        title: first_text(card, &selectors.title),
        price: first_text(card, &selectors.price),
        location: first_text(card, &selectors.location),
        image_url,
        specific_property_type: specific_property_type(full_title),
        property_type: property_type.to_string(),
        source_url: source_url.to_string(),
        listing_url,
        bedrooms: count_in_title(full_title, "Bedroom"),
        bathrooms: count_in_title(full_title, "Bathroom"),
        square_footage: square_footage(paragraphs),
        description: String::new(),
    }
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(inline_text)
        .unwrap_or_default()
}

/// Text before the first `-` of the card's full title
pub fn specific_property_type(full_title: &str) -> String {
    full_title
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Number in the first `-`-separated title segment mentioning `token`
pub fn count_in_title(full_title: &str, token: &str) -> String {
    full_title
        .split('-')
        .map(str::trim)
        .find(|segment| segment.contains(token))
        .and_then(first_number)
        .unwrap_or_default()
}

/// Floor area from the first paragraph that mentions one
pub fn square_footage<I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = String>,
{
    paragraphs
        .into_iter()
        .map(|text| text.to_lowercase())
        .find(|text| AREA_TOKENS.iter().any(|token| text.contains(token)))
        .and_then(|text| first_grouped_number(&text))
        .unwrap_or_default()
}
