use url::Url;

/// Which kind of page a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// Paginated search results with many listing cards
    Index,
    /// A single property
    Detail,
}

/// Routes URLs to index or detail handling by a reserved path marker
#[derive(Debug, Clone)]
pub struct Classifier {
    detail_marker: String,
}

impl Classifier {
    pub fn new(detail_marker: impl Into<String>) -> Self {
        Self {
            detail_marker: detail_marker.into(),
        }
    }

    /// A URL whose path carries the detail marker is a detail page; anything
    /// else, including URLs that fail to parse, is an index page.
    pub fn classify(&self, url: &str) -> PageKind {
        let is_detail = match Url::parse(url) {
            Ok(parsed) => parsed.path().contains(&self.detail_marker),
            Err(_) => url.contains(&self.detail_marker),
        };

        if is_detail {
            ::log::trace!("Classifying as Detail: {}", url);
            PageKind::Detail
        } else {
            ::log::trace!("Classifying as Index: {}", url);
            PageKind::Index
        }
    }
}

/// Category stamped onto every listing found on an index page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCategory {
    Buy,
    CommercialBuy,
    Rent,
    CommercialRent,
    Unknown,
}

impl PropertyCategory {
    /// Map the caption of the category filter control to a category
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        let commercial = label.contains("commercial");

        if label.contains("buy") {
            if commercial {
                PropertyCategory::CommercialBuy
            } else {
                PropertyCategory::Buy
            }
        } else if label.contains("rent") {
            if commercial {
                PropertyCategory::CommercialRent
            } else {
                PropertyCategory::Rent
            }
        } else {
            PropertyCategory::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyCategory::Buy => "Buy",
            PropertyCategory::CommercialBuy => "Commercial Buy",
            PropertyCategory::Rent => "Rent",
            PropertyCategory::CommercialRent => "Commercial Rent",
            PropertyCategory::Unknown => "",
        }
    }
}

/// Canonical form used for queue deduplication (fragment dropped)
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// Resolve `href` against the page it was found on
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(|u| u.to_string()),
        Err(_) => Url::parse(href).ok().map(|u| u.to_string()),
    }
}
