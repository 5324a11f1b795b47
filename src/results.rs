use serde::{Deserialize, Serialize};

/// Description stamped onto a listing whose detail page could not be read
pub const DESCRIPTION_SENTINEL: &str = "Failed to scrape description";

/// A listing as read from an index-page card
///
/// Every field is always present; anything the card did not carry is an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialListing {
    pub title: String,
    pub price: String,
    pub location: String,
    pub image_url: String,
    pub specific_property_type: String,
    pub property_type: String,
    pub source_url: String,
    pub listing_url: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_footage: String,
    pub description: String,
}

/// Identity used to deduplicate listings across index pages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub title: String,
    pub listing_url: String,
}

impl PartialListing {
    pub fn key(&self) -> ListingKey {
        ListingKey {
            title: self.title.clone(),
            listing_url: self.listing_url.clone(),
        }
    }

    /// Finalize the description; an empty one becomes the sentinel
    pub fn complete(mut self, description: &str) -> CompletedListing {
        let description = description.trim();
        self.description = if description.is_empty() {
            DESCRIPTION_SENTINEL.to_string()
        } else {
            description.to_string()
        };
        CompletedListing(self)
    }

    /// Finalize with the sentinel description
    pub fn fail(self) -> CompletedListing {
        self.complete("")
    }
}

/// A listing whose description has been settled; the unit handed to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedListing(PartialListing);

impl CompletedListing {
    pub fn listing(&self) -> &PartialListing {
        &self.0
    }

    pub fn description(&self) -> &str {
        &self.0.description
    }

    pub fn key(&self) -> ListingKey {
        self.0.key()
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub index_pages: usize,
    pub detail_pages: usize,
    pub listings_emitted: usize,
    pub retries: usize,
    /// (URL, error) for every request that exhausted its retries
    pub failures: Vec<(String, String)>,
}

impl CrawlReport {
    /// Requests that reached a successful terminal state
    pub fn succeeded(&self) -> usize {
        self.index_pages + self.detail_pages
    }

    pub fn merge(&mut self, other: CrawlReport) {
        self.index_pages += other.index_pages;
        self.detail_pages += other.detail_pages;
        self.listings_emitted += other.listings_emitted;
        self.retries += other.retries;
        self.failures.extend(other.failures);
    }
}
