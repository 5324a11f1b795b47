//! Extraction from rendered page HTML
//!
//! Parsing is synchronous: a parsed document never lives across an await.

pub mod detail;
pub mod listing;
pub mod text;

#[cfg(test)]
mod tests;

pub use detail::extract_description;
pub use listing::{IndexPage, extract_listings, parse_index_page};
