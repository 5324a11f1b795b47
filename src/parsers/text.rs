use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static GROUPED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid regex"));

/// Text of an element with all whitespace runs collapsed to single spaces
pub fn inline_text(element: ElementRef<'_>) -> String {
    normalize_whitespace_in_segment(&element.text().collect::<String>())
}

/// Text of an element with its line structure kept.
///
/// Lines are trimmed, consecutive lines form a paragraph, and any run of
/// blank lines becomes exactly one paragraph break.
pub fn block_text(element: ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();
    let paragraphs = split_into_paragraphs(&raw);
    join_paragraphs(&paragraphs)
}

/// Splits text into paragraphs based on empty lines
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<String>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = normalize_whitespace_in_segment(line);
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

fn join_paragraphs(paragraphs: &[Vec<String>]) -> String {
    paragraphs
        .iter()
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Normalizes whitespace within a single line or paragraph
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First run of digits in `text`
pub fn first_number(text: &str) -> Option<String> {
    NUMBER.find(text).map(|m| m.as_str().to_string())
}

/// First digit group in `text`, thousands separators removed
pub fn first_grouped_number(text: &str) -> Option<String> {
    GROUPED_NUMBER
        .find(text)
        .map(|m| m.as_str().trim_end_matches(',').replace(',', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("2 Bedroom").as_deref(), Some("2"));
        assert_eq!(first_number("Studio 12 floor 3").as_deref(), Some("12"));
        assert_eq!(first_number("Studio"), None);
    }

    #[test]
    fn test_first_grouped_number() {
        assert_eq!(first_grouped_number("area: 1,250 sqft").as_deref(), Some("1250"));
        assert_eq!(first_grouped_number("12,500,000 sq ft").as_deref(), Some("12500000"));
        assert_eq!(first_grouped_number("850, sqft").as_deref(), Some("850"));
        assert_eq!(first_grouped_number("sqft"), None);
    }

    #[test]
    fn test_split_into_paragraphs() {
        assert!(split_into_paragraphs("").is_empty());
        assert!(split_into_paragraphs("  \n\t\n ").is_empty());

        let result = split_into_paragraphs("  Line 1a \nLine   1b\n\n\n\nLine 2");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], vec!["Line 1a", "Line 1b"]);
        assert_eq!(result[1], vec!["Line 2"]);
    }

    #[test]
    fn test_normalize_whitespace_in_segment() {
        assert_eq!(
            normalize_whitespace_in_segment("  AED \n 1,200,000\t"),
            "AED 1,200,000"
        );
    }
}
