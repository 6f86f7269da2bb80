//! Raw image reference scanning
//!
//! Renderers hand us destinations exactly as written, so this scanner returns
//! the destination text before any escape processing.

use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"!\[(?P<alt>(?:\\.|[^\]\\])*)\]\(\s*(?P<dest><(?:\\.|[^<>\\\n])*>|(?:\\.|[^\s()\\]|\((?:\\.|[^\s()\\])*\))*)(?:\s+(?:"[^"]*"|'[^']*'|\([^)]*\)))?\s*\)"#,
    )
    .expect("image reference pattern is valid")
});

/// An inline image reference found in markdown text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Alt text as written
    pub alt_text: String,
    /// Destination before escape processing
    pub raw_destination: String,
    /// Byte offset of the `!` in the source text
    pub offset: usize,
}

/// Find all inline `![alt](destination "title")` references in document order.
pub fn extract_image_references(markdown: &str) -> Vec<ImageReference> {
    IMAGE_REFERENCE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ImageReference {
                alt_text: caps.name("alt").map(|m| m.as_str().to_string()).unwrap_or_default(),
                raw_destination: caps
                    .name("dest")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                offset: whole.start(),
            })
        })
        .collect()
}
