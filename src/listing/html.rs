// src/listing/html.rs
// =============================================================================
// This module extracts filenames from a GitHub directory listing page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// GitHub renders each listing row's filename as an anchor inside a truncating
// span. That markup is not a documented contract, which is why the selector
// can be overridden from the command line.
// =============================================================================

use scraper::{Html, Selector};
use thiserror::Error;

use super::{Entry, ListingParser};

/// Selector matching the filename anchors of a GitHub tree listing row.
pub const DEFAULT_SELECTOR: &str =
    "span.css-truncate.css-truncate-target a[class^=js-navigation-open]";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("invalid listing selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// A ListingParser driven by a single CSS selector.
///
/// The selector is compiled once, when the parser is built, so a typo in a
/// `--selector` override is reported before any network traffic happens.
#[derive(Debug, Clone)]
pub struct SelectorListingParser {
    selector: Selector,
}

impl SelectorListingParser {
    pub fn new(css: &str) -> Result<Self, ListingError> {
        // scraper's parse error borrows the input, so we flatten it to a String
        let selector = Selector::parse(css).map_err(|e| ListingError::InvalidSelector {
            selector: css.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { selector })
    }
}

impl Default for SelectorListingParser {
    fn default() -> Self {
        // DEFAULT_SELECTOR is a constant we control, so it always compiles
        Self::new(DEFAULT_SELECTOR).expect("default listing selector is valid CSS")
    }
}

impl ListingParser for SelectorListingParser {
    // Walks the matched anchors in document order and keeps their visible text
    //
    // Example:
    //   <span class="css-truncate css-truncate-target">
    //     <a class="js-navigation-open Link--primary">Arduino.h</a>
    //   </span>
    //   -> [Entry { name: "Arduino.h" }]
    fn parse(&self, html: &str) -> Vec<Entry> {
        let document = Html::parse_document(html);

        document
            .select(&self.selector)
            .filter_map(|anchor| {
                // An anchor's text can be split across several text nodes
                let text: String = anchor.text().collect();
                let name = text.trim();

                if name.is_empty() {
                    None
                } else {
                    Some(Entry::new(name))
                }
            })
            .collect()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why compile the selector in new()?
//    - Selector::parse can fail if the CSS is invalid
//    - Doing it once up front means parse() itself can never fail
//    - The error is converted into our own ListingError type
//
// 2. What does anchor.text() return?
//    - An iterator over every text node under the element
//    - collect::<String>() glues them together
//    - trim() removes the whitespace GitHub puts around the name
//
// 3. Why filter_map?
//    - It filters and transforms in one step
//    - Returning None drops the item, Some(x) keeps x
// -----------------------------------------------------------------------------
