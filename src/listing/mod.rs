// src/listing/mod.rs
// =============================================================================
// This module turns a directory listing page into a list of filenames.
//
// Submodules:
// - html: The CSS-selector based parser for GitHub's listing markup
//
// The mirror pipeline only ever talks to the ListingParser trait, so when the
// hosting site changes its markup we swap the parser, not the pipeline.
// =============================================================================

mod html;

use serde::Serialize;

pub use html::{SelectorListingParser, DEFAULT_SELECTOR};

/// One file discovered in a directory listing.
///
/// Only the name is captured; the listing page carries no size or hash we
/// could trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Anything that can pull entries out of a listing page's HTML.
///
/// Implementations must return entries in document order and must never
/// fail: a page with no matching rows is an empty listing.
pub trait ListingParser {
    fn parse(&self, html: &str) -> Vec<Entry>;
}
