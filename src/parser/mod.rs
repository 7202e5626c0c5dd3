pub mod dates;
pub mod extract;
pub mod markup;

use dates::DateResolver;
use extract::{matches, tournaments};
use markup::Fragment;

use crate::model::{Match, MatchPolicy};
use tournaments::ListingEntry;

const LISTING_ENTRY: &str = "div.events-container-col a";

/// Listing page → owned entries, in document order.
pub fn parse_listing_page(html: &str) -> Vec<ListingEntry> {
    let document = markup::parse_document(html);
    document
        .root_element()
        .find_all(LISTING_ENTRY)
        .iter()
        .map(tournaments::read_entry)
        .collect()
}

/// Event matches page → matches, in document order.
pub fn parse_matches_page(html: &str, resolver: &DateResolver, policy: MatchPolicy) -> Vec<Match> {
    let document = markup::parse_document(html);
    matches::extract_all(&document.root_element(), resolver, policy)
}
