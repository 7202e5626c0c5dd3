use tracing::{info, warn};

use super::participants;
use crate::model::{Match, MatchInfo, MatchPolicy};
use crate::parser::dates::{DateParseError, DateResolver};
use crate::parser::markup::Fragment;

const CARD: &str = ".wf-card";
const DAY_LABEL: &str = ".wf-label.mod-large";
const MATCH_ITEM: &str = ".match-item";
const TIME: &str = ".match-item-time";
const STATUS: &str = ".ml-status";
const ETA: &str = ".ml-eta";
const SERIES: &str = ".match-item-event-series";
const EVENT: &str = ".match-item-event";
const VOD_TAG: &str = ".match-item-vod .wf-tag";

/// Extract one match. `day_label` is the heading of the card the match sits in.
pub fn extract<F: Fragment>(
    item: &F,
    day_label: &str,
    resolver: &DateResolver,
    policy: MatchPolicy,
) -> Result<Match, DateParseError> {
    let start = resolver.resolve_datetime(day_label, &item.select_text(TIME))?;
    let participants = participants::extract_pair(item);

    let info = MatchInfo {
        status: item.select_text(STATUS),
        eta: item.select_text(ETA),
        series: item.select_text(SERIES),
        // the series is nested inside the event block; only the trailing text is the event name
        event: item.select_own_text(EVENT),
        tags: item
            .find_all(VOD_TAG)
            .iter()
            .map(|tag| tag.text_content())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };

    Ok(Match::new(participants, start, info, policy))
}

/// Walk every day card on an event's matches page.
///
/// A match whose date cannot be resolved is logged and skipped; its
/// siblings are still extracted.
pub fn extract_all<F: Fragment>(
    root: &F,
    resolver: &DateResolver,
    policy: MatchPolicy,
) -> Vec<Match> {
    let mut matches = Vec::new();

    for card in root.find_all(CARD) {
        let day_label = card
            .prev_sibling(DAY_LABEL)
            .map(|label| label.own_text())
            .unwrap_or_default();

        for item in card.find_all(MATCH_ITEM) {
            match extract(&item, &day_label, resolver, policy) {
                Ok(m) => {
                    info!(
                        title = %m.title,
                        start = %m.start,
                        status = %m.status,
                        description = %m.description,
                        "extracted match"
                    );
                    matches.push(m);
                }
                Err(e) => {
                    warn!(day = %day_label, error = %e, "skipping match with unreadable date");
                }
            }
        }
    }

    matches
}
