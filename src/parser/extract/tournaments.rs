use tracing::{info, warn};

use crate::fetch::PageFetcher;
use crate::model::{Tournament, TournamentInfo};
use crate::parser::dates::{DateParseError, DateResolver};
use crate::parser::markup::Fragment;
use crate::parser::parse_matches_page;
use crate::settings::Settings;

const TITLE: &str = ".event-item-title";
const STATUS: &str = ".event-item-desc-item-status";
const PRIZE: &str = ".event-item-desc-item.mod-prize";
const DATES: &str = ".event-item-desc-item.mod-dates";
const REGION_ICON: &str = ".event-item-desc-item.mod-location i";

const EVENT_MARKER: &str = "/event/";
const MATCHES_PATH: &str = "/event/matches/";
const REGION_PREFIX: &str = "mod-";

/// Owned copy of one listing entry, so no DOM is held while the sub-page is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub status: String,
    pub prize_pool: String,
    pub dates: String,
    pub region_class: Option<String>,
    pub href: String,
}

pub fn read_entry<F: Fragment>(entry: &F) -> ListingEntry {
    ListingEntry {
        title: entry.select_text(TITLE),
        status: entry.select_text(STATUS),
        // label divs ("Prize Pool", "Dates") are nested children; keep only the value
        prize_pool: entry.select_own_text(PRIZE),
        dates: entry.select_own_text(DATES),
        region_class: entry
            .find_first(REGION_ICON)
            .and_then(|icon| icon.attribute("class")),
        href: entry.attribute("href").unwrap_or_default(),
    }
}

/// Last class token with the `mod-` prefix removed, e.g. `"flag mod-cn"` → `"cn"`.
/// A token without the prefix is kept as-is.
pub fn region_code(class_attr: Option<&str>) -> String {
    class_attr
        .and_then(|classes| classes.split_whitespace().last())
        .map(|token| token.strip_prefix(REGION_PREFIX).unwrap_or(token).to_string())
        .unwrap_or_default()
}

/// `/event/2096/some-slug` → `<base>/event/matches/2096/some-slug`.
pub fn matches_url(base: &str, href: &str) -> Option<String> {
    let (_, rest) = href.split_once(EVENT_MARKER)?;
    if rest.is_empty() {
        return None;
    }
    Some(format!("{}{}{}", base.trim_end_matches('/'), MATCHES_PATH, rest))
}

fn page_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), href)
    }
}

/// Build a tournament and its matches.
///
/// The date range must resolve; anything wrong with the matches page only
/// leaves the tournament without matches.
pub async fn extract<P: PageFetcher>(
    entry: &ListingEntry,
    resolver: &DateResolver,
    fetcher: &P,
    settings: &Settings,
) -> Result<Tournament, DateParseError> {
    let (start, end) = resolver.resolve_range(&entry.dates)?;

    let matches = match matches_url(&settings.base_url, &entry.href) {
        Some(url) => match fetcher.fetch(&url).await {
            Ok(html) => parse_matches_page(&html, resolver, settings.match_policy()),
            Err(e) => {
                warn!(title = %entry.title, url = %url, error = %e, "matches page unavailable; keeping tournament without matches");
                Vec::new()
            }
        },
        None => {
            warn!(title = %entry.title, href = %entry.href, "no event path in link; keeping tournament without matches");
            Vec::new()
        }
    };

    let info = TournamentInfo {
        title: entry.title.clone(),
        status: entry.status.clone(),
        prize_pool: entry.prize_pool.clone(),
        region: region_code(entry.region_class.as_deref()),
        url: page_url(&settings.base_url, &entry.href),
    };
    let tournament = Tournament::new(info, start, end, matches, settings.tournament_alarm_minutes);

    info!(
        title = %tournament.title,
        start = %tournament.start,
        end = %tournament.end,
        status = %tournament.status,
        region = %tournament.region,
        matches = tournament.matches.len(),
        "extracted tournament"
    );
    Ok(tournament)
}
