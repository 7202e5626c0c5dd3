use std::num::NonZeroU32;

use serde::Serialize;

use crate::parser::dates::CalendarTimestamp;

pub const PLACEHOLDER_NAME: &str = "TBD";

const UPCOMING: &str = "upcoming";
const ALARM_SOUND: &str = "Glass";

pub fn is_upcoming(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case(UPCOMING)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub name: String,
    pub score: u32,
    pub is_winner: bool,
}

impl Participant {
    pub fn new(name: &str, score: u32, is_winner: bool) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() {
                PLACEHOLDER_NAME.to_string()
            } else {
                name.to_string()
            },
            score,
            is_winner,
        }
    }
}

impl Default for Participant {
    fn default() -> Self {
        Self::new("", 0, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmAction {
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alarm {
    pub action: AlarmAction,
    pub minutes_before: u32,
    pub attach: String,
}

impl Alarm {
    pub fn audio(minutes_before: u32) -> Self {
        Self {
            action: AlarmAction::Audio,
            minutes_before,
            attach: ALARM_SOUND.to_string(),
        }
    }

    /// Reminders are only set for events that have not started yet.
    pub fn for_status(status: &str, minutes_before: u32) -> Option<Self> {
        is_upcoming(status).then(|| Self::audio(minutes_before))
    }
}

/// How matches are timed and reminded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub duration_minutes: NonZeroU32,
    pub alarm_minutes: u32,
}

/// Raw text read off a match fragment, before synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchInfo {
    pub status: String,
    pub eta: String,
    pub series: String,
    pub event: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub title: String,
    pub description: String,
    pub start: CalendarTimestamp,
    pub end: CalendarTimestamp,
    pub participants: [Participant; 2],
    pub status: String,
    pub series: String,
    pub event: String,
    pub eta: String,
    pub tags: Vec<String>,
    pub reminder: Option<Alarm>,
}

impl Match {
    pub fn new(
        participants: [Participant; 2],
        start: CalendarTimestamp,
        info: MatchInfo,
        policy: MatchPolicy,
    ) -> Self {
        let end = start.plus_minutes(i64::from(policy.duration_minutes.get()));
        let description = [info.series.trim(), info.event.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            title: match_title(&participants),
            description,
            start,
            end,
            reminder: Alarm::for_status(&info.status, policy.alarm_minutes),
            participants,
            status: info.status,
            series: info.series,
            event: info.event,
            eta: info.eta,
            tags: info.tags,
        }
    }
}

/// `"A vs B"`, with `" - 2 : 0"` once either side has scored.
fn match_title(participants: &[Participant; 2]) -> String {
    let [a, b] = participants;
    let mut title = format!("{} vs {}", a.name, b.name);
    if a.score != 0 || b.score != 0 {
        title.push_str(&format!(" - {} : {}", a.score, b.score));
    }
    title
}

/// Listing-level text for one tournament.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentInfo {
    pub title: String,
    pub status: String,
    pub prize_pool: String,
    pub region: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tournament {
    pub title: String,
    pub description: String,
    pub start: CalendarTimestamp,
    pub end: CalendarTimestamp,
    pub region: String,
    pub status: String,
    pub prize_pool: String,
    pub url: String,
    pub matches: Vec<Match>,
    pub reminder: Option<Alarm>,
}

impl Tournament {
    pub fn new(
        info: TournamentInfo,
        start: CalendarTimestamp,
        end: CalendarTimestamp,
        matches: Vec<Match>,
        alarm_minutes: u32,
    ) -> Self {
        let description = format!(
            "Prize Pool: {} | Status: {} | Region: {}",
            info.prize_pool, info.status, info.region
        );
        Self {
            title: info.title,
            description,
            start,
            end,
            reminder: Alarm::for_status(&info.status, alarm_minutes),
            region: info.region,
            status: info.status,
            prize_pool: info.prize_pool,
            url: info.url,
            matches,
        }
    }

    /// Matches starting more than a day before the first day or more than a day
    /// after the last day ends. `end` is midnight at the start of the last day.
    pub fn matches_outside_range(&self) -> usize {
        const DAY_MINUTES: i64 = 24 * 60;
        let last_day_over = self.end.plus_minutes(DAY_MINUTES);
        let lo = self.start.minus_minutes(DAY_MINUTES);
        let hi = last_day_over.plus_minutes(DAY_MINUTES);
        self.matches
            .iter()
            .filter(|m| m.start < lo || m.start > hi)
            .count()
    }
}

/// Tournaments in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub tournaments: Vec<Tournament>,
}

impl Schedule {
    pub fn new(tournaments: Vec<Tournament>) -> Self {
        Self { tournaments }
    }

    pub fn match_count(&self) -> usize {
        self.tournaments.iter().map(|t| t.matches.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32) -> CalendarTimestamp {
        CalendarTimestamp::new(y, m, d, h, mi).unwrap()
    }

    fn policy() -> MatchPolicy {
        MatchPolicy {
            duration_minutes: NonZeroU32::new(120).unwrap(),
            alarm_minutes: 30,
        }
    }

    fn info(status: &str) -> MatchInfo {
        MatchInfo {
            status: status.into(),
            series: " Playoffs ".into(),
            event: "Masters Madrid".into(),
            ..Default::default()
        }
    }

    #[test]
    fn participant_defaults() {
        let p = Participant::default();
        assert_eq!(p.name, "TBD");
        assert_eq!(p.score, 0);
        assert!(!p.is_winner);
        assert_eq!(Participant::new("   ", 3, true).name, "TBD");
    }

    #[test]
    fn match_end_is_start_plus_duration() {
        let start = ts(2024, 1, 15, 23, 0);
        let m = Match::new(Default::default(), start, info("Upcoming"), policy());
        assert_eq!(m.end, ts(2024, 1, 16, 1, 0));
        assert_eq!(m.end.naive() - m.start.naive(), chrono::TimeDelta::minutes(120));
    }

    #[test]
    fn title_suffix_only_with_scores() {
        let start = ts(2024, 1, 15, 14, 0);
        let upcoming = Match::new(
            [Participant::new("Team A", 0, false), Participant::new("Team B", 0, false)],
            start,
            info("Upcoming"),
            policy(),
        );
        assert_eq!(upcoming.title, "Team A vs Team B");

        let one_sided = Match::new(
            [Participant::new("Team A", 0, false), Participant::new("Team B", 1, false)],
            start,
            info("LIVE"),
            policy(),
        );
        assert_eq!(one_sided.title, "Team A vs Team B - 0 : 1");
    }

    #[test]
    fn description_joins_series_and_event() {
        let m = Match::new(Default::default(), ts(2024, 1, 1, 0, 0), info(""), policy());
        assert_eq!(m.description, "Playoffs Masters Madrid");
        let bare = Match::new(Default::default(), ts(2024, 1, 1, 0, 0), MatchInfo::default(), policy());
        assert_eq!(bare.description, "");
        assert_eq!(bare.title, "TBD vs TBD");
    }

    #[test]
    fn match_alarm_only_when_upcoming() {
        let start = ts(2024, 1, 15, 14, 0);
        for status in ["upcoming", "Upcoming", "UPCOMING"] {
            let m = Match::new(Default::default(), start, info(status), policy());
            assert_eq!(m.reminder, Some(Alarm::audio(30)), "{status}");
        }
        for status in ["live", "completed", "", "upcoming soon"] {
            let m = Match::new(Default::default(), start, info(status), policy());
            assert_eq!(m.reminder, None, "{status}");
        }
    }

    #[test]
    fn tournament_alarm_only_when_upcoming() {
        let mk = |status: &str| {
            Tournament::new(
                TournamentInfo {
                    status: status.into(),
                    ..Default::default()
                },
                ts(2024, 1, 10, 0, 0),
                ts(2024, 1, 28, 0, 0),
                vec![],
                60,
            )
        };
        assert_eq!(mk("Upcoming").reminder.map(|a| a.minutes_before), Some(60));
        assert_eq!(mk("ongoing").reminder, None);
        assert_eq!(mk("completed").reminder, None);
    }

    #[test]
    fn tournament_description() {
        let t = Tournament::new(
            TournamentInfo {
                title: "Champions Tour 2024".into(),
                status: "ongoing".into(),
                prize_pool: "$1,000,000".into(),
                region: "cn".into(),
                url: String::new(),
            },
            ts(2024, 1, 10, 0, 0),
            ts(2024, 1, 28, 0, 0),
            vec![],
            60,
        );
        assert_eq!(t.description, "Prize Pool: $1,000,000 | Status: ongoing | Region: cn");
    }

    #[test]
    fn outside_range_counts_stray_matches() {
        let inside = Match::new(Default::default(), ts(2024, 1, 28, 20, 0), info(""), policy());
        let stray = Match::new(Default::default(), ts(2024, 3, 1, 12, 0), info(""), policy());
        let t = Tournament::new(
            TournamentInfo::default(),
            ts(2024, 1, 10, 0, 0),
            ts(2024, 1, 28, 0, 0),
            vec![inside, stray],
            60,
        );
        assert_eq!(t.matches_outside_range(), 1);
    }

    #[test]
    fn outside_range_allows_one_day_either_side() {
        let at = |y, m, d, h, mi| Match::new(Default::default(), ts(y, m, d, h, mi), info(""), policy());
        let t = Tournament::new(
            TournamentInfo::default(),
            ts(2024, 1, 10, 0, 0),
            ts(2024, 1, 28, 0, 0),
            vec![
                // last day, late evening
                at(2024, 1, 28, 23, 30),
                // exactly one day before the first day
                at(2024, 1, 9, 0, 0),
                // exactly one day after the last day ends
                at(2024, 1, 30, 0, 0),
                at(2024, 1, 30, 0, 1),
                at(2024, 1, 8, 23, 59),
            ],
            60,
        );
        assert_eq!(t.matches_outside_range(), 2);
    }
}
