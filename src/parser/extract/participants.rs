use crate::model::Participant;
use crate::parser::markup::Fragment;

const TEAM: &str = ".match-item-vs-team";
const TEAM_NAME: &str = ".match-item-vs-team-name .text-of";
const TEAM_SCORE: &str = ".match-item-vs-team-score";
const WINNER_CLASS: &str = "mod-winner";

/// Read one team block. Missing names become "TBD" and unreadable scores 0.
pub fn extract<F: Fragment>(team: &F) -> Participant {
    let name = team.select_text(TEAM_NAME);
    let score = parse_score(&team.select_text(TEAM_SCORE));
    Participant::new(&name, score, team.has_class(WINNER_CLASS))
}

/// Both sides of a match, padded with placeholders when the markup has fewer.
pub fn extract_pair<F: Fragment>(item: &F) -> [Participant; 2] {
    let mut teams = item.find_all(TEAM).into_iter().map(|team| extract(&team));
    let first = teams.next().unwrap_or_default();
    let second = teams.next().unwrap_or_default();
    [first, second]
}

/// Leading digits only: "2" → 2, "–" → 0, "13 (OT)" → 13.
fn parse_score(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}
