pub mod matches;
pub mod participants;
pub mod tournaments;

// ── Tests ──
