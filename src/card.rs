//! Card domain data: match records, season summaries, and export metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which kind of card is being composed. Drives layout legality and the
/// exported filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardMode {
    /// A single match result.
    Match,
    /// An aggregate (season or tournament) recap.
    Season,
}

impl CardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardMode::Match => "match",
            CardMode::Season => "season",
        }
    }
}

impl std::fmt::Display for CardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled value for the footer stats strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub label: String,
    pub value: String,
}

/// Result of a match derived from the goal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Win => "WIN",
            MatchOutcome::Draw => "DRAW",
            MatchOutcome::Loss => "LOSS",
        }
    }
}

/// A single played match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub opponent: String,
    #[serde(default)]
    pub competition: Option<String>,
    pub date: NaiveDate,
    pub goals_for: u8,
    pub goals_against: u8,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub man_of_the_match: bool,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub stats: Vec<StatLine>,
}

impl MatchRecord {
    pub fn outcome(&self) -> MatchOutcome {
        match self.goals_for.cmp(&self.goals_against) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        }
    }

    /// "3 – 1" style score line.
    pub fn score_line(&self) -> String {
        format!("{} – {}", self.goals_for, self.goals_against)
    }
}

/// An aggregate recap over a season or tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub title: String,
    pub played: u16,
    pub wins: u16,
    pub draws: u16,
    pub losses: u16,
    #[serde(default)]
    pub goals: u16,
    #[serde(default)]
    pub assists: u16,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub stats: Vec<StatLine>,
}

impl SeasonSummary {
    /// "12W 3D 5L" record line.
    pub fn record_line(&self) -> String {
        format!("{}W {}D {}L", self.wins, self.draws, self.losses)
    }
}

/// The domain payload a card is composed from.
#[derive(Debug, Clone, PartialEq)]
pub enum CardData {
    Match(MatchRecord),
    Season(SeasonSummary),
}

impl CardData {
    pub fn mode(&self) -> CardMode {
        match self {
            CardData::Match(_) => CardMode::Match,
            CardData::Season(_) => CardMode::Season,
        }
    }
}

/// Inputs the dispatcher needs to name the exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct CardMetadata {
    /// Key date: the match date for single-match cards.
    pub date: NaiveDate,
    /// Key title: slugified for aggregate cards.
    pub title: String,
    /// Which coupled visibility preset the card was exported under, if any.
    pub view: Option<crate::config::ViewPreset>,
}

/// Injected time source so composition stays deterministic under test.
/// The footer timestamp is the only time-dependent output.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A pinned date for tests and reproducible output.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
