use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a two-way market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Team1,
    Team2,
}

impl Side {
    /// Parse the `winner` code used by result files (1 or 2)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Side::Team1),
            2 => Some(Side::Team2),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Side::Team1 => Side::Team2,
            Side::Team2 => Side::Team1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Team1 => write!(f, "team1"),
            Side::Team2 => write!(f, "team2"),
        }
    }
}

/// Odds row as published by a bookmaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsRecord {
    pub bookmaker: Option<String>,
    pub commence_time: DateTime<Utc>,
    pub team1: String,
    pub team2: String,
    pub team1_odds: f64,
    pub team2_odds: f64,
}

/// Settled match result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub date: NaiveDate,
    pub team1: String,
    pub team2: String,
    pub winner: Side,
    #[serde(default)]
    pub duration: Option<String>,
}

/// Match with offered odds and (once settled) its winner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub bookmaker: Option<String>,
    pub commence_time: DateTime<Utc>,
    pub date: NaiveDate,
    pub team1: String,
    pub team2: String,
    pub team1_odds: f64,
    pub team2_odds: f64,
    pub winner: Option<Side>,
}

impl Match {
    pub fn new(
        commence_time: DateTime<Utc>,
        team1: impl Into<String>,
        team2: impl Into<String>,
        team1_odds: f64,
        team2_odds: f64,
        winner: Option<Side>,
    ) -> Self {
        let team1 = team1.into();
        let team2 = team2.into();
        let date = commence_time.date_naive();
        Self {
            id: Self::make_id(date, &team1, &team2),
            bookmaker: None,
            commence_time,
            date,
            team1,
            team2,
            team1_odds,
            team2_odds,
            winner,
        }
    }

    /// Stable identifier: `2024-01-17:T1-vs-Gen.G`
    pub fn make_id(date: NaiveDate, team1: &str, team2: &str) -> String {
        format!("{}:{}-vs-{}", date, team1, team2)
    }

    pub fn odds_for(&self, side: Side) -> f64 {
        match side {
            Side::Team1 => self.team1_odds,
            Side::Team2 => self.team2_odds,
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Team1 => &self.team1,
            Side::Team2 => &self.team2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

/// A settled wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub sequence: usize,
    pub match_id: String,
    pub commence_time: DateTime<Utc>,
    pub date: NaiveDate,
    pub team1: String,
    pub team2: String,
    pub side: Side,
    pub team_backed: String,
    pub odds: f64,
    pub predicted_probability: f64,
    pub implied_probability: f64,
    pub edge: f64,
    pub stake_fraction: f64,
    pub stake: f64,
    pub outcome: Outcome,
    pub profit: f64,
    pub bankroll_before: f64,
    pub bankroll_after: f64,
}

impl Bet {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Win
    }
}

/// Bankroll snapshot written once per settled bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    pub sequence: usize,
    pub timestamp: DateTime<Utc>,
    pub match_id: String,
    pub bankroll: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_side_codes() {
        assert_eq!(Side::from_code(1), Some(Side::Team1));
        assert_eq!(Side::from_code(2), Some(Side::Team2));
        assert_eq!(Side::from_code(0), None);
        assert_eq!(Side::from_code(3), None);
        assert_eq!(Side::Team1.other(), Side::Team2);
    }

    #[test]
    fn test_match_accessors() {
        let time = Utc.with_ymd_and_hms(2024, 1, 17, 8, 0, 0).unwrap();
        let m = Match::new(time, "T1", "Gen.G", 1.8, 2.1, Some(Side::Team1));

        assert_eq!(m.id, "2024-01-17:T1-vs-Gen.G");
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert!((m.odds_for(Side::Team2) - 2.1).abs() < 1e-12);
        assert_eq!(m.team(Side::Team2), "Gen.G");
    }

    #[test]
    fn test_side_serialization() {
        let json = serde_json::to_string(&Side::Team1).unwrap();
        assert_eq!(json, "\"team1\"");
        let outcome: Outcome = serde_json::from_str("\"loss\"").unwrap();
        assert_eq!(outcome, Outcome::Loss);
    }
}
