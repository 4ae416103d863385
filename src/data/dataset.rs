//! Merge odds and results into a chronological match list

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use super::csv_loader::{load_odds_records, load_result_records};
use crate::error::{validate_decimal_odds, BacktestError, Result};
use crate::models::{Match, OddsRecord, ResultRecord, Side};

/// Result key for indexing: (date, team1, team2)
type ResultKey = (NaiveDate, String, String);

/// Matches built from odds and results, sorted by commence time
#[derive(Debug, Clone, Default)]
pub struct MatchDataset {
    pub matches: Vec<Match>,
    /// Odds rows with no matching result (kept as unsettled matches)
    pub unsettled: usize,
    /// Odds rows dropped because the match was already quoted
    pub duplicates: usize,
    /// Odds rows dropped by the bookmaker filter
    pub filtered: usize,
}

impl MatchDataset {
    /// Join odds rows to results on (date, team1, team2)
    ///
    /// A result recorded with the teams reversed is joined with the winner flipped.
    /// When `bookmaker` is set only that bookmaker's rows are used; otherwise the
    /// first quote for each match wins.
    pub fn merge(
        odds: Vec<OddsRecord>,
        results: &[ResultRecord],
        bookmaker: Option<&str>,
    ) -> Self {
        let mut index: HashMap<ResultKey, Side> = HashMap::with_capacity(results.len());
        for result in results {
            index
                .entry((result.date, result.team1.clone(), result.team2.clone()))
                .or_insert(result.winner);
        }

        let mut dataset = MatchDataset::default();
        let mut seen: HashSet<(DateTime<Utc>, String, String)> = HashSet::new();

        for record in odds {
            if let Some(wanted) = bookmaker {
                let same = record
                    .bookmaker
                    .as_deref()
                    .map_or(false, |b| b.eq_ignore_ascii_case(wanted));
                if !same {
                    dataset.filtered += 1;
                    continue;
                }
            }

            let key = (
                record.commence_time,
                record.team1.clone(),
                record.team2.clone(),
            );
            if !seen.insert(key) {
                dataset.duplicates += 1;
                continue;
            }

            let date = record.commence_time.date_naive();
            let winner = index
                .get(&(date, record.team1.clone(), record.team2.clone()))
                .copied()
                .or_else(|| {
                    index
                        .get(&(date, record.team2.clone(), record.team1.clone()))
                        .map(Side::other)
                });

            if winner.is_none() {
                debug!(
                    "No result for {} vs {} on {}",
                    record.team1, record.team2, date
                );
                dataset.unsettled += 1;
            }

            dataset.matches.push(Match {
                id: Match::make_id(date, &record.team1, &record.team2),
                bookmaker: record.bookmaker,
                commence_time: record.commence_time,
                date,
                team1: record.team1,
                team2: record.team2,
                team1_odds: record.team1_odds,
                team2_odds: record.team2_odds,
                winner,
            });
        }

        dataset.matches.sort_by_key(|m| m.commence_time);

        info!(
            "Merged {} matches ({} unsettled, {} duplicate quotes, {} filtered)",
            dataset.matches.len(),
            dataset.unsettled,
            dataset.duplicates,
            dataset.filtered
        );
        if dataset.unsettled > 0 {
            warn!(
                "{} matches have no result and will be skipped",
                dataset.unsettled
            );
        }

        dataset
    }

    /// Load both CSV files and merge them
    pub fn load<P: AsRef<Path>>(
        odds_path: P,
        results_path: P,
        bookmaker: Option<&str>,
    ) -> Result<Self> {
        let odds = load_odds_records(&odds_path)?;
        info!("Loaded {} odds rows", odds.len());

        let results = load_result_records(&results_path)?;
        info!("Loaded {} results", results.len());

        Ok(Self::merge(odds, &results, bookmaker))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Calendar years covered, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .matches
            .iter()
            .map(|m| chrono::Datelike::year(&m.date))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

/// Structural check of one match: named teams, odds > 1.0 on both sides
pub fn validate_match(m: &Match) -> Result<()> {
    if m.team1.trim().is_empty() || m.team2.trim().is_empty() {
        return Err(BacktestError::Data(format!(
            "match {} has an empty team name",
            m.id
        )));
    }
    validate_decimal_odds(m.team1_odds)
        .and_then(|_| validate_decimal_odds(m.team2_odds))
        .map_err(|e| BacktestError::Data(format!("match {}: {}", m.id, e)))
}

/// Structural check run before any simulation starts
pub fn validate_matches<'a, I>(matches: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Match>,
{
    matches.into_iter().try_for_each(validate_match)
}
