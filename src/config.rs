//! Strategy and job configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{
    validate_decimal_odds, validate_fraction, validate_positive, validate_probability_open,
    validate_unit_interval, BacktestError, Result,
};

/// Parameters of one backtest run
///
/// Passed once to [`crate::backtesting::BacktestEngine::new`] and validated there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub initial_bankroll: f64,
    /// Minimum `predicted - implied` probability difference
    pub min_edge: f64,
    /// Probability floor, checked before the edge
    pub min_probability: f64,
    /// Reject edges above this as implausible
    pub max_edge: Option<f64>,
    /// Reject predictions more confident than this
    pub max_probability: Option<f64>,
    /// Inclusive band of decimal odds worth betting at
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    pub use_kelly: bool,
    /// Hard cap on the bankroll fraction of any single stake
    pub max_kelly_fraction: f64,
    /// Kelly fractions below this are treated as "too small to act on"
    pub min_bet_fraction: f64,
    /// Stake fraction when `use_kelly` is false
    pub fixed_stake_fraction: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Stop betting for the day after losing this fraction of the day's opening bankroll
    pub max_daily_loss: Option<f64>,
    /// Stop betting for the run after falling this fraction below the bankroll peak
    pub max_drawdown: Option<f64>,
    /// Normalize implied probabilities so both sides sum to 1
    pub remove_vig: bool,
    /// Also evaluate team2 with `1 - p`
    pub consider_both_sides: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            initial_bankroll: 1000.0,
            min_edge: 0.05,
            min_probability: 0.55,
            max_edge: None,
            max_probability: None,
            min_odds: None,
            max_odds: None,
            use_kelly: true,
            max_kelly_fraction: 0.25,
            min_bet_fraction: 0.01,
            fixed_stake_fraction: 0.02,
            start_date: None,
            end_date: None,
            max_daily_loss: None,
            max_drawdown: None,
            remove_vig: false,
            consider_both_sides: false,
        }
    }
}

impl StrategyConfig {
    /// Check every bound; returns `Configuration` on the first violation
    pub fn validate(&self) -> Result<()> {
        validate_positive("initial_bankroll", self.initial_bankroll)?;
        validate_unit_interval("min_edge", self.min_edge)?;
        validate_probability_open("min_probability", self.min_probability)?;
        if let Some(cap) = self.max_edge {
            validate_unit_interval("max_edge", cap)?;
            if cap < self.min_edge {
                return Err(BacktestError::Configuration(format!(
                    "max_edge ({}) is below min_edge ({})",
                    cap, self.min_edge
                )));
            }
        }
        if let Some(cap) = self.max_probability {
            validate_probability_open("max_probability", cap)?;
            if cap < self.min_probability {
                return Err(BacktestError::Configuration(format!(
                    "max_probability ({}) is below min_probability ({})",
                    cap, self.min_probability
                )));
            }
        }
        for (name, odds) in [("min_odds", self.min_odds), ("max_odds", self.max_odds)] {
            if let Some(odds) = odds {
                validate_decimal_odds(odds)
                    .map_err(|e| BacktestError::Configuration(format!("{}: {}", name, e)))?;
            }
        }
        if let (Some(min), Some(max)) = (self.min_odds, self.max_odds) {
            if min > max {
                return Err(BacktestError::Configuration(format!(
                    "min_odds ({}) exceeds max_odds ({})",
                    min, max
                )));
            }
        }
        validate_fraction("max_kelly_fraction", self.max_kelly_fraction)?;
        validate_unit_interval("min_bet_fraction", self.min_bet_fraction)?;

        if self.min_bet_fraction > self.max_kelly_fraction {
            return Err(BacktestError::Configuration(format!(
                "min_bet_fraction ({}) exceeds max_kelly_fraction ({})",
                self.min_bet_fraction, self.max_kelly_fraction
            )));
        }

        if !self.use_kelly {
            validate_fraction("fixed_stake_fraction", self.fixed_stake_fraction)?;
            if self.fixed_stake_fraction > self.max_kelly_fraction {
                return Err(BacktestError::Configuration(format!(
                    "fixed_stake_fraction ({}) exceeds max_kelly_fraction ({})",
                    self.fixed_stake_fraction, self.max_kelly_fraction
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(BacktestError::Configuration(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }

        if let Some(limit) = self.max_daily_loss {
            validate_fraction("max_daily_loss", limit)?;
        }
        if let Some(limit) = self.max_drawdown {
            validate_fraction("max_drawdown", limit)?;
        }

        Ok(())
    }

    /// Copy with different decision thresholds (used by parameter sweeps)
    pub fn with_thresholds(&self, min_edge: f64, min_probability: f64) -> Self {
        Self {
            min_edge,
            min_probability,
            ..self.clone()
        }
    }

    /// Copy restricted to an inclusive date window
    pub fn with_window(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start_date: start,
            end_date: end,
            ..self.clone()
        }
    }

    /// Whether `date` falls inside the configured window
    pub fn in_window(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// A named backtest with its input files, as stored in a JSON job file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestJob {
    #[serde(default = "default_job_name")]
    pub name: String,
    pub odds_file: PathBuf,
    pub matches_file: PathBuf,
    #[serde(default)]
    pub predictions_file: Option<PathBuf>,
    /// Keep only this bookmaker's quotes when several are present
    #[serde(default)]
    pub bookmaker: Option<String>,
    #[serde(flatten)]
    pub strategy: StrategyConfig,
}

fn default_job_name() -> String {
    "default_backtest".to_string()
}

impl BacktestJob {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let job: BacktestJob = serde_json::from_str(json)?;
        job.strategy.validate()?;
        Ok(job)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
