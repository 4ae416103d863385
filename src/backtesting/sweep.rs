//! Parameter sweeps and per-period runs
//!
//! Every configuration gets its own engine, bankroll and ledger, so runs are
//! independent and execute in parallel with rayon.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::{run_backtest, BacktestRun, RunStats};
use super::metrics::{PerformanceAnalyzer, PerformanceSummary, RiskMetrics};
use crate::config::StrategyConfig;
use crate::error::Result;
use crate::models::Match;
use crate::predictor::Predictor;

/// One (min_edge, min_probability) pair to test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub min_edge: f64,
    pub min_probability: f64,
}

impl SweepPoint {
    pub fn new(min_edge: f64, min_probability: f64) -> Self {
        Self {
            min_edge,
            min_probability,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "edge>={:.0}% prob>={:.0}%",
            self.min_edge * 100.0,
            self.min_probability * 100.0
        )
    }
}

/// Threshold pairs compared by default, from loosest to strictest
pub fn default_grid() -> Vec<SweepPoint> {
    vec![
        SweepPoint::new(0.03, 0.53),
        SweepPoint::new(0.05, 0.55),
        SweepPoint::new(0.08, 0.58),
        SweepPoint::new(0.10, 0.60),
    ]
}

/// Condensed result of one run in a sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub label: String,
    pub config: StrategyConfig,
    pub stats: RunStats,
    pub summary: PerformanceSummary,
    pub risk: RiskMetrics,
}

impl SweepOutcome {
    pub fn from_run(label: String, run: &BacktestRun) -> Self {
        Self {
            label,
            config: run.config.clone(),
            stats: run.stats.clone(),
            summary: run.summary(),
            risk: PerformanceAnalyzer::risk(&run.ledger, run.initial_bankroll),
        }
    }
}

/// Run `base` once per grid point; results keep grid order
pub fn run_sweep<P: Predictor + ?Sized>(
    base: &StrategyConfig,
    grid: &[SweepPoint],
    matches: &[Match],
    predictor: &P,
) -> Result<Vec<SweepOutcome>> {
    info!("Sweeping {} threshold combinations", grid.len());

    grid.par_iter()
        .map(|point| {
            let config = base.with_thresholds(point.min_edge, point.min_probability);
            let run = run_backtest(config, matches, predictor)?;
            Ok(SweepOutcome::from_run(point.label(), &run))
        })
        .collect()
}

/// Calendar-year windows `[Jan 1, Dec 31]` for each year
pub fn yearly_windows(years: &[i32]) -> Vec<(i32, NaiveDate, NaiveDate)> {
    years
        .iter()
        .filter_map(|&year| {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
            Some((year, start, end))
        })
        .collect()
}

/// Run `base` separately for each calendar year
pub fn run_periods<P: Predictor + ?Sized>(
    base: &StrategyConfig,
    years: &[i32],
    matches: &[Match],
    predictor: &P,
) -> Result<Vec<SweepOutcome>> {
    let windows = yearly_windows(years);
    info!("Running {} yearly periods", windows.len());

    windows
        .par_iter()
        .map(|(year, start, end)| {
            let config = base.with_window(Some(*start), Some(*end));
            let run = run_backtest(config, matches, predictor)?;
            Ok(SweepOutcome::from_run(year.to_string(), &run))
        })
        .collect()
}
