//! Persisted run reports: `results.json` plus a plain-text summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::engine::{BacktestRun, RunStats};
use super::metrics::{DimensionAnalysis, PerformanceAnalyzer, PerformanceSummary, RiskMetrics};
use crate::config::StrategyConfig;
use crate::error::Result;
use crate::models::{BankrollState, Bet};

pub const RESULTS_FILE: &str = "results.json";
pub const SUMMARY_FILE: &str = "summary_report.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub config: StrategyConfig,
    pub stats: RunStats,
    pub summary: PerformanceSummary,
    pub risk: RiskMetrics,
    pub by_odds_range: Vec<DimensionAnalysis>,
    pub bets: Vec<Bet>,
    pub bankroll_history: Vec<BankrollState>,
}

impl BacktestReport {
    pub fn new(name: &str, run: &BacktestRun) -> Self {
        Self {
            name: name.to_string(),
            generated_at: Utc::now(),
            config: run.config.clone(),
            stats: run.stats.clone(),
            summary: run.summary(),
            risk: PerformanceAnalyzer::risk(&run.ledger, run.initial_bankroll),
            by_odds_range: PerformanceAnalyzer::by_odds_range(&run.ledger),
            bets: run.ledger.bets().to_vec(),
            bankroll_history: run.ledger.history().to_vec(),
        }
    }

    /// Write both files into `<output_dir>/<name>_<timestamp>/` and return that directory
    pub fn save<P: AsRef<Path>>(&self, output_dir: P) -> Result<PathBuf> {
        let run_dir = output_dir.as_ref().join(format!(
            "{}_{}",
            self.name,
            self.generated_at.format("%Y%m%d_%H%M%S")
        ));
        fs::create_dir_all(&run_dir)?;

        fs::write(
            run_dir.join(RESULTS_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        fs::write(run_dir.join(SUMMARY_FILE), self.summary_text())?;

        info!("Report saved to {:?}", run_dir);
        Ok(run_dir)
    }

    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let c = &self.config;
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "BACKTEST RESULTS: {}", self.name);
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "Window: {} to {}",
            c.start_date
                .map_or_else(|| "start".to_string(), |d| d.to_string()),
            c.end_date.map_or_else(|| "end".to_string(), |d| d.to_string())
        );
        let _ = writeln!(
            out,
            "Min edge: {:.1}%  Min probability: {:.1}%",
            c.min_edge * 100.0,
            c.min_probability * 100.0
        );
        if c.use_kelly {
            let _ = writeln!(
                out,
                "Sizing: Kelly (cap {:.0}%, floor {:.1}%)",
                c.max_kelly_fraction * 100.0,
                c.min_bet_fraction * 100.0
            );
        } else {
            let _ = writeln!(
                out,
                "Sizing: fixed {:.1}% of bankroll",
                c.fixed_stake_fraction * 100.0
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "Matches in window: {}", self.stats.matches_in_window);
        let _ = writeln!(out, "Total bets: {}", s.total_bets);
        let _ = writeln!(
            out,
            "Winning / losing: {} / {}",
            s.winning_bets, s.losing_bets
        );
        let _ = writeln!(out, "Win rate: {:.1}%", s.win_rate * 100.0);
        let _ = writeln!(
            out,
            "Rejected: {} (probability {}, edge {})",
            self.stats.rejected(),
            self.stats.rejected_probability,
            self.stats.rejected_edge
        );
        let capped = self.stats.rejected_odds
            + self.stats.rejected_probability_cap
            + self.stats.rejected_edge_cap;
        if capped > 0 {
            let _ = writeln!(
                out,
                "Filtered by caps: odds {}, probability {}, edge {}",
                self.stats.rejected_odds,
                self.stats.rejected_probability_cap,
                self.stats.rejected_edge_cap
            );
        }
        let _ = writeln!(out, "Skipped records: {}", self.stats.skipped_records);
        if self.stats.risk_blocked > 0 {
            let _ = writeln!(out, "Risk-blocked: {}", self.stats.risk_blocked);
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "Initial bankroll: {:.2}", c.initial_bankroll);
        let _ = writeln!(out, "Final bankroll: {:.2}", s.final_bankroll);
        let _ = writeln!(out, "Total wagered: {:.2}", s.total_wagered);
        let _ = writeln!(out, "Total profit: {:+.2}", s.total_profit);
        let _ = writeln!(out, "ROI: {:.2}%", s.roi);
        let _ = writeln!(out, "Average odds: {:.2}", s.avg_odds);
        let _ = writeln!(out, "Average edge: {:.2}%", s.avg_edge * 100.0);
        let _ = writeln!(out, "Biggest win: {:+.2}", s.biggest_win);
        let _ = writeln!(out, "Biggest loss: {:+.2}", s.biggest_loss);
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(
            out,
            "Max drawdown: {:.2} ({:.1}%)",
            self.risk.max_drawdown, self.risk.max_drawdown_pct
        );
        let _ = writeln!(out, "Sharpe ratio: {:.2}", self.risk.sharpe_ratio);
        let _ = writeln!(out, "Profit factor: {:.2}", self.risk.profit_factor);

        if !self.by_odds_range.is_empty() {
            let _ = writeln!(out, "{}", "-".repeat(60));
            for row in &self.by_odds_range {
                let _ = writeln!(
                    out,
                    "{:<15} bets {:>4}  win {:>5.1}%  ROI {:>7.2}%",
                    row.key,
                    row.bets,
                    row.win_rate * 100.0,
                    row.roi
                );
            }
        }

        let _ = writeln!(out, "{}", "=".repeat(60));
        out
    }
}

/// Pretty-print any serializable value to `path`
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
