//! Backtest Metrics
//!
//! Read-only statistics over a finished ledger: ROI, win rate, drawdown, etc.
//! Every ratio returns 0 when its denominator is 0.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::ledger::Ledger;
use crate::models::Bet;

/// Aggregate performance of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    // Counts
    pub total_bets: usize,
    pub winning_bets: usize,
    pub losing_bets: usize,
    pub win_rate: f64,

    // Money
    pub total_wagered: f64,
    pub total_profit: f64,
    /// Percent of total wagered
    pub roi: f64,
    pub avg_bet_size: f64,
    pub avg_profit_per_bet: f64,

    // Bet quality
    pub avg_odds: f64,
    pub avg_edge: f64,

    // Extremes
    pub biggest_win: f64,
    pub biggest_loss: f64,

    pub final_bankroll: f64,
}

impl PerformanceSummary {
    fn empty(initial_bankroll: f64) -> Self {
        Self {
            total_bets: 0,
            winning_bets: 0,
            losing_bets: 0,
            win_rate: 0.0,
            total_wagered: 0.0,
            total_profit: 0.0,
            roi: 0.0,
            avg_bet_size: 0.0,
            avg_profit_per_bet: 0.0,
            avg_odds: 0.0,
            avg_edge: 0.0,
            biggest_win: 0.0,
            biggest_loss: 0.0,
            final_bankroll: initial_bankroll,
        }
    }
}

/// Drawdown and return-dispersion metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub max_drawdown: f64,
    /// Percent of the running peak
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    /// Infinite when there are profits but no losses (`null` in JSON)
    #[serde(deserialize_with = "null_as_infinity")]
    pub profit_factor: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
}

impl Default for RiskMetrics {
    fn default() -> Self {
        Self {
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            profit_factor: 0.0,
            gross_profit: 0.0,
            gross_loss: 0.0,
        }
    }
}

fn null_as_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Results grouped by one dimension (e.g. odds range)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub bets: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub stake: f64,
    pub profit: f64,
    pub roi: f64,
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn analyze(ledger: &Ledger, initial_bankroll: f64) -> PerformanceSummary {
        calculate_summary(ledger.bets(), initial_bankroll)
    }

    pub fn risk(ledger: &Ledger, initial_bankroll: f64) -> RiskMetrics {
        calculate_risk_metrics(ledger.bets(), initial_bankroll)
    }

    pub fn by_odds_range(ledger: &Ledger) -> Vec<DimensionAnalysis> {
        analyze_by_odds_range(ledger.bets())
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Summary statistics; `final_bankroll` folds profits in ledger order
pub fn calculate_summary(bets: &[Bet], initial_bankroll: f64) -> PerformanceSummary {
    if bets.is_empty() {
        return PerformanceSummary::empty(initial_bankroll);
    }

    let total_bets = bets.len();
    let winning_bets = bets.iter().filter(|b| b.won()).count();
    let losing_bets = total_bets - winning_bets;
    let n = total_bets as f64;

    let total_wagered: f64 = bets.iter().map(|b| b.stake).sum();
    let total_profit: f64 = bets.iter().map(|b| b.profit).sum();

    let biggest_win = bets
        .iter()
        .map(|b| b.profit)
        .filter(|&p| p > 0.0)
        .fold(0.0, f64::max);
    let biggest_loss = bets
        .iter()
        .map(|b| b.profit)
        .filter(|&p| p < 0.0)
        .fold(0.0, f64::min);

    let final_bankroll = bets
        .iter()
        .fold(initial_bankroll, |bankroll, b| bankroll + b.profit);

    PerformanceSummary {
        total_bets,
        winning_bets,
        losing_bets,
        win_rate: winning_bets as f64 / n,
        total_wagered,
        total_profit,
        roi: ratio(total_profit, total_wagered) * 100.0,
        avg_bet_size: total_wagered / n,
        avg_profit_per_bet: total_profit / n,
        avg_odds: bets.iter().map(|b| b.odds).sum::<f64>() / n,
        avg_edge: bets.iter().map(|b| b.edge).sum::<f64>() / n,
        biggest_win,
        biggest_loss,
        final_bankroll,
    }
}

/// Drawdown over the bankroll curve, Sharpe over per-bet returns, profit factor
pub fn calculate_risk_metrics(bets: &[Bet], initial_bankroll: f64) -> RiskMetrics {
    if bets.is_empty() {
        return RiskMetrics::default();
    }

    let gross_profit: f64 = bets.iter().map(|b| b.profit).filter(|&p| p > 0.0).sum();
    let gross_loss: f64 = bets
        .iter()
        .map(|b| b.profit)
        .filter(|&p| p < 0.0)
        .map(f64::abs)
        .sum();

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    // Drawdown over the bankroll curve, starting from the initial bankroll
    let mut bankroll = initial_bankroll;
    let mut peak = initial_bankroll;
    let mut max_drawdown = 0.0;
    let mut max_drawdown_pct = 0.0;
    let mut returns = Vec::with_capacity(bets.len());
    for bet in bets {
        bankroll += bet.profit;
        peak = peak.max(bankroll);
        let drawdown = peak - bankroll;
        max_drawdown = f64::max(max_drawdown, drawdown);
        max_drawdown_pct = f64::max(max_drawdown_pct, ratio(drawdown, peak) * 100.0);
        if bet.stake > 0.0 {
            returns.push(bet.profit / bet.stake);
        }
    }

    RiskMetrics {
        max_drawdown,
        max_drawdown_pct,
        sharpe_ratio: sharpe_ratio(&returns),
        profit_factor,
        gross_profit,
        gross_loss,
    }
}

/// Mean over population standard deviation of per-bet returns; 0 without dispersion
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let (sum, sum_sq) = returns
        .iter()
        .fold((0.0, 0.0), |(sum, sum_sq), r| (sum + r, sum_sq + r * r));
    let mean = sum / n;
    let variance = sum_sq / n - mean * mean;
    if variance < 1e-12 {
        0.0
    } else {
        mean / variance.sqrt()
    }
}

fn odds_range(odds: f64) -> &'static str {
    if odds < 1.8 {
        "low (<1.8)"
    } else if odds <= 2.5 {
        "mid (1.8-2.5)"
    } else {
        "high (>2.5)"
    }
}

/// Analyze bet results by odds range
pub fn analyze_by_odds_range(bets: &[Bet]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&Bet>> = HashMap::new();
    for bet in bets {
        grouped.entry(odds_range(bet.odds)).or_default().push(bet);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| {
            let total = group.len();
            let wins = group.iter().filter(|b| b.won()).count();
            let stake: f64 = group.iter().map(|b| b.stake).sum();
            let profit: f64 = group.iter().map(|b| b.profit).sum();

            DimensionAnalysis {
                key: key.to_string(),
                bets: total,
                wins,
                win_rate: ratio(wins as f64, total as f64),
                stake,
                profit,
                roi: ratio(profit, stake) * 100.0,
            }
        })
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}
