//! Bankroll risk limits
//!
//! Checked before each match. A daily-loss block lasts until the date changes;
//! a drawdown block lasts for the rest of the run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::config::StrategyConfig;

/// Why betting was suspended for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBlock {
    Ruin,
    DailyLoss,
    Drawdown,
}

impl fmt::Display for RiskBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBlock::Ruin => write!(f, "bankroll exhausted"),
            RiskBlock::DailyLoss => write!(f, "daily loss limit"),
            RiskBlock::Drawdown => write!(f, "drawdown limit"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskGuard {
    max_daily_loss: Option<f64>,
    max_drawdown: Option<f64>,
    peak: f64,
    day: Option<NaiveDate>,
    day_open: f64,
    day_warned: bool,
    halted: Option<RiskBlock>,
}

impl RiskGuard {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            max_daily_loss: config.max_daily_loss,
            max_drawdown: config.max_drawdown,
            peak: config.initial_bankroll,
            day: None,
            day_open: config.initial_bankroll,
            day_warned: false,
            halted: None,
        }
    }

    /// Returns the active block, if any, for a match on `date`
    pub fn check(&mut self, date: NaiveDate, bankroll: f64) -> Option<RiskBlock> {
        if let Some(block) = self.halted {
            return Some(block);
        }

        if self.day != Some(date) {
            self.day = Some(date);
            self.day_open = bankroll;
            self.day_warned = false;
        }

        if bankroll <= 0.0 {
            warn!("Bankroll exhausted ({:.2}), no further bets", bankroll);
            self.halted = Some(RiskBlock::Ruin);
            return self.halted;
        }

        if let Some(limit) = self.max_drawdown {
            let drawdown = (self.peak - bankroll) / self.peak;
            if self.peak > 0.0 && drawdown >= limit {
                warn!(
                    "Drawdown {:.1}% reached limit {:.1}%, halting",
                    drawdown * 100.0,
                    limit * 100.0
                );
                self.halted = Some(RiskBlock::Drawdown);
                return self.halted;
            }
        }

        if let Some(limit) = self.max_daily_loss {
            let loss = (self.day_open - bankroll) / self.day_open;
            if self.day_open > 0.0 && loss >= limit {
                if !self.day_warned {
                    warn!(
                        "Daily loss {:.1}% on {} reached limit {:.1}%",
                        loss * 100.0,
                        date,
                        limit * 100.0
                    );
                    self.day_warned = true;
                }
                return Some(RiskBlock::DailyLoss);
            }
        }

        None
    }

    /// Track the running peak after a settled bet
    pub fn observe(&mut self, bankroll: f64) {
        if bankroll > self.peak {
            self.peak = bankroll;
        }
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }
}
