//! Append-only record of settled bets and bankroll snapshots

use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};
use crate::models::{BankrollState, Bet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    bets: Vec<Bet>,
    history: Vec<BankrollState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a settled bet and its bankroll snapshot
    ///
    /// Bets must arrive in non-decreasing commence time with consecutive sequence numbers.
    pub fn record(&mut self, bet: Bet) -> Result<()> {
        if bet.sequence != self.bets.len() {
            return Err(BacktestError::EngineState(format!(
                "bet sequence {} out of order, expected {}",
                bet.sequence,
                self.bets.len()
            )));
        }
        if let Some(last) = self.bets.last() {
            if bet.commence_time < last.commence_time {
                return Err(BacktestError::EngineState(format!(
                    "bet on {} at {} precedes previous bet at {}",
                    bet.match_id, bet.commence_time, last.commence_time
                )));
            }
        }

        self.history.push(BankrollState {
            sequence: bet.sequence,
            timestamp: bet.commence_time,
            match_id: bet.match_id.clone(),
            bankroll: bet.bankroll_after,
        });
        self.bets.push(bet);
        Ok(())
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn history(&self) -> &[BankrollState] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bet> {
        self.bets.iter()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Bet;
    type IntoIter = std::slice::Iter<'a, Bet>;

    fn into_iter(self) -> Self::IntoIter {
        self.bets.iter()
    }
}
