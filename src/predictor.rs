use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::core::odds::fair_probabilities;
use crate::data::csv_loader::{load_prediction_records, PredictionRecord};
use crate::error::{BacktestError, Result};
use crate::models::Match;

/// Source of win probabilities for the backtest
///
/// `predict` returns the probability that `team1` wins. A match the predictor
/// cannot price should yield [`BacktestError::SkippableRecord`].
pub trait Predictor: Send + Sync {
    fn predict(&self, m: &Match) -> Result<f64>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, m: &Match) -> Result<f64> {
        (**self).predict(m)
    }
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, m: &Match) -> Result<f64> {
        (**self).predict(m)
    }
}

type PredictionKey = (NaiveDate, String, String);

/// Precomputed model output keyed by (date, team1, team2)
#[derive(Debug, Clone, Default)]
pub struct TablePredictor {
    table: HashMap<PredictionKey, f64>,
}

impl TablePredictor {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        let mut table = HashMap::with_capacity(records.len());
        for r in records {
            table.entry((r.date, r.team1, r.team2)).or_insert(r.probability);
        }
        Self { table }
    }

    /// Load from a `date,team1,team2,probability` CSV
    pub fn from_csv<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let records = load_prediction_records(&csv_path)?;
        info!(
            "Loaded {} predictions from {:?}",
            records.len(),
            csv_path.as_ref()
        );
        Ok(Self::new(records))
    }

    pub fn insert(&mut self, date: NaiveDate, team1: &str, team2: &str, probability: f64) {
        self.table
            .insert((date, team1.to_string(), team2.to_string()), probability);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Predictor for TablePredictor {
    fn predict(&self, m: &Match) -> Result<f64> {
        if let Some(p) = self
            .table
            .get(&(m.date, m.team1.clone(), m.team2.clone()))
        {
            return Ok(*p);
        }

        // Same pairing listed the other way round
        if let Some(p) = self
            .table
            .get(&(m.date, m.team2.clone(), m.team1.clone()))
        {
            return Ok(1.0 - *p);
        }

        Err(BacktestError::SkippableRecord(format!(
            "no prediction for {}",
            m.id
        )))
    }
}

/// Baseline that echoes the de-vigged market probability
///
/// Its edge is never positive, so with a positive `min_edge` it places no bets.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketPredictor;

impl Predictor for MarketPredictor {
    fn predict(&self, m: &Match) -> Result<f64> {
        let (p1, _) = fair_probabilities(m.team1_odds, m.team2_odds)?;
        Ok(p1)
    }
}

/// Adapts a closure into a [`Predictor`]
pub struct FnPredictor<F>(pub F);

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&Match) -> Result<f64> + Send + Sync,
{
    fn predict(&self, m: &Match) -> Result<f64> {
        (self.0)(m)
    }
}
