//! Edge Evaluation
//!
//! Bet/no-bet decision comparing a model probability with the market.
//!
//! ```text
//! edge = predicted probability - implied market probability
//! ```
//!
//! The probability floor is checked before the edge floor, so a longshot with a
//! large edge but a low win probability is still rejected. Optional caps on odds,
//! probability and edge filter out quotes and predictions too good to trust.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StrategyConfig;
use crate::core::odds::decimal_to_probability;
use crate::error::Result;

/// Why a candidate bet was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    OddsOutOfRange,
    ProbabilityBelowFloor,
    ProbabilityAboveCap,
    EdgeBelowFloor,
    EdgeAboveCap,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OddsOutOfRange => write!(f, "odds out of range"),
            RejectReason::ProbabilityBelowFloor => write!(f, "probability below floor"),
            RejectReason::ProbabilityAboveCap => write!(f, "probability above cap"),
            RejectReason::EdgeBelowFloor => write!(f, "edge below floor"),
            RejectReason::EdgeAboveCap => write!(f, "edge above cap"),
        }
    }
}

/// Result of evaluating one side of a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetDecision {
    pub predicted_probability: f64,
    pub implied_probability: f64,
    pub edge: f64,
    pub rejection: Option<RejectReason>,
}

impl BetDecision {
    pub fn is_accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Applies the configured odds band, probability and edge bounds
#[derive(Debug, Clone, Copy)]
pub struct EdgeEvaluator {
    pub min_edge: f64,
    pub min_probability: f64,
    pub max_edge: Option<f64>,
    pub max_probability: Option<f64>,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
}

impl EdgeEvaluator {
    /// Floors only, no caps
    pub fn new(min_edge: f64, min_probability: f64) -> Self {
        Self {
            min_edge,
            min_probability,
            max_edge: None,
            max_probability: None,
            min_odds: None,
            max_odds: None,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            max_edge: config.max_edge,
            max_probability: config.max_probability,
            min_odds: config.min_odds,
            max_odds: config.max_odds,
            ..Self::new(config.min_edge, config.min_probability)
        }
    }

    fn odds_in_range(&self, decimal_odds: f64) -> bool {
        self.min_odds.map_or(true, |min| decimal_odds >= min)
            && self.max_odds.map_or(true, |max| decimal_odds <= max)
    }

    /// Decide against an already computed implied probability
    ///
    /// Checks run in order: odds band, probability floor, probability cap,
    /// edge floor, edge cap. The first failure is the reported reason.
    pub fn evaluate(
        &self,
        predicted_probability: f64,
        implied_probability: f64,
        decimal_odds: f64,
    ) -> BetDecision {
        let edge = calculate_edge(predicted_probability, implied_probability);

        let rejection = if !self.odds_in_range(decimal_odds) {
            Some(RejectReason::OddsOutOfRange)
        } else if predicted_probability < self.min_probability {
            Some(RejectReason::ProbabilityBelowFloor)
        } else if self
            .max_probability
            .is_some_and(|cap| predicted_probability > cap)
        {
            Some(RejectReason::ProbabilityAboveCap)
        } else if edge < self.min_edge {
            Some(RejectReason::EdgeBelowFloor)
        } else if self.max_edge.is_some_and(|cap| edge > cap) {
            Some(RejectReason::EdgeAboveCap)
        } else {
            None
        };

        BetDecision {
            predicted_probability,
            implied_probability,
            edge,
            rejection,
        }
    }

    /// Decide against decimal odds; fails with `Data` for odds <= 1.0
    pub fn should_bet(&self, predicted_probability: f64, market_odds: f64) -> Result<BetDecision> {
        let implied = decimal_to_probability(market_odds)?;
        Ok(self.evaluate(predicted_probability, implied, market_odds))
    }
}

/// Canonical edge: difference between model and market probability
pub fn calculate_edge(predicted_probability: f64, implied_probability: f64) -> f64 {
    predicted_probability - implied_probability
}

/// Bet/no-bet decision for `predicted_probability` at `market_odds`
pub fn should_bet(
    predicted_probability: f64,
    market_odds: f64,
    config: &StrategyConfig,
) -> Result<BetDecision> {
    EdgeEvaluator::from_config(config).should_bet(predicted_probability, market_odds)
}

/// Expected profit of a stake: `p * (odds - 1) * stake - (1 - p) * stake`
pub fn expected_value(probability: f64, decimal_odds: f64, stake: f64) -> f64 {
    let win_amount = (decimal_odds - 1.0) * stake;
    probability * win_amount - (1.0 - probability) * stake
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StrategyConfig {
        StrategyConfig {
            min_edge: 0.05,
            min_probability: 0.55,
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_scenario_bet() {
        let decision = should_bet(0.60, 2.0, &config()).unwrap();
        assert!(decision.is_accepted());
        assert!((decision.implied_probability - 0.5).abs() < 1e-12);
        assert!((decision.edge - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_probability_floor_checked_first() {
        // Longshot: huge edge, low probability
        let decision = should_bet(0.40, 10.0, &config()).unwrap();
        assert!(decision.edge > 0.25);
        assert_eq!(
            decision.rejection,
            Some(RejectReason::ProbabilityBelowFloor)
        );
    }

    #[test]
    fn test_probability_floor_regardless_of_edge() {
        let evaluator = EdgeEvaluator::from_config(&config());
        for odds in [1.5, 3.0, 10.0, 50.0, 500.0] {
            let decision = evaluator.should_bet(0.54, odds).unwrap();
            assert!(!decision.is_accepted());
        }
    }

    #[test]
    fn test_edge_floor() {
        // implied 0.5263, predicted 0.56 -> edge ~0.034
        let decision = should_bet(0.56, 1.90, &config()).unwrap();
        assert_eq!(decision.rejection, Some(RejectReason::EdgeBelowFloor));
        assert!(decision.edge > 0.0);
    }

    #[test]
    fn test_invalid_odds_rejected() {
        assert!(should_bet(0.6, 1.0, &config()).is_err());
        assert!(should_bet(0.6, 0.8, &config()).is_err());
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(
            RejectReason::ProbabilityBelowFloor.to_string(),
            "probability below floor"
        );
        assert_eq!(RejectReason::EdgeBelowFloor.to_string(), "edge below floor");
    }

    #[test]
    fn test_odds_band() {
        let config = StrategyConfig {
            min_odds: Some(1.5),
            max_odds: Some(5.0),
            ..config()
        };

        let decision = should_bet(0.80, 1.30, &config).unwrap();
        assert_eq!(decision.rejection, Some(RejectReason::OddsOutOfRange));

        // Band is checked before the probability floor
        let decision = should_bet(0.30, 8.0, &config).unwrap();
        assert_eq!(decision.rejection, Some(RejectReason::OddsOutOfRange));

        // Bounds are inclusive
        assert!(should_bet(0.75, 1.5, &config).unwrap().is_accepted());
        assert!(should_bet(0.60, 5.0, &config).unwrap().is_accepted());
    }

    #[test]
    fn test_probability_cap() {
        let config = StrategyConfig {
            max_probability: Some(0.95),
            ..config()
        };

        let decision = should_bet(0.97, 2.0, &config).unwrap();
        assert_eq!(decision.rejection, Some(RejectReason::ProbabilityAboveCap));
        assert!(should_bet(0.95, 2.0, &config).unwrap().is_accepted());
    }

    #[test]
    fn test_edge_cap() {
        let config = StrategyConfig {
            max_edge: Some(0.50),
            ..config()
        };

        // implied 0.25, edge 0.60
        let decision = should_bet(0.85, 4.0, &config).unwrap();
        assert_eq!(decision.rejection, Some(RejectReason::EdgeAboveCap));

        // Same bet without the cap goes through
        assert!(should_bet(0.85, 4.0, &self::config()).unwrap().is_accepted());
    }

    #[test]
    fn test_expected_value() {
        // 0.6 * 100 - 0.4 * 100 = 20
        assert!((expected_value(0.6, 2.0, 100.0) - 20.0).abs() < 1e-9);
        assert!(expected_value(0.4, 2.0, 100.0) < 0.0);
    }
}
