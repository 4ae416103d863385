//! Kelly Criterion Stake Sizing
//!
//! Bankroll fraction to wager based on win probability and decimal odds.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)
//!
//! The raw fraction is clipped to `[0, max_kelly_fraction]`, and anything below
//! `min_bet_fraction` is dropped to 0. Fixed-fraction mode skips Kelly entirely.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;

/// Stake recommendation for one accepted bet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeSizing {
    pub probability: f64,
    pub odds: f64,
    pub raw_kelly: f64, // Unclipped, may be negative
    pub fraction: f64,  // Fraction actually wagered
    pub stake: f64,
}

/// Unclipped Kelly fraction
///
/// Returns 0 for degenerate inputs (p outside (0, 1), odds <= 1, non-finite values).
///
/// # Examples
/// ```
/// use lck_backtest::core::kelly::raw_kelly_fraction;
/// let kelly = raw_kelly_fraction(0.60, 2.0);
/// assert!((kelly - 0.20).abs() < 1e-9);
/// ```
pub fn raw_kelly_fraction(probability: f64, decimal_odds: f64) -> f64 {
    if !(probability > 0.0 && probability < 1.0) || !(decimal_odds > 1.0) {
        return 0.0;
    }
    if !decimal_odds.is_finite() {
        return 0.0;
    }

    let b = decimal_odds - 1.0;
    let q = 1.0 - probability;
    (b * probability - q) / b
}

/// Kelly fraction clipped to the configured cap and floor
pub fn kelly_fraction(probability: f64, decimal_odds: f64, config: &StrategyConfig) -> f64 {
    clip_fraction(
        raw_kelly_fraction(probability, decimal_odds),
        config.max_kelly_fraction,
        config.min_bet_fraction,
    )
}

fn clip_fraction(raw: f64, max_fraction: f64, min_fraction: f64) -> f64 {
    let clipped = raw.clamp(0.0, max_fraction);

    // Distinguishes "edge too small to act on" from a sized bet
    if clipped < min_fraction {
        return 0.0;
    }

    clipped
}

/// Stake amount for a bankroll fraction
pub fn stake_amount(bankroll: f64, fraction: f64) -> f64 {
    bankroll * fraction
}

/// Stake sizer bound to one strategy configuration
#[derive(Debug, Clone)]
pub struct StakeSizer {
    pub use_kelly: bool,
    pub max_kelly_fraction: f64,
    pub min_bet_fraction: f64,
    pub fixed_stake_fraction: f64,
}

impl StakeSizer {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            use_kelly: config.use_kelly,
            max_kelly_fraction: config.max_kelly_fraction,
            min_bet_fraction: config.min_bet_fraction,
            fixed_stake_fraction: config.fixed_stake_fraction,
        }
    }

    /// Fraction of the bankroll to wager on an accepted bet
    pub fn stake_fraction(&self, probability: f64, decimal_odds: f64) -> f64 {
        if !self.use_kelly {
            return self.fixed_stake_fraction;
        }

        clip_fraction(
            raw_kelly_fraction(probability, decimal_odds),
            self.max_kelly_fraction,
            self.min_bet_fraction,
        )
    }

    /// Size a bet against the current bankroll
    pub fn size(&self, bankroll: f64, probability: f64, decimal_odds: f64) -> StakeSizing {
        let fraction = if bankroll > 0.0 {
            self.stake_fraction(probability, decimal_odds)
        } else {
            0.0
        };

        StakeSizing {
            probability,
            odds: decimal_odds,
            raw_kelly: raw_kelly_fraction(probability, decimal_odds),
            fraction,
            stake: stake_amount(bankroll, fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StrategyConfig {
        StrategyConfig {
            max_kelly_fraction: 0.25,
            min_bet_fraction: 0.01,
            ..Default::default()
        }
    }

    #[test]
    fn test_kelly_fraction_positive_ev() {
        // (1 * 0.60 - 0.40) / 1 = 0.20
        let kelly = kelly_fraction(0.60, 2.0, &config());
        assert!((kelly - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_kelly_fraction_capped() {
        // raw = (4 * 0.5 - 0.5) / 4 = 0.375
        assert!((raw_kelly_fraction(0.5, 5.0) - 0.375).abs() < 1e-9);
        assert!((kelly_fraction(0.5, 5.0, &config()) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_kelly_fraction_negative_ev() {
        assert!(raw_kelly_fraction(0.40, 2.0) < 0.0);
        assert_eq!(kelly_fraction(0.40, 2.0, &config()), 0.0);
    }

    #[test]
    fn test_kelly_fraction_below_min_bet() {
        // raw = (1 * 0.504 - 0.496) / 1 = 0.008 < 0.01
        assert_eq!(kelly_fraction(0.504, 2.0, &config()), 0.0);
    }

    #[test]
    fn test_kelly_fraction_degenerate_inputs() {
        let config = config();
        assert_eq!(kelly_fraction(0.0, 2.0, &config), 0.0);
        assert_eq!(kelly_fraction(1.0, 2.0, &config), 0.0);
        assert_eq!(kelly_fraction(0.6, 1.0, &config), 0.0);
        assert_eq!(kelly_fraction(0.6, 0.5, &config), 0.0);
        assert_eq!(kelly_fraction(f64::NAN, 2.0, &config), 0.0);
        assert_eq!(kelly_fraction(0.6, f64::INFINITY, &config), 0.0);
    }

    #[test]
    fn test_kelly_fraction_bounds_grid() {
        let config = config();
        for pi in 1..100 {
            let p = pi as f64 / 100.0;
            let mut odds = 1.05;
            while odds < 30.0 {
                let f = kelly_fraction(p, odds, &config);
                assert!(f >= 0.0 && f <= config.max_kelly_fraction);
                if p * (odds - 1.0) <= 1.0 - p {
                    assert_eq!(f, 0.0, "p={} odds={}", p, odds);
                }
                odds += 0.25;
            }
        }
    }

    #[test]
    fn test_stake_amount() {
        assert!((stake_amount(1000.0, 0.2) - 200.0).abs() < 1e-9);
        assert_eq!(stake_amount(1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_sizer_matches_free_function() {
        let config = config();
        let sizer = StakeSizer::from_config(&config);
        for (p, odds) in [(0.6, 2.0), (0.7, 1.5), (0.55, 1.9), (0.9, 3.0)] {
            assert_eq!(
                sizer.stake_fraction(p, odds),
                kelly_fraction(p, odds, &config)
            );
        }
    }

    #[test]
    fn test_sizer_fixed_fraction_bypasses_kelly() {
        let config = StrategyConfig {
            use_kelly: false,
            fixed_stake_fraction: 0.02,
            ..Default::default()
        };
        let sizer = StakeSizer::from_config(&config);

        // Negative Kelly still gets the fixed fraction
        assert!((sizer.stake_fraction(0.40, 2.0) - 0.02).abs() < 1e-12);
        assert!((sizer.stake_fraction(0.90, 5.0) - 0.02).abs() < 1e-12);

        let sizing = sizer.size(1000.0, 0.6, 2.0);
        assert!((sizing.stake - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_sizer_empty_bankroll() {
        let sizer = StakeSizer::from_config(&config());
        let sizing = sizer.size(0.0, 0.6, 2.0);
        assert_eq!(sizing.fraction, 0.0);
        assert_eq!(sizing.stake, 0.0);
    }

    #[test]
    fn test_scenario_sizing() {
        let sizer = StakeSizer::from_config(&config());
        let sizing = sizer.size(1000.0, 0.60, 2.0);
        assert!((sizing.raw_kelly - 0.20).abs() < 1e-9);
        assert!((sizing.stake - 200.0).abs() < 1e-9);
    }
}
