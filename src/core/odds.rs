//! Odds Conversion
//!
//! Stateless conversions between decimal odds, American odds and implied
//! probabilities, plus bookmaker margin (vig) handling for two-way markets.
//!
//! ```text
//! implied probability = 1 / decimal odds
//! vig % = (p_a + p_b - 1) * 100
//! ```

use crate::error::{validate_decimal_odds, BacktestError, Result};

/// Convert decimal odds to implied probability
///
/// # Examples
/// ```
/// use lck_backtest::core::odds::decimal_to_probability;
/// let p = decimal_to_probability(2.0).unwrap();
/// assert!((p - 0.5).abs() < 1e-12);
/// assert!(decimal_to_probability(1.0).is_err());
/// ```
pub fn decimal_to_probability(decimal_odds: f64) -> Result<f64> {
    validate_decimal_odds(decimal_odds)?;
    Ok(1.0 / decimal_odds)
}

/// Convert a probability in (0, 1) to fair decimal odds
pub fn probability_to_decimal(probability: f64) -> Result<f64> {
    if !(probability > 0.0 && probability < 1.0) {
        return Err(BacktestError::Data(format!(
            "Probability must be between 0 and 1 (exclusive), got {}",
            probability
        )));
    }
    Ok(1.0 / probability)
}

/// Convert American odds (+150 / -150) to implied probability
pub fn american_to_probability(american_odds: i32) -> Result<f64> {
    match american_odds {
        0 => Err(BacktestError::Data(
            "American odds of 0 are undefined".to_string(),
        )),
        a if a > 0 => Ok(100.0 / (a as f64 + 100.0)),
        a => {
            let a = (a as f64).abs();
            Ok(a / (a + 100.0))
        }
    }
}

/// Remove the bookmaker margin proportionally
///
/// Returns the pair unchanged when `prob_a + prob_b <= 1` (no measurable overround).
pub fn remove_vig(prob_a: f64, prob_b: f64) -> (f64, f64) {
    let total = prob_a + prob_b;
    if total <= 1.0 {
        return (prob_a, prob_b);
    }
    (prob_a / total, prob_b / total)
}

/// Bookmaker margin as a percentage
pub fn calculate_vig(prob_a: f64, prob_b: f64) -> f64 {
    (prob_a + prob_b - 1.0) * 100.0
}

/// Raw implied probabilities for both sides of a market
pub fn implied_probabilities(odds_a: f64, odds_b: f64) -> Result<(f64, f64)> {
    Ok((decimal_to_probability(odds_a)?, decimal_to_probability(odds_b)?))
}

/// Implied probabilities with the margin removed
pub fn fair_probabilities(odds_a: f64, odds_b: f64) -> Result<(f64, f64)> {
    let (a, b) = implied_probabilities(odds_a, odds_b)?;
    Ok(remove_vig(a, b))
}
