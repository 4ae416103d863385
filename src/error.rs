use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while configuring, loading or running a backtest
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Invalid strategy bounds; the run never starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structurally invalid input records
    #[error("Data error: {0}")]
    Data(String),

    /// A single match that cannot be resolved; logged and skipped by the engine
    #[error("Skipped record: {0}")]
    SkippableRecord(String),

    /// Engine lifecycle misuse
    #[error("Engine state error: {0}")]
    EngineState(String),

    #[error("CSV error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BacktestError {
    /// Whether the engine may log this error and move on to the next match
    pub fn is_skippable(&self) -> bool {
        matches!(self, BacktestError::SkippableRecord(_))
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;

/// Validation functions
pub fn validate_decimal_odds(odds: f64) -> Result<()> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(BacktestError::Data(format!(
            "Decimal odds must be greater than 1.0, got {}",
            odds
        )));
    }
    Ok(())
}

/// Probability strictly inside (0, 1)
pub fn validate_probability_open(name: &str, prob: f64) -> Result<()> {
    if !(prob > 0.0 && prob < 1.0) {
        return Err(BacktestError::Configuration(format!(
            "{} must be in (0, 1), got {}",
            name, prob
        )));
    }
    Ok(())
}

/// Value inside [0, 1]
pub fn validate_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BacktestError::Configuration(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Bankroll fraction inside (0, 1]
pub fn validate_fraction(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(BacktestError::Configuration(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BacktestError::Configuration(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}
