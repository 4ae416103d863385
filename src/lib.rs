//! LCK Backtest - Historical replay of a model-driven wagering strategy
//!
//! This library provides:
//! - Decimal/American odds conversion and bookmaker margin removal
//! - Edge evaluation against market-implied probabilities
//! - Capped Kelly (or fixed-fraction) stake sizing
//! - A chronological backtest engine with a single running bankroll
//! - Performance and risk metrics, parameter sweeps and reports
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use lck_backtest::backtesting::BacktestEngine;
//! use lck_backtest::predictor::FnPredictor;
//! use lck_backtest::{Match, Side, StrategyConfig};
//!
//! let kickoff = Utc.with_ymd_and_hms(2024, 1, 17, 8, 0, 0).unwrap();
//! let matches = vec![Match::new(kickoff, "T1", "Gen.G", 2.0, 2.0, Some(Side::Team1))];
//!
//! let mut engine = BacktestEngine::new(StrategyConfig::default()).unwrap();
//! let run = engine
//!     .run(&matches, &FnPredictor(|_: &Match| -> lck_backtest::Result<f64> { Ok(0.60) }))
//!     .unwrap();
//!
//! assert!((run.final_bankroll - 1200.0).abs() < 1e-6);
//! ```

pub mod backtesting;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod predictor;

// Re-export commonly used types
pub use config::{BacktestJob, StrategyConfig};
pub use error::{BacktestError, Result};
pub use models::{BankrollState, Bet, Match, OddsRecord, Outcome, ResultRecord, Side};
pub use predictor::{FnPredictor, MarketPredictor, Predictor, TablePredictor};
