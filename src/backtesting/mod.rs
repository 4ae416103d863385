//! Backtesting engine for validating betting strategies

pub mod engine;
pub mod ledger;
pub mod metrics;
pub mod report;
pub mod risk;
pub mod sweep;

pub use engine::{run_backtest, BacktestEngine, BacktestRun, EngineState, RunStats};
pub use ledger::Ledger;
pub use metrics::{
    analyze_by_odds_range, DimensionAnalysis, PerformanceAnalyzer, PerformanceSummary,
    RiskMetrics,
};
pub use report::BacktestReport;
pub use risk::{RiskBlock, RiskGuard};
pub use sweep::{default_grid, run_periods, run_sweep, SweepOutcome, SweepPoint};
