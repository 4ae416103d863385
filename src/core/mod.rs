//! Core betting math: odds conversion, edge evaluation and stake sizing

pub mod edge;
pub mod kelly;
pub mod odds;

// Re-export commonly used types
pub use edge::{calculate_edge, expected_value, should_bet, BetDecision, EdgeEvaluator, RejectReason};
pub use kelly::{kelly_fraction, raw_kelly_fraction, stake_amount, StakeSizer, StakeSizing};
pub use odds::{
    american_to_probability, calculate_vig, decimal_to_probability, fair_probabilities,
    implied_probabilities, probability_to_decimal, remove_vig,
};
