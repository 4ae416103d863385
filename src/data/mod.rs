//! Data loading: CSV readers and the odds/result merge

pub mod csv_loader;
pub mod dataset;

// Re-export commonly used types
pub use csv_loader::{
    load_odds_records, load_prediction_records, load_result_records, parse_date,
    parse_timestamp, PredictionRecord,
};
pub use dataset::{validate_match, validate_matches, MatchDataset};
