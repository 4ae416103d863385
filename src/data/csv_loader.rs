//! CSV loading for odds, results and model predictions
//!
//! Every loader reads the whole file up front and fails with
//! [`BacktestError::Data`] on the first structurally invalid row, so a corrupt
//! dataset never reaches the simulation loop.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use polars::prelude::*;
use std::path::Path;

use crate::error::{validate_decimal_odds, BacktestError, Result};
use crate::models::{OddsRecord, ResultRecord, Side};

/// Predicted probability that `team1` beats `team2` on `date`
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub team1: String,
    pub team2: String,
    pub probability: f64,
}

fn read_csv<P: AsRef<Path>>(csv_path: P) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| BacktestError::Data(format!("missing required column `{}`", name)))
}

fn string_column(column: &Column) -> Result<StringChunked> {
    Ok(column.cast(&DataType::String)?.str()?.clone())
}

fn float_column(column: &Column) -> Result<Float64Chunked> {
    Ok(column.cast(&DataType::Float64)?.f64()?.clone())
}

fn int_column(column: &Column) -> Result<Int64Chunked> {
    Ok(column.cast(&DataType::Int64)?.i64()?.clone())
}

/// CSV line number for a zero-based data row (header is line 1)
fn line_no(row: usize) -> usize {
    row + 2
}

fn missing_field(field: &str, row: usize) -> BacktestError {
    BacktestError::Data(format!("line {}: missing `{}`", line_no(row), field))
}

fn non_empty(value: Option<&str>, field: &str, row: usize) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(missing_field(field, row)),
    }
}

/// Parse an ISO-8601 timestamp; naive values are taken as UTC, bare dates as midnight
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }

    let date = parse_plain_date(raw)
        .ok_or_else(|| BacktestError::Data(format!("unparsable timestamp `{}`", raw)))?;
    Ok(date.and_time(NaiveTime::default()).and_utc())
}

/// Parse a calendar date (`2024-01-17`, `20240117` or a full timestamp)
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    if let Some(date) = parse_plain_date(raw.trim()) {
        return Ok(date);
    }
    parse_timestamp(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| BacktestError::Data(format!("unparsable date `{}`", raw.trim())))
}

fn parse_plain_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
}

/// Load bookmaker odds
///
/// Columns: `commence_time, team1, team2, team1_odds, team2_odds` and optional `bookmaker`.
pub fn load_odds_records<P: AsRef<Path>>(csv_path: P) -> Result<Vec<OddsRecord>> {
    let df = read_csv(csv_path)?;

    let commence_col = string_column(required_column(&df, "commence_time")?)?;
    let team1_col = string_column(required_column(&df, "team1")?)?;
    let team2_col = string_column(required_column(&df, "team2")?)?;
    let odds1_col = float_column(required_column(&df, "team1_odds")?)?;
    let odds2_col = float_column(required_column(&df, "team2_odds")?)?;
    let bookmaker_col = match df.column("bookmaker") {
        Ok(col) => Some(string_column(col)?),
        Err(_) => None,
    };

    let mut records = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let commence_raw = non_empty(commence_col.get(i), "commence_time", i)?;
        let commence_time = parse_timestamp(&commence_raw)
            .map_err(|e| BacktestError::Data(format!("line {}: {}", line_no(i), e)))?;

        let team1_odds = odds1_col.get(i).ok_or_else(|| missing_field("team1_odds", i))?;
        let team2_odds = odds2_col.get(i).ok_or_else(|| missing_field("team2_odds", i))?;
        for odds in [team1_odds, team2_odds] {
            validate_decimal_odds(odds)
                .map_err(|e| BacktestError::Data(format!("line {}: {}", line_no(i), e)))?;
        }

        records.push(OddsRecord {
            bookmaker: bookmaker_col
                .as_ref()
                .and_then(|col| col.get(i))
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            commence_time,
            team1: non_empty(team1_col.get(i), "team1", i)?,
            team2: non_empty(team2_col.get(i), "team2", i)?,
            team1_odds,
            team2_odds,
        });
    }

    Ok(records)
}

/// Load settled results
///
/// Columns: `date, team1, team2, winner` (1 or 2) and optional `duration`.
pub fn load_result_records<P: AsRef<Path>>(csv_path: P) -> Result<Vec<ResultRecord>> {
    let df = read_csv(csv_path)?;

    let date_col = string_column(required_column(&df, "date")?)?;
    let team1_col = string_column(required_column(&df, "team1")?)?;
    let team2_col = string_column(required_column(&df, "team2")?)?;
    let winner_col = int_column(required_column(&df, "winner")?)?;
    let duration_col = match df.column("duration") {
        Ok(col) => Some(string_column(col)?),
        Err(_) => None,
    };

    let mut records = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let date_raw = non_empty(date_col.get(i), "date", i)?;
        let date = parse_date(&date_raw)
            .map_err(|e| BacktestError::Data(format!("line {}: {}", line_no(i), e)))?;

        let code = winner_col.get(i).ok_or_else(|| missing_field("winner", i))?;
        let winner = Side::from_code(code).ok_or_else(|| {
            BacktestError::Data(format!(
                "line {}: winner must be 1 or 2, got {}",
                line_no(i),
                code
            ))
        })?;

        records.push(ResultRecord {
            date,
            team1: non_empty(team1_col.get(i), "team1", i)?,
            team2: non_empty(team2_col.get(i), "team2", i)?,
            winner,
            duration: duration_col
                .as_ref()
                .and_then(|col| col.get(i))
                .map(str::to_string),
        });
    }

    Ok(records)
}

/// Load model predictions
///
/// Columns: `date, team1, team2, probability` where `probability` is P(team1 wins).
pub fn load_prediction_records<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PredictionRecord>> {
    let df = read_csv(csv_path)?;

    let date_col = string_column(required_column(&df, "date")?)?;
    let team1_col = string_column(required_column(&df, "team1")?)?;
    let team2_col = string_column(required_column(&df, "team2")?)?;
    let prob_col = float_column(required_column(&df, "probability")?)?;

    let mut records = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let date_raw = non_empty(date_col.get(i), "date", i)?;
        let date = parse_date(&date_raw)
            .map_err(|e| BacktestError::Data(format!("line {}: {}", line_no(i), e)))?;

        let probability = prob_col.get(i).ok_or_else(|| missing_field("probability", i))?;
        if !(probability > 0.0 && probability < 1.0) {
            return Err(BacktestError::Data(format!(
                "line {}: probability must be in (0, 1), got {}",
                line_no(i),
                probability
            )));
        }

        records.push(PredictionRecord {
            date,
            team1: non_empty(team1_col.get(i), "team1", i)?,
            team2: non_empty(team2_col.get(i), "team2", i)?,
            probability,
        });
    }

    Ok(records)
}
