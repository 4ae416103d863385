//! Backtest Engine
//!
//! Replays matches in chronological order against a single running bankroll.
//! Each stake is sized from the bankroll left by every earlier bet, so the walk
//! is strictly sequential. An engine runs once; build a new one per run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ledger::Ledger;
use super::metrics::{PerformanceAnalyzer, PerformanceSummary};
use super::risk::{RiskBlock, RiskGuard};
use crate::config::StrategyConfig;
use crate::core::edge::{BetDecision, EdgeEvaluator, RejectReason};
use crate::core::kelly::StakeSizer;
use crate::core::odds::{fair_probabilities, implied_probabilities};
use crate::data::validate_matches;
use crate::error::{BacktestError, Result};
use crate::models::{Bet, Match, Outcome, Side};
use crate::predictor::Predictor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Initialized,
    Running,
    Completed,
}

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub matches_in_window: usize,
    pub bets_placed: usize,
    pub rejected_odds: usize,
    pub rejected_probability: usize,
    pub rejected_probability_cap: usize,
    pub rejected_edge: usize,
    pub rejected_edge_cap: usize,
    pub zero_stake: usize,
    pub skipped_records: usize,
    pub risk_blocked: usize,
    /// Set when a run-ending limit (ruin or drawdown) was hit
    pub halted_by: Option<RiskBlock>,
}

impl RunStats {
    pub fn rejected(&self) -> usize {
        self.rejected_odds
            + self.rejected_probability
            + self.rejected_probability_cap
            + self.rejected_edge
            + self.rejected_edge_cap
    }

    fn count_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::OddsOutOfRange => self.rejected_odds += 1,
            RejectReason::ProbabilityBelowFloor => self.rejected_probability += 1,
            RejectReason::ProbabilityAboveCap => self.rejected_probability_cap += 1,
            RejectReason::EdgeBelowFloor => self.rejected_edge += 1,
            RejectReason::EdgeAboveCap => self.rejected_edge_cap += 1,
        }
    }
}

/// Output of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    pub config: StrategyConfig,
    pub initial_bankroll: f64,
    pub final_bankroll: f64,
    pub ledger: Ledger,
    pub stats: RunStats,
}

impl BacktestRun {
    pub fn summary(&self) -> PerformanceSummary {
        PerformanceAnalyzer::analyze(&self.ledger, self.initial_bankroll)
    }
}

/// Side chosen for a match together with its accepted or rejected decision
#[derive(Debug, Clone, Copy)]
struct Candidate {
    side: Side,
    odds: f64,
    decision: BetDecision,
}

pub struct BacktestEngine {
    config: StrategyConfig,
    evaluator: EdgeEvaluator,
    sizer: StakeSizer,
    state: EngineState,
}

impl BacktestEngine {
    /// Validate `config` and build an engine ready for one run
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            evaluator: EdgeEvaluator::from_config(&config),
            sizer: StakeSizer::from_config(&config),
            config,
            state: EngineState::Initialized,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Replay `matches` against `predictor`
    ///
    /// Matches outside the date window are dropped and the rest are stably sorted
    /// by commence time. Any structurally invalid match fails the run with
    /// [`BacktestError::Data`] before a single bet is simulated.
    pub fn run<P: Predictor + ?Sized>(
        &mut self,
        matches: &[Match],
        predictor: &P,
    ) -> Result<BacktestRun> {
        if self.state != EngineState::Initialized {
            return Err(BacktestError::EngineState(format!(
                "engine is {:?}; build a new engine for each run",
                self.state
            )));
        }

        let mut window: Vec<&Match> = matches
            .iter()
            .filter(|m| self.config.in_window(m.date))
            .collect();
        window.sort_by_key(|m| m.commence_time);

        validate_matches(window.iter().copied())?;

        self.state = EngineState::Running;
        let result = self.simulate(&window, predictor);
        self.state = EngineState::Completed;
        result
    }

    fn simulate<P: Predictor + ?Sized>(
        &self,
        window: &[&Match],
        predictor: &P,
    ) -> Result<BacktestRun> {
        let initial_bankroll = self.config.initial_bankroll;
        let mut bankroll = initial_bankroll;
        let mut ledger = Ledger::new();
        let mut guard = RiskGuard::new(&self.config);
        let mut stats = RunStats {
            matches_in_window: window.len(),
            ..Default::default()
        };

        info!(
            "Starting backtest: {} matches, bankroll {:.2}",
            window.len(),
            initial_bankroll
        );

        for m in window {
            let Some(winner) = m.winner else {
                warn!("Skipping {}: unsettled", m.id);
                stats.skipped_records += 1;
                continue;
            };

            if let Some(block) = guard.check(m.date, bankroll) {
                stats.risk_blocked += 1;
                if block != RiskBlock::DailyLoss {
                    stats.halted_by = Some(block);
                }
                continue;
            }

            let candidate = match self.evaluate(m, predictor) {
                Ok(found) => found,
                Err(e) if e.is_skippable() => {
                    warn!("Skipping {}: {}", m.id, e);
                    stats.skipped_records += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Candidate {
                side,
                odds,
                decision,
            } = candidate;

            if let Some(reason) = decision.rejection {
                debug!(
                    "{}: no bet ({}), p={:.3} implied={:.3} edge={:.3}",
                    m.id,
                    reason,
                    decision.predicted_probability,
                    decision.implied_probability,
                    decision.edge
                );
                stats.count_rejection(reason);
                continue;
            }

            let sizing = self
                .sizer
                .size(bankroll, decision.predicted_probability, odds);
            if sizing.stake <= 0.0 {
                debug!(
                    "{}: stake fraction below floor (raw kelly {:.4})",
                    m.id, sizing.raw_kelly
                );
                stats.zero_stake += 1;
                continue;
            }

            let outcome = if winner == side {
                Outcome::Win
            } else {
                Outcome::Loss
            };
            let profit = match outcome {
                Outcome::Win => sizing.stake * (odds - 1.0),
                Outcome::Loss => -sizing.stake,
            };
            let bankroll_after = bankroll + profit;

            debug!(
                "{}: backed {} @ {:.2}, stake {:.2} -> {:?} {:+.2}",
                m.id,
                m.team(side),
                odds,
                sizing.stake,
                outcome,
                profit
            );

            ledger.record(Bet {
                sequence: ledger.len(),
                match_id: m.id.clone(),
                commence_time: m.commence_time,
                date: m.date,
                team1: m.team1.clone(),
                team2: m.team2.clone(),
                side,
                team_backed: m.team(side).to_string(),
                odds,
                predicted_probability: decision.predicted_probability,
                implied_probability: decision.implied_probability,
                edge: decision.edge,
                stake_fraction: sizing.fraction,
                stake: sizing.stake,
                outcome,
                profit,
                bankroll_before: bankroll,
                bankroll_after,
            })?;

            bankroll = bankroll_after;
            guard.observe(bankroll);
            stats.bets_placed += 1;
        }

        info!(
            "Backtest complete: {} bets, final bankroll {:.2} ({} skipped, {} risk-blocked)",
            stats.bets_placed, bankroll, stats.skipped_records, stats.risk_blocked
        );

        Ok(BacktestRun {
            config: self.config.clone(),
            initial_bankroll,
            final_bankroll: bankroll,
            ledger,
            stats,
        })
    }

    /// Pick the side to consider for one settled match
    fn evaluate<P: Predictor + ?Sized>(&self, m: &Match, predictor: &P) -> Result<Candidate> {
        let p = predictor.predict(m)?;
        if !(p > 0.0 && p < 1.0) {
            return Err(BacktestError::SkippableRecord(format!(
                "predicted probability {} outside (0, 1)",
                p
            )));
        }

        let (implied1, implied2) = if self.config.remove_vig {
            fair_probabilities(m.team1_odds, m.team2_odds)?
        } else {
            implied_probabilities(m.team1_odds, m.team2_odds)?
        };

        let candidate = |side: Side, probability: f64, implied: f64| {
            let odds = m.odds_for(side);
            Candidate {
                side,
                odds,
                decision: self.evaluator.evaluate(probability, implied, odds),
            }
        };

        let team1 = candidate(Side::Team1, p, implied1);
        if !self.config.consider_both_sides {
            return Ok(team1);
        }
        let team2 = candidate(Side::Team2, 1.0 - p, implied2);
        Ok(select_side(team1, team2))
    }
}

/// Prefer the accepted side with the larger edge; team1 wins ties and double rejections
fn select_side(team1: Candidate, team2: Candidate) -> Candidate {
    match (team1.decision.is_accepted(), team2.decision.is_accepted()) {
        (true, true) if team2.decision.edge > team1.decision.edge => team2,
        (false, true) => team2,
        _ => team1,
    }
}

/// Build an engine for `config` and run it once
pub fn run_backtest<P: Predictor + ?Sized>(
    config: StrategyConfig,
    matches: &[Match],
    predictor: &P,
) -> Result<BacktestRun> {
    BacktestEngine::new(config)?.run(matches, predictor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{FnPredictor, MarketPredictor};
    use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};

    fn config() -> StrategyConfig {
        StrategyConfig {
            initial_bankroll: 1000.0,
            min_edge: 0.05,
            min_probability: 0.55,
            use_kelly: true,
            max_kelly_fraction: 0.25,
            min_bet_fraction: 0.01,
            ..Default::default()
        }
    }

    fn match_on(day: i64, odds1: f64, odds2: f64, winner: Option<Side>) -> Match {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(day);
        Match::new(time, format!("A{}", day), format!("B{}", day), odds1, odds2, winner)
    }

    fn constant(p: f64) -> FnPredictor<impl Fn(&Match) -> Result<f64> + Send + Sync> {
        FnPredictor(move |_: &Match| -> Result<f64> { Ok(p) })
    }

    #[test]
    fn test_scenario_win() {
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team1))];
        let run = run_backtest(config(), &matches, &constant(0.60)).unwrap();

        assert_eq!(run.ledger.len(), 1);
        let bet = &run.ledger.bets()[0];
        assert!((bet.stake_fraction - 0.20).abs() < 1e-9);
        assert!((bet.stake - 200.0).abs() < 1e-9);
        assert!((bet.profit - 200.0).abs() < 1e-9);
        assert!((run.final_bankroll - 1200.0).abs() < 1e-9);
        assert!(bet.won());
    }

    #[test]
    fn test_scenario_loss() {
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team2))];
        let run = run_backtest(config(), &matches, &constant(0.60)).unwrap();

        let bet = &run.ledger.bets()[0];
        assert!((bet.profit + 200.0).abs() < 1e-9);
        assert!((run.final_bankroll - 800.0).abs() < 1e-9);
        assert_eq!(bet.outcome, Outcome::Loss);
    }

    fn mixed_matches() -> Vec<Match> {
        (0..40)
            .map(|i| {
                let odds1 = 1.6 + (i % 7) as f64 * 0.15;
                let winner = if i % 3 == 0 { Side::Team2 } else { Side::Team1 };
                match_on(i, odds1, 2.2, Some(winner))
            })
            .collect()
    }

    fn varied_predictor() -> FnPredictor<impl Fn(&Match) -> Result<f64> + Send + Sync> {
        FnPredictor(|m: &Match| -> Result<f64> {
            Ok(0.50 + (m.date.day() % 5) as f64 * 0.04)
        })
    }

    #[test]
    fn test_deterministic() {
        let matches = mixed_matches();
        let a = run_backtest(config(), &matches, &varied_predictor()).unwrap();
        let b = run_backtest(config(), &matches, &varied_predictor()).unwrap();

        assert!(!a.ledger.is_empty());
        assert_eq!(a.ledger, b.ledger);
        assert_eq!(a.final_bankroll, b.final_bankroll);
    }

    #[test]
    fn test_bankroll_equals_folded_profits() {
        let matches = mixed_matches();
        let run = run_backtest(config(), &matches, &varied_predictor()).unwrap();

        let folded = run
            .ledger
            .iter()
            .fold(run.initial_bankroll, |bankroll, bet| bankroll + bet.profit);
        assert_eq!(folded, run.final_bankroll);

        for bet in run.ledger.iter() {
            assert!(bet.stake <= config().max_kelly_fraction * bet.bankroll_before + 1e-9);
            assert!(bet.edge >= config().min_edge);
            assert!(bet.predicted_probability >= config().min_probability);
        }
        for pair in run.ledger.bets().windows(2) {
            assert!(pair[0].commence_time <= pair[1].commence_time);
            assert_eq!(pair[0].bankroll_after, pair[1].bankroll_before);
        }
    }

    #[test]
    fn test_unsorted_input_is_replayed_in_order() {
        let mut matches = mixed_matches();
        matches.reverse();
        let run = run_backtest(config(), &matches, &varied_predictor()).unwrap();

        let sorted = run_backtest(config(), &mixed_matches(), &varied_predictor()).unwrap();
        assert_eq!(run.ledger, sorted.ledger);
    }

    #[test]
    fn test_rejections_leave_bankroll_unchanged() {
        let matches = vec![
            // Probability floor
            match_on(0, 10.0, 1.1, Some(Side::Team1)),
            // Edge floor: implied 0.5263
            match_on(1, 1.9, 1.9, Some(Side::Team1)),
        ];
        let predictor = FnPredictor(|m: &Match| -> Result<f64> {
            Ok(if m.team1_odds > 5.0 { 0.40 } else { 0.56 })
        });
        let run = run_backtest(config(), &matches, &predictor).unwrap();

        assert!(run.ledger.is_empty());
        assert_eq!(run.final_bankroll, 1000.0);
        assert_eq!(run.stats.rejected_probability, 1);
        assert_eq!(run.stats.rejected_edge, 1);
        assert_eq!(run.stats.rejected(), 2);
    }

    #[test]
    fn test_zero_stake_writes_nothing() {
        // Edge passes but Kelly is below min_bet_fraction
        let config = StrategyConfig {
            min_edge: 0.0,
            min_probability: 0.50,
            min_bet_fraction: 0.10,
            ..config()
        };
        // p=0.56 at 1.9: raw kelly = (0.9*0.56 - 0.44)/0.9 = 0.071
        let matches = vec![match_on(0, 1.9, 1.9, Some(Side::Team1))];
        let run = run_backtest(config, &matches, &constant(0.56)).unwrap();

        assert!(run.ledger.is_empty());
        assert_eq!(run.stats.zero_stake, 1);
        assert_eq!(run.final_bankroll, 1000.0);
    }

    #[test]
    fn test_skippable_records_do_not_abort() {
        let matches = vec![
            match_on(0, 2.0, 2.0, None),
            match_on(1, 2.0, 2.0, Some(Side::Team1)),
            match_on(2, 2.0, 2.0, Some(Side::Team1)),
        ];
        let predictor = FnPredictor(|m: &Match| -> Result<f64> {
            if m.team1 == "A2" {
                Ok(1.5)
            } else {
                Ok(0.60)
            }
        });
        let run = run_backtest(config(), &matches, &predictor).unwrap();

        assert_eq!(run.stats.skipped_records, 2);
        assert_eq!(run.ledger.len(), 1);
        assert_eq!(run.ledger.bets()[0].match_id, matches[1].id);
    }

    #[test]
    fn test_corrupt_record_fails_before_loop() {
        let mut bad = match_on(5, 2.0, 2.0, Some(Side::Team1));
        bad.team2_odds = 1.0;
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team1)), bad];

        let mut engine = BacktestEngine::new(config()).unwrap();
        let err = engine.run(&matches, &constant(0.6)).unwrap_err();
        assert!(matches!(err, BacktestError::Data(_)));
        assert_eq!(engine.state(), EngineState::Initialized);
    }

    #[test]
    fn test_corrupt_record_outside_window_is_ignored() {
        let mut bad = match_on(30, 2.0, 2.0, Some(Side::Team1));
        bad.team1_odds = f64::NAN;
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team1)), bad];

        let config = config().with_window(None, NaiveDate::from_ymd_opt(2024, 1, 10));
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();
        assert_eq!(run.stats.matches_in_window, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StrategyConfig {
            min_probability: 1.0,
            ..config()
        };
        assert!(matches!(
            BacktestEngine::new(config),
            Err(BacktestError::Configuration(_))
        ));
    }

    #[test]
    fn test_second_run_fails() {
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team1))];
        let mut engine = BacktestEngine::new(config()).unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);

        engine.run(&matches, &constant(0.6)).unwrap();
        assert_eq!(engine.state(), EngineState::Completed);

        let err = engine.run(&matches, &constant(0.6)).unwrap_err();
        assert!(matches!(err, BacktestError::EngineState(_)));
    }

    #[test]
    fn test_date_window_inclusive() {
        let matches: Vec<Match> = (0..10)
            .map(|i| match_on(i, 2.0, 2.0, Some(Side::Team1)))
            .collect();
        let config = config().with_window(
            NaiveDate::from_ymd_opt(2024, 1, 3),
            NaiveDate::from_ymd_opt(2024, 1, 5),
        );
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();

        assert_eq!(run.stats.matches_in_window, 3);
        assert_eq!(run.ledger.len(), 3);
        assert_eq!(
            run.ledger.bets()[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_fixed_fraction_mode() {
        let config = StrategyConfig {
            use_kelly: false,
            fixed_stake_fraction: 0.02,
            ..config()
        };
        let matches = vec![
            match_on(0, 2.0, 2.0, Some(Side::Team1)),
            match_on(1, 2.0, 2.0, Some(Side::Team1)),
        ];
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();

        assert!((run.ledger.bets()[0].stake - 20.0).abs() < 1e-9);
        // Second stake sized from 1020
        assert!((run.ledger.bets()[1].stake - 20.4).abs() < 1e-9);
    }

    #[test]
    fn test_remove_vig_changes_implied_probability() {
        // Raw implied 0.5263 gives edge 0.0337; de-vigged 0.5 gives 0.06
        let matches = vec![match_on(0, 1.9, 1.9, Some(Side::Team1))];

        let raw = run_backtest(config(), &matches, &constant(0.56)).unwrap();
        assert!(raw.ledger.is_empty());

        let fair = StrategyConfig {
            remove_vig: true,
            ..config()
        };
        let run = run_backtest(fair, &matches, &constant(0.56)).unwrap();
        assert_eq!(run.ledger.len(), 1);
        assert!((run.ledger.bets()[0].implied_probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_consider_both_sides() {
        // p(team1) = 0.35 -> team2 at 0.65 vs implied 0.5
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team2))];

        let team1_only = run_backtest(config(), &matches, &constant(0.35)).unwrap();
        assert!(team1_only.ledger.is_empty());

        let both = StrategyConfig {
            consider_both_sides: true,
            ..config()
        };
        let run = run_backtest(both, &matches, &constant(0.35)).unwrap();
        let bet = &run.ledger.bets()[0];
        assert_eq!(bet.side, Side::Team2);
        assert_eq!(bet.team_backed, "B0");
        assert!((bet.predicted_probability - 0.65).abs() < 1e-12);
        assert!(bet.won());
    }

    fn both_sides_open() -> StrategyConfig {
        StrategyConfig {
            min_edge: 0.0,
            min_probability: 0.30,
            consider_both_sides: true,
            ..config()
        }
    }

    #[test]
    fn test_both_sides_accepted_larger_edge_wins() {
        // team1: 0.45 vs 0.333, team2: 0.55 vs 0.333
        let matches = vec![match_on(0, 3.0, 3.0, Some(Side::Team1))];
        let run = run_backtest(both_sides_open(), &matches, &constant(0.45)).unwrap();

        let bet = &run.ledger.bets()[0];
        assert_eq!(bet.side, Side::Team2);
        assert!((bet.edge - (0.55 - 1.0 / 3.0)).abs() < 1e-9);
        assert!(!bet.won());
    }

    #[test]
    fn test_both_sides_equal_edge_backs_team1() {
        let matches = vec![match_on(0, 3.0, 3.0, Some(Side::Team1))];
        let run = run_backtest(both_sides_open(), &matches, &constant(0.50)).unwrap();

        let bet = &run.ledger.bets()[0];
        assert_eq!(bet.side, Side::Team1);
        assert_eq!(bet.team_backed, "A0");
        assert!(bet.won());
    }

    #[test]
    fn test_filter_caps_are_counted() {
        let config = StrategyConfig {
            max_odds: Some(3.0),
            max_probability: Some(0.75),
            max_edge: Some(0.25),
            ..config()
        };
        let matches = vec![
            match_on(0, 4.0, 1.3, Some(Side::Team1)),
            match_on(1, 2.0, 2.0, Some(Side::Team1)),
            match_on(2, 2.8, 1.5, Some(Side::Team1)),
            match_on(3, 2.0, 2.0, Some(Side::Team1)),
        ];
        let predictor = FnPredictor(|m: &Match| -> Result<f64> {
            Ok(match m.team1.as_str() {
                "A0" => 0.60,
                "A1" => 0.80,
                _ => 0.65,
            })
        });
        let run = run_backtest(config, &matches, &predictor).unwrap();

        assert_eq!(run.stats.rejected_odds, 1);
        assert_eq!(run.stats.rejected_probability_cap, 1);
        assert_eq!(run.stats.rejected_edge_cap, 1);
        assert_eq!(run.stats.rejected(), 3);
        assert_eq!(run.ledger.len(), 1);
        assert_eq!(run.ledger.bets()[0].match_id, matches[3].id);
    }

    #[test]
    fn test_unsettled_after_halt_counts_as_skipped() {
        let config = StrategyConfig {
            max_drawdown: Some(0.10),
            ..config()
        };
        let matches = vec![
            match_on(0, 2.0, 2.0, Some(Side::Team2)),
            match_on(1, 2.0, 2.0, None),
            match_on(2, 2.0, 2.0, Some(Side::Team1)),
        ];
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();

        assert_eq!(run.ledger.len(), 1);
        assert_eq!(run.stats.skipped_records, 1);
        assert_eq!(run.stats.risk_blocked, 1);
        assert_eq!(run.stats.halted_by, Some(RiskBlock::Drawdown));
    }

    #[test]
    fn test_drawdown_limit_halts_run() {
        let config = StrategyConfig {
            max_drawdown: Some(0.30),
            ..config()
        };
        // Every bet loses 20% of the bankroll
        let matches: Vec<Match> = (0..6)
            .map(|i| match_on(i, 2.0, 2.0, Some(Side::Team2)))
            .collect();
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();

        // 1000 -> 800 -> 640 (36% down) then halted
        assert_eq!(run.ledger.len(), 2);
        assert_eq!(run.stats.risk_blocked, 4);
        assert_eq!(run.stats.halted_by, Some(RiskBlock::Drawdown));
        assert!((run.final_bankroll - 640.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_loss_limit() {
        let config = StrategyConfig {
            max_daily_loss: Some(0.15),
            ..config()
        };
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let matches: Vec<Match> = (0..3)
            .map(|i| {
                Match::new(
                    time + Duration::hours(i),
                    format!("A{}", i),
                    format!("B{}", i),
                    2.0,
                    2.0,
                    Some(Side::Team2),
                )
            })
            .chain(std::iter::once(match_on(1, 2.0, 2.0, Some(Side::Team1))))
            .collect();
        let run = run_backtest(config, &matches, &constant(0.6)).unwrap();

        // Day one: one loss (20%) then blocked; day two bets again
        assert_eq!(run.ledger.len(), 2);
        assert_eq!(run.stats.risk_blocked, 2);
        assert_eq!(run.stats.halted_by, None);
        assert!(run.ledger.bets()[1].won());
    }

    #[test]
    fn test_market_predictor_places_no_bets() {
        let run = run_backtest(config(), &mixed_matches(), &MarketPredictor).unwrap();
        assert!(run.ledger.is_empty());
        assert_eq!(run.summary().final_bankroll, 1000.0);
    }

    #[test]
    fn test_dyn_predictor() {
        let predictor: Box<dyn Predictor> = Box::new(constant(0.6));
        let matches = vec![match_on(0, 2.0, 2.0, Some(Side::Team1))];
        let run = run_backtest(config(), &matches, predictor.as_ref()).unwrap();
        assert_eq!(run.ledger.len(), 1);
    }
}
