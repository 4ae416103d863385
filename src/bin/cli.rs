//! LCK Backtest CLI - replay a wagering strategy over historical matches

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use lck_backtest::backtesting::report::save_json;
use lck_backtest::backtesting::{
    default_grid, run_periods, run_sweep, BacktestEngine, BacktestReport, SweepOutcome, SweepPoint,
};
use lck_backtest::core::kelly::StakeSizer;
use lck_backtest::core::odds::{calculate_vig, fair_probabilities, implied_probabilities};
use lck_backtest::data::MatchDataset;
use lck_backtest::{BacktestJob, MarketPredictor, Predictor, StrategyConfig, TablePredictor};

const DEFAULT_OUTPUT_DIR: &str = "backtest_results";

#[derive(Parser)]
#[command(name = "lck-backtest")]
#[command(author, version, about = "Historical wagering strategy backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest and save a report
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Directory for reports
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Print the summary without writing report files
        #[arg(long)]
        no_save: bool,
    },

    /// Compare edge/probability thresholds
    Sweep {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Threshold pair as EDGE:PROB (repeatable, default: built-in grid)
        #[arg(long = "point", value_parser = parse_point)]
        points: Vec<SweepPoint>,

        /// Write all outcomes to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Run the strategy separately for each calendar year
    Periods {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Write all outcomes to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Convert a two-way market and optionally size a bet
    Odds {
        /// Decimal odds for team1
        odds1: f64,

        /// Decimal odds for team2
        odds2: f64,

        /// Model probability that team1 wins
        #[arg(short, long)]
        probability: Option<f64>,

        #[arg(long, default_value = "1000")]
        bankroll: f64,

        /// Maximum Kelly fraction
        #[arg(long, default_value = "0.25")]
        max_kelly: f64,
    },
}

/// Where the data comes from
#[derive(Args)]
struct InputArgs {
    /// JSON job file (name, odds_file, matches_file, strategy fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Odds CSV (commence_time, team1, team2, team1_odds, team2_odds[, bookmaker])
    #[arg(long)]
    odds: Option<PathBuf>,

    /// Results CSV (date, team1, team2, winner[, duration])
    #[arg(long)]
    matches: Option<PathBuf>,

    /// Predictions CSV (date, team1, team2, probability)
    #[arg(long)]
    predictions: Option<PathBuf>,

    /// Use only this bookmaker's quotes
    #[arg(long)]
    bookmaker: Option<String>,

    /// Run name used for the report directory
    #[arg(long)]
    name: Option<String>,
}

/// Overrides for individual strategy fields
#[derive(Args)]
struct StrategyArgs {
    #[arg(long)]
    bankroll: Option<f64>,

    #[arg(long)]
    min_edge: Option<f64>,

    #[arg(long)]
    min_prob: Option<f64>,

    /// Skip bets whose edge exceeds this
    #[arg(long)]
    max_edge: Option<f64>,

    #[arg(long)]
    max_prob: Option<f64>,

    #[arg(long)]
    min_odds: Option<f64>,

    #[arg(long)]
    max_odds: Option<f64>,

    #[arg(long)]
    max_kelly: Option<f64>,

    #[arg(long)]
    min_bet: Option<f64>,

    /// Bet this bankroll fraction instead of Kelly sizing
    #[arg(long)]
    fixed_stake: Option<f64>,

    /// First match date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last match date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long)]
    max_daily_loss: Option<f64>,

    #[arg(long)]
    max_drawdown: Option<f64>,

    /// Remove the bookmaker margin from implied probabilities
    #[arg(long)]
    remove_vig: bool,

    /// Also consider backing team2
    #[arg(long)]
    both_sides: bool,
}

impl StrategyArgs {
    fn apply(&self, config: &mut StrategyConfig) {
        if let Some(v) = self.bankroll {
            config.initial_bankroll = v;
        }
        if let Some(v) = self.min_edge {
            config.min_edge = v;
        }
        if let Some(v) = self.min_prob {
            config.min_probability = v;
        }
        if self.max_edge.is_some() {
            config.max_edge = self.max_edge;
        }
        if self.max_prob.is_some() {
            config.max_probability = self.max_prob;
        }
        if self.min_odds.is_some() {
            config.min_odds = self.min_odds;
        }
        if self.max_odds.is_some() {
            config.max_odds = self.max_odds;
        }
        if let Some(v) = self.max_kelly {
            config.max_kelly_fraction = v;
        }
        if let Some(v) = self.min_bet {
            config.min_bet_fraction = v;
        }
        if let Some(v) = self.fixed_stake {
            config.use_kelly = false;
            config.fixed_stake_fraction = v;
        }
        if self.start.is_some() {
            config.start_date = self.start;
        }
        if self.end.is_some() {
            config.end_date = self.end;
        }
        if self.max_daily_loss.is_some() {
            config.max_daily_loss = self.max_daily_loss;
        }
        if self.max_drawdown.is_some() {
            config.max_drawdown = self.max_drawdown;
        }
        config.remove_vig |= self.remove_vig;
        config.consider_both_sides |= self.both_sides;
    }
}

fn parse_point(raw: &str) -> std::result::Result<SweepPoint, String> {
    let (edge, prob) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected EDGE:PROB, got `{}`", raw))?;
    let edge = edge.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let prob = prob.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(SweepPoint::new(edge, prob))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    println!("{}", "LCK Backtest".cyan().bold());
    println!();

    match cli.command {
        Commands::Run {
            input,
            strategy,
            output,
            no_save,
        } => run_single(&input, &strategy, &output, no_save),
        Commands::Sweep {
            input,
            strategy,
            points,
            json,
        } => run_threshold_sweep(&input, &strategy, points, json.as_deref()),
        Commands::Periods {
            input,
            strategy,
            json,
        } => run_yearly(&input, &strategy, json.as_deref()),
        Commands::Odds {
            odds1,
            odds2,
            probability,
            bankroll,
            max_kelly,
        } => show_odds(odds1, odds2, probability, bankroll, max_kelly),
    }
}

/// Merge the job file (if any) with command-line inputs
fn resolve_job(input: &InputArgs, strategy: &StrategyArgs) -> Result<BacktestJob> {
    let mut job = match &input.config {
        Some(path) => BacktestJob::from_json_file(path)
            .with_context(|| format!("Failed to load job file {:?}", path))?,
        None => {
            let (Some(odds), Some(matches)) = (&input.odds, &input.matches) else {
                bail!("either --config or both --odds and --matches are required");
            };
            BacktestJob {
                name: "default_backtest".to_string(),
                odds_file: odds.clone(),
                matches_file: matches.clone(),
                predictions_file: None,
                bookmaker: None,
                strategy: StrategyConfig::default(),
            }
        }
    };

    if let Some(path) = &input.odds {
        job.odds_file = path.clone();
    }
    if let Some(path) = &input.matches {
        job.matches_file = path.clone();
    }
    if input.predictions.is_some() {
        job.predictions_file = input.predictions.clone();
    }
    if input.bookmaker.is_some() {
        job.bookmaker = input.bookmaker.clone();
    }
    if let Some(name) = &input.name {
        job.name = name.clone();
    }
    strategy.apply(&mut job.strategy);
    job.strategy
        .validate()
        .context("Invalid strategy configuration")?;

    Ok(job)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

fn load_inputs(job: &BacktestJob) -> Result<(MatchDataset, Box<dyn Predictor>)> {
    let pb = spinner("Loading odds and results...");
    let dataset = MatchDataset::load(&job.odds_file, &job.matches_file, job.bookmaker.as_deref())
        .with_context(|| {
            format!(
                "Failed to load {:?} / {:?}",
                job.odds_file, job.matches_file
            )
        })?;

    let predictor: Box<dyn Predictor> = match &job.predictions_file {
        Some(path) => Box::new(
            TablePredictor::from_csv(path)
                .with_context(|| format!("Failed to load predictions {:?}", path))?,
        ),
        None => {
            warn!("No predictions file given; using the market baseline (expect no bets)");
            Box::new(MarketPredictor)
        }
    };
    pb.finish_and_clear();

    println!(
        "Loaded {} matches ({} unsettled)",
        dataset.len().to_string().bold(),
        dataset.unsettled
    );
    Ok((dataset, predictor))
}

fn print_config(config: &StrategyConfig) {
    println!("Initial bankroll: {:.2}", config.initial_bankroll);
    println!(
        "Min edge: {:.1}%  Min probability: {:.1}%",
        config.min_edge * 100.0,
        config.min_probability * 100.0
    );
    if config.use_kelly {
        println!(
            "Kelly sizing: cap {:.0}%, floor {:.1}%",
            config.max_kelly_fraction * 100.0,
            config.min_bet_fraction * 100.0
        );
    } else {
        println!(
            "Fixed stake: {:.1}% of bankroll",
            config.fixed_stake_fraction * 100.0
        );
    }
    if config.start_date.is_some() || config.end_date.is_some() {
        println!(
            "Window: {} to {}",
            config
                .start_date
                .map_or_else(|| "start".to_string(), |d| d.to_string()),
            config
                .end_date
                .map_or_else(|| "end".to_string(), |d| d.to_string())
        );
    }
    println!();
}

fn run_single(input: &InputArgs, strategy: &StrategyArgs, output: &Path, no_save: bool) -> Result<()> {
    let job = resolve_job(input, strategy)?;
    println!("{} {}", "Running backtest".green(), job.name.bold());
    print_config(&job.strategy);

    let (dataset, predictor) = load_inputs(&job)?;

    let pb = spinner("Replaying matches...");
    let mut engine = BacktestEngine::new(job.strategy.clone())?;
    let run = engine
        .run(&dataset.matches, predictor.as_ref())
        .with_context(|| "Backtest failed")?;
    pb.finish_and_clear();

    let report = BacktestReport::new(&job.name, &run);
    println!("{}", report.summary_text());

    let profit = report.summary.total_profit;
    let line = format!("Total profit: {:+.2} (ROI {:.2}%)", profit, report.summary.roi);
    if profit >= 0.0 {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }

    if !no_save {
        let dir = report
            .save(output)
            .with_context(|| format!("Failed to write report under {:?}", output))?;
        println!("{}: {:?}", "Saved".green(), dir);
    }

    Ok(())
}

fn print_outcomes(title: &str, outcomes: &[SweepOutcome]) {
    println!("\n{}", title.yellow().bold());
    println!(
        "{:<24} {:>6} {:>8} {:>10} {:>12} {:>9} {:>9}",
        "Run", "Bets", "Win %", "Wagered", "Profit", "ROI %", "Max DD %"
    );
    println!("{}", "-".repeat(84));
    for o in outcomes {
        let row = format!(
            "{:<24} {:>6} {:>7.1}% {:>10.2} {:>+12.2} {:>8.2}% {:>8.1}%",
            o.label,
            o.summary.total_bets,
            o.summary.win_rate * 100.0,
            o.summary.total_wagered,
            o.summary.total_profit,
            o.summary.roi,
            o.risk.max_drawdown_pct
        );
        if o.summary.total_profit > 0.0 {
            println!("{}", row.green());
        } else {
            println!("{}", row);
        }
    }
}

fn run_threshold_sweep(
    input: &InputArgs,
    strategy: &StrategyArgs,
    points: Vec<SweepPoint>,
    json: Option<&Path>,
) -> Result<()> {
    let job = resolve_job(input, strategy)?;
    let grid = if points.is_empty() {
        default_grid()
    } else {
        points
    };
    println!(
        "{} {} threshold combinations",
        "Sweeping".green(),
        grid.len()
    );
    print_config(&job.strategy);

    let (dataset, predictor) = load_inputs(&job)?;

    let pb = spinner("Running sweep...");
    let outcomes = run_sweep(&job.strategy, &grid, &dataset.matches, predictor.as_ref())
        .context("Sweep failed")?;
    pb.finish_and_clear();

    print_outcomes("Threshold comparison:", &outcomes);

    if let Some(path) = json {
        save_json(&outcomes, path).with_context(|| format!("Failed to write {:?}", path))?;
        println!("{}: {:?}", "Saved".green(), path);
    }
    Ok(())
}

fn run_yearly(input: &InputArgs, strategy: &StrategyArgs, json: Option<&Path>) -> Result<()> {
    let job = resolve_job(input, strategy)?;
    let (dataset, predictor) = load_inputs(&job)?;

    let years = dataset.years();
    if years.is_empty() {
        bail!("no matches to split into periods");
    }
    println!(
        "{} {} yearly periods",
        "Running".green(),
        years.len()
    );
    print_config(&job.strategy);

    let pb = spinner("Running periods...");
    let outcomes = run_periods(&job.strategy, &years, &dataset.matches, predictor.as_ref())
        .context("Period runs failed")?;
    pb.finish_and_clear();

    print_outcomes("Performance by year:", &outcomes);

    if let Some(path) = json {
        save_json(&outcomes, path).with_context(|| format!("Failed to write {:?}", path))?;
        println!("{}: {:?}", "Saved".green(), path);
    }
    Ok(())
}

fn show_odds(
    odds1: f64,
    odds2: f64,
    probability: Option<f64>,
    bankroll: f64,
    max_kelly: f64,
) -> Result<()> {
    let (p1, p2) = implied_probabilities(odds1, odds2).context("Invalid odds")?;
    let (f1, f2) = fair_probabilities(odds1, odds2)?;

    println!("{}", "Market:".yellow().bold());
    println!("{:>8} {:>10} {:>10} {:>10}", "Side", "Odds", "Implied", "Fair");
    println!("{}", "-".repeat(42));
    println!("{:>8} {:>10.2} {:>9.1}% {:>9.1}%", "team1", odds1, p1 * 100.0, f1 * 100.0);
    println!("{:>8} {:>10.2} {:>9.1}% {:>9.1}%", "team2", odds2, p2 * 100.0, f2 * 100.0);
    println!("Bookmaker margin: {:.2}%", calculate_vig(p1, p2));

    if let Some(p) = probability {
        let config = StrategyConfig {
            initial_bankroll: bankroll,
            max_kelly_fraction: max_kelly,
            ..Default::default()
        };
        config.validate().context("Invalid sizing parameters")?;
        let sizer = StakeSizer::from_config(&config);

        println!("\n{}", "Kelly sizing:".yellow().bold());
        for (label, prob, odds, implied) in [
            ("team1", p, odds1, p1),
            ("team2", 1.0 - p, odds2, p2),
        ] {
            let sizing = sizer.size(bankroll, prob, odds);
            let line = format!(
                "{:>8}  p={:.3}  edge={:+.3}  kelly={:+.4}  stake={:.2}",
                label,
                prob,
                prob - implied,
                sizing.raw_kelly,
                sizing.stake
            );
            if sizing.stake > 0.0 {
                println!("{}", line.green());
            } else {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
