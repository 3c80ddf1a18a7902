//! AR Fund CLI: weekly SMA signal dashboard, backtests, and lock management.
//!
//! Commands:
//! - `dashboard`: both backtests, this week's locked recommendation, and the
//!   monthly calendar
//! - `backtest`: a single weekly backtest over an explicit date range
//! - `lock status`: show what the weekly lock file holds
//! - `lock clear`: delete the weekly lock file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arfund_core::data::{CircuitBreaker, MarketDataProvider, SyntheticProvider, YahooProvider};
use arfund_core::domain::Trade;
use arfund_core::lock::{FileLockStore, LockError, LockSource, LockStore, WeeklyOutcome};
use arfund_runner::export::save_artifacts;
use arfund_runner::{build_dashboard, run_window_backtest, DashboardConfig, DashboardReport};

#[derive(Parser)]
#[command(name = "arfund", about = "AR Fund: weekly SMA crossover options signal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dashboard: backtests, current week, monthly calendar.
    Dashboard {
        /// Path to a TOML config file. Defaults to built-in SPY settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Treat this date (YYYY-MM-DD) as today.
        #[arg(long)]
        today: Option<String>,

        /// Use synthetic data instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Save manifest.json, trade CSVs, and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run one weekly backtest and print the trade tape.
    Backtest {
        /// Path to a TOML config file; its symbol and strategy section apply.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol to backtest. Overrides the config's symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to the config's history years.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to yesterday.
        #[arg(long)]
        end: Option<String>,

        /// Use raw returns instead of the configured leverage.
        #[arg(long, default_value_t = false)]
        no_leverage: bool,

        /// Use synthetic data instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Weekly lock file management.
    Lock {
        #[command(subcommand)]
        action: LockAction,
    },
}

#[derive(Subcommand)]
enum LockAction {
    /// Show the locked week and recommendation.
    Status {
        #[arg(long, default_value = "current_week_trade.json")]
        cache_file: PathBuf,
    },
    /// Remove the lock so the next dashboard run recomputes.
    Clear {
        #[arg(long, default_value = "current_week_trade.json")]
        cache_file: PathBuf,
    },
}

fn main() -> Result<()> {
    setup_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dashboard {
            config,
            today,
            synthetic,
            output_dir,
        } => run_dashboard_cmd(config, today, synthetic, output_dir),
        Commands::Backtest {
            config,
            symbol,
            start,
            end,
            no_leverage,
            synthetic,
        } => run_backtest_cmd(config, symbol, start, end, !no_leverage, synthetic),
        Commands::Lock { action } => match action {
            LockAction::Status { cache_file } => run_lock_status(&cache_file),
            LockAction::Clear { cache_file } => run_lock_clear(&cache_file),
        },
    }
}

/// Logs go to stderr so the tables on stdout stay clean. `RUST_LOG`
/// overrides the default `info` level.
fn setup_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn make_provider(synthetic: bool, today: NaiveDate) -> Result<Box<dyn MarketDataProvider>> {
    let provider: Box<dyn MarketDataProvider> = if synthetic {
        warn!("using synthetic data, results are not real");
        Box::new(SyntheticProvider::new(today))
    } else {
        let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
        Box::new(YahooProvider::new(circuit_breaker)?)
    };
    info!(provider = provider.name(), "market data provider ready");
    Ok(provider)
}

fn load_config(path: Option<PathBuf>) -> Result<DashboardConfig> {
    Ok(match path {
        Some(path) => DashboardConfig::from_file(&path)?,
        None => DashboardConfig::default(),
    })
}

fn run_dashboard_cmd(
    config_path: Option<PathBuf>,
    today: Option<String>,
    synthetic: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let today = parse_date(today.as_deref())?.unwrap_or_else(|| chrono::Local::now().date_naive());

    let provider = make_provider(synthetic, today)?;
    let store = FileLockStore::new(&config.dashboard.cache_file);

    let report = build_dashboard(&config, provider.as_ref(), &store, today)?;
    print_dashboard(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    leverage: bool,
    synthetic: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let symbol = symbol.as_deref().unwrap_or(config.symbol());
    let today = chrono::Local::now().date_naive();
    let end = parse_date(end.as_deref())?.unwrap_or_else(|| today.pred_opt().unwrap_or(today));
    let start = match parse_date(start.as_deref())? {
        Some(d) => d,
        None => end
            .checked_sub_months(Months::new(config.dashboard.history_years * 12))
            .context("cannot compute default start date")?,
    };
    if start > end {
        bail!("--start {start} is after --end {end}");
    }

    let provider = make_provider(synthetic, end)?;
    let (backtest, warnings) = run_window_backtest(
        provider.as_ref(),
        symbol,
        start,
        end,
        leverage,
        &config.strategy,
    )?;

    println!();
    println!("=== Weekly Backtest ===");
    println!("Symbol:         {symbol}");
    println!("Period:         {start} to {end}");
    println!("Bars:           {}", backtest.bar_count);
    let leverage_label = if leverage {
        format!(
            "{}x / {}x",
            config.strategy.directional_leverage, config.strategy.straddle_leverage
        )
    } else {
        "none".to_string()
    };
    println!("Leverage:       {leverage_label}");
    println!();
    print_trade_tape(&backtest.run.trades);
    println!();
    println!("Weeks:          {}", backtest.run.trade_count());
    println!("Win Rate:       {:.1}%", backtest.run.win_rate() * 100.0);
    println!("Total Return:   {:.2}%", backtest.total_return() * 100.0);
    if let (Some(best), Some(worst)) = (backtest.run.best_week(), backtest.run.worst_week()) {
        println!("Best Week:      {} ({:+.2}%)", best.date, best.weekly_return * 100.0);
        println!("Worst Week:     {} ({:+.2}%)", worst.date, worst.weekly_return * 100.0);
    }
    if backtest.run.ruined {
        println!("WARNING: capital was wiped out");
    }
    for w in &warnings {
        println!("WARNING: {w}");
    }
    println!();

    Ok(())
}

fn run_lock_status(cache_file: &Path) -> Result<()> {
    let store = FileLockStore::new(cache_file);
    match store.load() {
        Ok(None) => println!("No weekly lock at {}", cache_file.display()),
        Ok(Some(record)) => {
            let this_week = chrono::Local::now().date_naive().iso_week().week();
            let rec = record.to_recommendation();
            println!("Lock file:      {}", cache_file.display());
            println!(
                "Week:           {}{}",
                record.week,
                if record.week == this_week { " (current)" } else { " (stale)" }
            );
            println!("Date:           {}", rec.date);
            println!("Position:       {}", rec.position);
            println!("ATM Strike:     {}", money(rec.atm_strike));
            println!("Option Price:   {}", money(rec.option_price));
            println!("TP / SL:        {} / {}", money(rec.take_profit), money(rec.stop_loss));
        }
        Err(LockError::Corrupt(reason)) => {
            println!("Lock file {} is corrupt: {reason}", cache_file.display());
            println!("It will be recomputed on the next dashboard run.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn run_lock_clear(cache_file: &Path) -> Result<()> {
    FileLockStore::new(cache_file).clear()?;
    println!("Cleared weekly lock: {}", cache_file.display());
    Ok(())
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("${v:.2}")).unwrap_or_else(|| "-".into())
}

fn print_trade_tape(trades: &[Trade]) {
    println!(
        "{:<12} {:<13} {:>5} {:>10} {:>10} {:>9} {:>11}",
        "Date", "Position", "Days", "Entry", "Exit", "Return", "Cumulative"
    );
    println!("{}", "-".repeat(76));
    for t in trades {
        println!(
            "{:<12} {:<13} {:>5} {:>10.2} {:>10.2} {:>8.2}% {:>11.4}",
            t.date.to_string(),
            t.position.label(),
            t.holding_calendar_days(),
            t.entry_price,
            t.exit_price,
            t.weekly_return * 100.0,
            t.cumulative
        );
    }
}

fn print_dashboard(report: &DashboardReport) {
    println!();
    println!("=== {} Options Fund ===", report.symbol);
    println!("As of:                 {}", report.as_of);
    println!(
        "5-Year Strategy Return: {:.2}%",
        report.total_return_5y * 100.0
    );
    println!("YTD Return:            {:.2}%", report.total_return_ytd * 100.0);
    if report.backtest_5y.run.ruined {
        println!("WARNING: the leveraged 5-year run lost all capital");
    }
    if report.has_synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for w in &report.data_quality_warnings {
        println!("WARNING: {w}");
    }

    println!();
    println!("--- Current Week Trade (Locked Monday Morning) ---");
    match &report.current_week {
        WeeklyOutcome::Locked {
            recommendation: rec,
            source,
        } => {
            println!("Position:              {}", rec.position);
            println!("Entry Date (last Fri): {}", rec.date);
            if rec.position.is_directional() {
                println!("ATM Strike:            {}", money(rec.atm_strike));
                println!("Option Price:          {}", money(rec.option_price));
                println!(
                    "TP: {} | SL: {}",
                    money(rec.take_profit),
                    money(rec.stop_loss)
                );
                if !rec.has_levels() {
                    println!("(option quotes were unavailable when this week was locked)");
                }
            }
            match source {
                LockSource::Cached => println!("(locked earlier this week)"),
                LockSource::Computed => println!("(locked now)"),
                LockSource::Provisional => {
                    println!("(not locked: the lock file could not be written, will retry)")
                }
            }
        }
        WeeklyOutcome::NoRecommendation(reason) => {
            println!("No trade recommendation available for this week.");
            println!("Reason: {}", reason.describe());
        }
    }

    println!();
    println!("--- Monthly Trades YTD {} ---", report.calendar.year);
    for month in &report.calendar.months {
        println!();
        if month.is_empty() {
            println!("{}", month.name);
            println!("  No trades this month.");
            continue;
        }
        println!("{} ({:+.2}%)", month.name, month.compounded_return() * 100.0);
        println!(
            "  {:<12} {:<13} {:>10} {:>10} {:>9}  {}",
            "Date", "Position", "Entry", "Exit", "Return", "Current Week"
        );
        for row in &month.rows {
            println!(
                "  {:<12} {:<13} {:>10.2} {:>10.2} {:>8.2}%  {}",
                row.date.to_string(),
                row.position.label(),
                row.entry_price,
                row.exit_price,
                row.weekly_return * 100.0,
                if row.current_week { "✅" } else { "" }
            );
        }
    }
    println!();
}
