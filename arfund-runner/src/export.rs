//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! Three export formats for a dashboard report:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: the 5-year and year-to-date trade tapes
//! - **Markdown**: a human-readable summary of the day's dashboard
//!
//! Persisted manifests carry a `schema_version` field. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arfund_core::domain::Trade;
use arfund_core::lock::{LockSource, WeeklyOutcome};

use crate::dashboard::{DashboardReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `DashboardReport` to pretty JSON.
pub fn export_json(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize DashboardReport to JSON")
}

/// Deserialize a `DashboardReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<DashboardReport> {
    let report: DashboardReport =
        serde_json::from_str(json).context("failed to deserialize DashboardReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade tape as CSV.
///
/// Columns: date, exit_date, position, entry_price, exit_price,
/// weekly_return, cumulative, month, iso_week
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "exit_date",
        "position",
        "entry_price",
        "exit_price",
        "weekly_return",
        "cumulative",
        "month",
        "iso_week",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.date.to_string(),
            &t.exit_date.to_string(),
            t.position.label(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &format!("{:.8}", t.weekly_return),
            &format!("{:.8}", t.cumulative),
            &t.month.to_string(),
            &t.iso_week.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a dashboard report.
///
/// Creates a directory named `{symbol}_{YYYYMMDD}/` under `output_dir`
/// containing:
/// - `manifest.json`: the full `DashboardReport`
/// - `trades_5y.csv`: leveraged trade tape
/// - `trades_ytd.csv`: year-to-date trade tape
/// - `report.md`: Markdown summary
///
/// Re-running for the same day overwrites the directory's files. Returns the
/// path to the directory.
pub fn save_artifacts(report: &DashboardReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("{}_{}", report.symbol, report.as_of.format("%Y%m%d"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let csv_5y = export_trades_csv(&report.backtest_5y.run.trades)?;
    std::fs::write(run_dir.join("trades_5y.csv"), &csv_5y)?;

    let csv_ytd = export_trades_csv(&report.backtest_ytd.run.trades)?;
    std::fs::write(run_dir.join("trades_ytd.csv"), &csv_ytd)?;

    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Load a `DashboardReport` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<DashboardReport> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("${v:.2}")).unwrap_or_else(|| "n/a".into())
}

fn week_cell(trade: Option<&Trade>) -> String {
    trade
        .map(|t| format!("{} ({:+.2}%)", t.date, t.weekly_return * 100.0))
        .unwrap_or_else(|| "n/a".into())
}

/// Generate a Markdown summary of a dashboard report.
pub fn generate_report(report: &DashboardReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# {} Weekly Signal Report\n\n", report.symbol));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| As Of | {} |\n", report.as_of));
    md.push_str(&format!(
        "| 5-Year Window | {} to {} ({} bars) |\n",
        report.backtest_5y.start, report.backtest_5y.end, report.backtest_5y.bar_count
    ));
    md.push_str(&format!(
        "| YTD Window | {} to {} ({} bars) |\n",
        report.backtest_ytd.start, report.backtest_ytd.end, report.backtest_ytd.bar_count
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | 5-Year (leveraged) | YTD |\n");
    md.push_str("| --- | --- | --- |\n");
    md.push_str(&format!(
        "| Total Return | {:.2}% | {:.2}% |\n",
        report.total_return_5y * 100.0,
        report.total_return_ytd * 100.0
    ));
    md.push_str(&format!(
        "| Weeks | {} | {} |\n",
        report.backtest_5y.run.trade_count(),
        report.backtest_ytd.run.trade_count()
    ));
    md.push_str(&format!(
        "| Win Rate | {:.1}% | {:.1}% |\n",
        report.backtest_5y.run.win_rate() * 100.0,
        report.backtest_ytd.run.win_rate() * 100.0
    ));
    md.push_str(&format!(
        "| Best Week | {} | {} |\n",
        week_cell(report.backtest_5y.run.best_week()),
        week_cell(report.backtest_ytd.run.best_week())
    ));
    md.push_str(&format!(
        "| Worst Week | {} | {} |\n",
        week_cell(report.backtest_5y.run.worst_week()),
        week_cell(report.backtest_ytd.run.worst_week())
    ));
    if report.backtest_5y.run.ruined {
        md.push_str("\nThe leveraged 5-year run lost all capital.\n");
    }
    md.push('\n');

    md.push_str("## Current Week\n\n");
    match &report.current_week {
        WeeklyOutcome::Locked {
            recommendation: rec,
            source,
        } => {
            md.push_str(&format!("- **Position:** {}\n", rec.position));
            md.push_str(&format!("- **Entry Date (last Friday):** {}\n", rec.date));
            if rec.position.is_directional() {
                md.push_str(&format!("- **ATM Strike:** {}\n", money(rec.atm_strike)));
                md.push_str(&format!("- **Option Price:** {}\n", money(rec.option_price)));
                md.push_str(&format!(
                    "- **TP:** {} | **SL:** {}\n",
                    money(rec.take_profit),
                    money(rec.stop_loss)
                ));
                if !rec.has_levels() {
                    md.push_str("- _Option quotes were unavailable when this week was locked._\n");
                }
            }
            if *source == LockSource::Provisional {
                md.push_str("- _Not locked: the lock file could not be written._\n");
            }
        }
        WeeklyOutcome::NoRecommendation(reason) => {
            md.push_str(&format!(
                "No trade recommendation available for this week ({}).\n",
                reason.describe()
            ));
        }
    }
    md.push('\n');

    md.push_str(&format!("## Monthly Trades YTD {}\n\n", report.calendar.year));
    for month in &report.calendar.months {
        md.push_str(&format!("### {}\n\n", month.name));
        if month.is_empty() {
            md.push_str("No trades this month.\n\n");
            continue;
        }
        md.push_str(&format!(
            "Month return: {:+.2}%\n\n",
            month.compounded_return() * 100.0
        ));
        md.push_str("| Date | Position | Entry | Exit | Return | Current Week |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- |\n");
        for row in &month.rows {
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.2}% | {} |\n",
                row.date,
                row.position,
                row.entry_price,
                row.exit_price,
                row.weekly_return * 100.0,
                if row.current_week { "✅" } else { "" }
            ));
        }
        md.push('\n');
    }

    if !report.data_quality_warnings.is_empty() {
        md.push_str("## Data Quality Warnings\n\n");
        for w in &report.data_quality_warnings {
            md.push_str(&format!("- {w}\n"));
        }
    }

    md
}
