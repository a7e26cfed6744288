use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::export::{write_xlsx_to, ChartLinks, ExportOptions, DEFAULT_EXPORT_FILENAME};
use crate::filters::{ColumnFilter, ColumnVisibility, FilterSet};
use crate::models::{Config, Notice, NoticeLevel, KEY_COLUMN, PLACEHOLDER};
use crate::session::{filter_settings, load_table, Session};
use crate::sources::DatasetSource;

/// Stock screening dashboard over two shared spreadsheets
#[derive(Parser, Debug)]
#[command(name = "hisse-dashboard")]
#[command(version)]
#[command(about = "Merge the fundamentals and technical spreadsheets, filter them, and export to Excel")]
#[command(long_about = "
Fetches the fundamentals and technical-indicator spreadsheets, joins them on the
stock name (\"Hisse Adı\"), and shows the result in an interactive terminal table
with per-column filters. Without a subcommand the dashboard opens.

Sources and options are read from the environment or a .env file
(HISSE_FUNDAMENTALS_SHEET, HISSE_TECHNICAL_SHEET, HISSE_SHEET_FORMAT, ...).

Examples:
  hisse-dashboard
  hisse-dashboard export -o screen.xlsx --range \"Cari Oran=1..\" --select \"Period=2024/12\"
  hisse-dashboard export --columns \"Hisse Adı,Cari Oran\" --links
  hisse-dashboard inspect --json
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Tui,
    /// Apply filters headlessly and write the result to an .xlsx file
    Export(ExportArgs),
    /// Print the merged table's shape and derived filters
    Inspect {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct ExportArgs {
    /// Output file (defaults to hisse_analizi_filtered.xlsx in HISSE_EXPORT_DIR)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated columns to export (defaults to all)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Numeric range, e.g. "Cari Oran=1..2.5"; either bound may be omitted
    #[arg(long = "range", value_parser = parse_range)]
    pub ranges: Vec<RangeArg>,

    /// Categorical selection, e.g. "Period=2024/12|2024/09"
    #[arg(long = "select", value_parser = parse_select)]
    pub selections: Vec<SelectArg>,

    /// Write stock names as links to their chart page
    #[arg(long)]
    pub links: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeArg {
    pub column: String,
    pub lo: Option<f64>,
    pub hi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectArg {
    pub column: String,
    pub values: Vec<String>,
}

fn parse_bound(raw: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("'{}' is not a finite number", raw)),
    }
}

pub fn parse_range(raw: &str) -> Result<RangeArg, String> {
    let (column, range) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected COLUMN=LO..HI, got '{}'", raw))?;
    let (lo, hi) = range
        .split_once("..")
        .ok_or_else(|| format!("expected LO..HI after '=', got '{}'", range))?;
    Ok(RangeArg {
        column: column.trim().to_string(),
        lo: parse_bound(lo)?,
        hi: parse_bound(hi)?,
    })
}

pub fn parse_select(raw: &str) -> Result<SelectArg, String> {
    let (column, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=V1|V2, got '{}'", raw))?;
    Ok(SelectArg {
        column: column.trim().to_string(),
        values: values.split('|').map(|v| v.trim().to_string()).collect(),
    })
}

/// Apply command-line filters and column choice to a session
pub fn apply_export_args(session: &mut Session, args: &ExportArgs) -> Result<()> {
    for range in &args.ranges {
        match session.filters_mut().get_mut(&range.column) {
            Some(ColumnFilter::Numeric(f)) => {
                let lo = range.lo.unwrap_or(f.min);
                let hi = range.hi.unwrap_or(f.max);
                f.set_range(lo, hi);
            }
            Some(ColumnFilter::Categorical(_)) => {
                bail!("'{}' is a categorical column; use --select", range.column)
            }
            None => bail!("'{}' has no numeric filter", range.column),
        }
    }

    for select in &args.selections {
        match session.filters_mut().get_mut(&select.column) {
            Some(ColumnFilter::Categorical(f)) => {
                let unknown: Vec<&String> =
                    select.values.iter().filter(|v| !f.options.contains(*v)).collect();
                if !unknown.is_empty() {
                    warn!("Values not found in '{}': {:?}", select.column, unknown);
                }
                f.select_only(&select.values);
            }
            Some(ColumnFilter::Numeric(_)) => {
                bail!("'{}' is a numeric column; use --range", select.column)
            }
            None => bail!("'{}' has no categorical filter", select.column),
        }
    }

    if !args.columns.is_empty() {
        let table_columns = session.table().columns().to_vec();
        let unknown: Vec<&String> = args
            .columns
            .iter()
            .filter(|c| !table_columns.iter().any(|t| t == c.trim()))
            .collect();
        if !unknown.is_empty() {
            bail!("Unknown columns: {:?}", unknown);
        }
        *session.visibility_mut() = ColumnVisibility::only(&table_columns, &args.columns);
    }
    Ok(())
}

fn log_notices(notices: &[Notice]) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning | NoticeLevel::Error => warn!("{}", notice.message),
        }
    }
}

/// Load, filter, and write an export; returns the written path
pub async fn run_export<S>(source: &S, config: &Config, args: &ExportArgs) -> Result<PathBuf>
where
    S: DatasetSource + Sync,
{
    let outcome = load_table(source, config).await;
    log_notices(&outcome.notices);
    let output = outcome.result?;

    let mut session = Session::new(output.table, filter_settings(config));
    apply_export_args(&mut session, args)?;

    let options = ExportOptions {
        placeholder: PLACEHOLDER.to_string(),
        chart_links: args.links.then(|| ChartLinks {
            key_column: KEY_COLUMN.to_string(),
            template: config.chart_url_template.clone(),
        }),
    };
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| config.export_dir.join(DEFAULT_EXPORT_FILENAME));
    let view = session.view();
    write_xlsx_to(&view, &options, &path).with_context(|| format!("writing {}", path.display()))
}

/// Shape of the merged table as printed by `inspect`
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub rows: usize,
    pub columns: Vec<String>,
    pub absent_columns: Vec<String>,
    pub filters: FilterSet,
    pub notices: Vec<Notice>,
}

pub async fn inspect<S>(source: &S, config: &Config) -> Result<InspectReport>
where
    S: DatasetSource + Sync,
{
    let outcome = load_table(source, config).await;
    let output = outcome.result?;
    let session = Session::new(output.table, filter_settings(config));
    Ok(InspectReport {
        rows: session.table().row_count(),
        columns: session.table().columns().to_vec(),
        absent_columns: output.absent_targets,
        filters: session.filters().clone(),
        notices: outcome.notices,
    })
}

pub fn render_report(report: &InspectReport, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(report).map_err(|e| anyhow!("serializing report: {}", e));
    }

    let mut out = format!("{} rows x {} columns\n", report.rows, report.columns.len());
    if !report.absent_columns.is_empty() {
        out.push_str(&format!("Not in either source: {}\n", report.absent_columns.join(", ")));
    }
    for filter in &report.filters.filters {
        match filter {
            ColumnFilter::Numeric(f) => out.push_str(&format!(
                "  {:<28} numeric     {:.2} .. {:.2} (step {:.4}, {} missing)\n",
                f.column, f.min, f.max, f.step, f.missing
            )),
            ColumnFilter::Categorical(f) => out.push_str(&format!(
                "  {:<28} categorical {} options\n",
                f.column,
                f.options.len()
            )),
        }
    }
    for notice in &report.notices {
        out.push_str(&format!("{:?}: {}\n", notice.level, notice.message));
    }
    Ok(out)
}
