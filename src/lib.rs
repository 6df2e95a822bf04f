pub mod align;
pub mod cli;
pub mod compare;
pub mod config;
pub mod data;
pub mod diff;
pub mod error;
pub mod filter;
pub mod join_index;
pub mod label;
pub mod normalize;
pub mod relationship;
pub mod report;
pub mod resolve;
pub mod virtual_columns;

use std::{env, fs, process, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, OutputFormat},
    compare::run_comparison,
    config::{ComparisonConfig, load_page},
    error::CompareError,
    filter::{FilterContext, FilterSet},
    resolve::Resolver,
    virtual_columns::{Side, validate},
};

/// Exit status of `compare --fail-on-difference` when differences exist.
pub const DIFFERENCE_EXIT_CODE: i32 = 2;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_compare", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => handle_compare(&args),
        Commands::Filter(args) => handle_filter(&args),
        Commands::Validate(args) => handle_validate(&args),
    }
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ComparisonConfig::load(path)
            .with_context(|| format!("Loading comparison config from {path:?}"))?,
        None => ComparisonConfig::default(),
    };
    if let Some(left) = &args.left {
        config.left.page = Some(left.clone());
    }
    if let Some(right) = &args.right {
        config.right.page = Some(right.clone());
    }
    if !args.columns.is_empty() {
        config.columns = clean_list(&args.columns);
    }
    config
        .left
        .filters
        .merge(FilterSet::parse_clauses(&args.left_where)?);
    config
        .right
        .filters
        .merge(FilterSet::parse_clauses(&args.right_where)?);
    debug!("Comparison columns: {:?}", config.columns);

    let request = config.into_request()?;
    info!(
        "Comparing {} left row(s) with {} right row(s)",
        request.left.page.rows.len(),
        request.right.page.rows.len()
    );
    let outcome = run_comparison(&request);

    let rendered = match args.format {
        OutputFormat::Table => report::render_comparison(&outcome, args.only_differences),
        OutputFormat::Json => {
            let value = report::json_report(&outcome, args.only_differences);
            let mut text =
                serde_json::to_string_pretty(&value).context("Serializing JSON report")?;
            text.push('\n');
            text
        }
    };
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Writing report to {path:?}"))?;
            info!("Report written to {:?}", path);
        }
        None => print!("{rendered}"),
    }

    if args.fail_on_difference && outcome.summary.has_differences() {
        warn!("Differences found; exiting with status {DIFFERENCE_EXIT_CODE}");
        process::exit(DIFFERENCE_EXIT_CODE);
    }
    Ok(())
}

fn handle_filter(args: &cli::FilterArgs) -> Result<()> {
    let page = load_page(&args.input).with_context(|| format!("Loading page {:?}", args.input))?;
    let filters = FilterSet::parse_clauses(&args.clauses)?;
    let context = args
        .relationship_columns
        .iter()
        .fold(FilterContext::new(), |ctx, column| {
            ctx.with_relationship_column(column.trim())
        });
    let resolver = Resolver::passthrough(Side::Left);
    let kept = filters.apply(&page.rows, &resolver, &context);

    let columns = if args.columns.is_empty() {
        page.column_set()
    } else {
        clean_list(&args.columns)
    };
    let rows = kept
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(|v| v.as_display()).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    print!("{}", report::render_table(&columns, &rows));
    info!("{} of {} row(s) matched", kept.len(), page.rows.len());
    Ok(())
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let config = ComparisonConfig::load(&args.config)
        .with_context(|| format!("Loading comparison config from {:?}", args.config))?;
    let virtual_columns = config.virtual_columns.clone();
    let request = config.into_request()?;
    let report = validate(
        &virtual_columns,
        &request.left.page.column_set(),
        &request.right.page.column_set(),
    );
    for column in &report.valid {
        println!("ok       {} {}", column.side(), column.name());
    }
    for invalid in &report.invalid {
        println!(
            "invalid  {} {}: {}",
            invalid.column.side(),
            invalid.column.name(),
            invalid.reason
        );
    }
    if report.is_clean() {
        info!("All {} virtual column(s) are valid", report.valid.len());
        Ok(())
    } else {
        Err(CompareError::InvalidVirtualColumns {
            count: report.invalid.len(),
        }
        .into())
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}
