use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare row pages fetched from two tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Align two pages and report per-row, per-column differences
    Compare(CompareArgs),
    /// Print the rows of a page that satisfy column filters
    Filter(FilterArgs),
    /// Check the virtual columns of a comparison config against its pages
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Comparison config (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Left page (.json or .csv); overrides the config
    #[arg(short, long)]
    pub left: Option<PathBuf>,
    /// Right page (.json or .csv); overrides the config
    #[arg(short, long)]
    pub right: Option<PathBuf>,
    /// Columns to compare; overrides the config
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Filters on the left page such as `Name=An||Binh`
    #[arg(long = "left-where", action = clap::ArgAction::Append)]
    pub left_where: Vec<String>,
    /// Filters on the right page such as `Name=An||Binh`
    #[arg(long = "right-where", action = clap::ArgAction::Append)]
    pub right_where: Vec<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Leave rows with status `same` out of the report
    #[arg(long = "only-differences")]
    pub only_differences: bool,
    /// Exit with status 2 when any difference is found
    #[arg(long = "fail-on-difference")]
    pub fail_on_difference: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Page to filter (.json or .csv)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Column filters such as `Customer=An (ID: 2)||Binh`; all must match
    #[arg(short = 'w', long = "where", action = clap::ArgAction::Append)]
    pub clauses: Vec<String>,
    /// Columns backed by a foreign key (enables relationship matching)
    #[arg(long = "relationship-column", action = clap::ArgAction::Append)]
    pub relationship_columns: Vec<String>,
    /// Restrict output to these columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Comparison config (YAML)
    #[arg(short, long)]
    pub config: PathBuf,
}
