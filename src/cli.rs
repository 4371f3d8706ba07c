use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Endlessly scrolling month calendar with per-day annotations.
#[derive(Parser)]
#[command(name = "scrollcal", version, about = "Three-month calendar window with annotations")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the annotation file.
    #[arg(short, long, global = true, default_value = "annotations.txt")]
    pub file: PathBuf,

    /// Week starts on Sunday (default: Monday).
    #[arg(long = "sunday-first", global = true)]
    pub sunday_first: bool,

    /// Hide ISO week numbers.
    #[arg(long = "no-weeks", global = true)]
    pub no_weeks: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the window around a month.
    Show(MonthArgs),
    /// Record an annotation for a day.
    Add(AddArgs),
    /// Feed scroll offsets through the paging controller.
    Scroll(ScrollArgs),
}

/// Month selection shared by `show` and `scroll`.
#[derive(clap::Args)]
pub struct MonthArgs {
    /// Reference month (1-12), defaults to the current month.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Reference year, defaults to the current year.
    #[arg(short, long)]
    pub year: Option<i32>,
}

/// Arguments for the `add` subcommand.
#[derive(clap::Args)]
pub struct AddArgs {
    /// Day to annotate (YYYY-MM-DD).
    #[arg(short, long)]
    pub date: NaiveDate,

    /// Record kind label.
    #[arg(short, long, default_value = "lotto")]
    pub kind: String,

    /// Record amount.
    #[arg(short, long)]
    pub amount: i64,
}

/// Arguments for the `scroll` subcommand.
#[derive(clap::Args)]
pub struct ScrollArgs {
    #[command(flatten)]
    pub month: MonthArgs,

    /// Width of one month page in offset units.
    #[arg(long = "page-width", default_value_t = 1.0)]
    pub page_width: f64,

    /// Scroll offsets, each treated as a settled position.
    #[arg(required = true, allow_negative_numbers = true)]
    pub offsets: Vec<f64>,
}
