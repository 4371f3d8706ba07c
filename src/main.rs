mod cli;
mod logging;
mod terminal;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use scrollcal::{
    AnnotationGateway, FileGateway, PagingConfig, PagingController, ScrollEvent, WeekStart,
    build_annotated_window,
};
use tokio::sync::mpsc;

use crate::cli::{AddArgs, Cli, Command, MonthArgs, ScrollArgs};
use crate::terminal::{RenderOptions, TerminalSurface};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let today = chrono::Local::now().naive_local().date();
    let options = RenderOptions {
        week_start: if cli.sunday_first {
            WeekStart::Sunday
        } else {
            WeekStart::Monday
        },
        show_week_numbers: !cli.no_weeks,
    };

    match cli.command {
        Command::Show(args) => show(&cli.file, options, today, args).await,
        Command::Add(args) => add(&cli.file, args).await,
        Command::Scroll(args) => scroll(&cli.file, options, today, args).await,
    }
}

/// Reference date for the requested month; today when it is the current one.
fn reference_date(args: &MonthArgs, today: NaiveDate) -> Result<NaiveDate> {
    let year = args.year.unwrap_or(today.year());
    let month = args.month.unwrap_or(today.month());
    if year == today.year() && month == today.month() {
        return Ok(today);
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month {month} of year {year}"))
}

async fn open_store(path: &std::path::Path) -> Result<FileGateway> {
    FileGateway::open(path)
        .await
        .with_context(|| format!("failed to open annotation file {}", path.display()))
}

async fn show(
    path: &std::path::Path,
    options: RenderOptions,
    today: NaiveDate,
    args: MonthArgs,
) -> Result<()> {
    let reference = reference_date(&args, today)?;
    let gateway = open_store(path).await?;
    let config = PagingConfig {
        week_start: options.week_start,
        ..PagingConfig::default()
    };

    let window = build_annotated_window(
        reference,
        config.week_start,
        &gateway,
        config.lookup_timeout,
    )
    .await?;
    print!("{}", terminal::render_window(&window, &options, today));
    print!("{}", terminal::render_annotations(&window, today));
    Ok(())
}

async fn add(path: &std::path::Path, args: AddArgs) -> Result<()> {
    let gateway = open_store(path).await?;
    let record = gateway
        .create(args.date, &args.kind, args.amount)
        .await
        .with_context(|| format!("failed to store annotation in {}", path.display()))?;
    println!(
        "Added {} - {} {} ({} records)",
        record.date.format("%a, %d %b %Y"),
        record.kind,
        record.amount,
        gateway.len().await
    );
    Ok(())
}

async fn scroll(
    path: &std::path::Path,
    options: RenderOptions,
    today: NaiveDate,
    args: ScrollArgs,
) -> Result<()> {
    let reference = reference_date(&args.month, today)?;
    let gateway = Arc::new(open_store(path).await?);
    let config = PagingConfig {
        week_start: options.week_start,
        page_width: args.page_width,
        tolerance: args.page_width * 0.01,
        ..PagingConfig::default()
    };
    let pause = config.debounce * 4;

    let surface = TerminalSurface::new(options, today);
    let controller = PagingController::annotated(reference, config, surface, gateway)?;

    let (tx, rx) = mpsc::channel(16);
    let feed = async move {
        for offset in args.offsets {
            tx.send(ScrollEvent::Offset(offset)).await?;
            tx.send(ScrollEvent::Settled).await?;
            tokio::time::sleep(pause).await;
        }
        anyhow::Ok(())
    };

    let (fed, finished) = tokio::join!(feed, controller.run(rx));
    fed.context("scroll event channel closed early")?;
    let controller = finished?;
    println!(
        "\nReference month: {} (surface at offset {})",
        controller.reference_date().format("%B %Y"),
        controller.surface().offset()
    );
    Ok(())
}
