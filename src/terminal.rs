//! ANSI rendering of window buffers.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use scrollcal::{
    DayCell, GRID_CELLS, RenderingSurface, WeekStart, WindowBuffer, WindowSlot, month_name,
};
use tracing::info;

const BOLD_CODE: &str = "\x1b[1m";
const DIM_CODE: &str = "\x1b[2m";
const REVERSE_CODE: &str = "\x1b[7m";
const WEEKEND_CODE: &str = "\x1b[31m";
const WEEK_NUM_CODE: &str = "\x1b[34m";
const TODAY_CODE: &str = "\x1b[43m\x1b[30m";
const RESET_CODE: &str = "\x1b[0m";

const BLOCK_GAP: &str = "    ";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub week_start: WeekStart,
    pub show_week_numbers: bool,
}

impl RenderOptions {
    fn block_width(&self) -> usize {
        // "Wk " plus 7 cells of "dd ".
        if self.show_week_numbers { 24 } else { 21 }
    }
}

fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

fn weekday_header(options: &RenderOptions) -> String {
    let mut line = String::new();
    if options.show_week_numbers {
        line.push_str(&format!("{WEEK_NUM_CODE}Wk{RESET_CODE} "));
    }
    for weekday in options.week_start.weekdays() {
        let label = weekday_label(weekday);
        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            line.push_str(&format!("{WEEKEND_CODE}{label}{RESET_CODE} "));
        } else {
            line.push_str(&format!("{label} "));
        }
    }
    line
}

fn month_title(block: &[DayCell], width: usize) -> String {
    let title = block
        .iter()
        .find(|cell| cell.belongs_to_reference_month)
        .map(|cell| format!("{} {}", month_name(cell.date.month()), cell.date.year()))
        .unwrap_or_default();
    let padding = width.saturating_sub(title.len()) / 2;
    let r_padding = width.saturating_sub(padding + title.len());
    format!("{}{BOLD_CODE}{title}{RESET_CODE}{}", " ".repeat(padding), " ".repeat(r_padding))
}

fn render_cell(cell: &DayCell, today: NaiveDate) -> String {
    let mut codes = String::new();
    if cell.date == today {
        codes.push_str(TODAY_CODE);
    } else {
        if !cell.belongs_to_reference_month {
            codes.push_str(DIM_CODE);
        }
        if cell.is_weekend() {
            codes.push_str(WEEKEND_CODE);
        }
        if !cell.annotations.is_empty() {
            codes.push_str(REVERSE_CODE);
        }
    }
    format!("{codes}{:2}{RESET_CODE} ", cell.day_number())
}

fn render_week_row(row: &[DayCell], options: &RenderOptions, today: NaiveDate) -> String {
    let mut line = String::new();
    if options.show_week_numbers {
        let week = row.first().map(|cell| cell.date.iso_week().week()).unwrap_or_default();
        line.push_str(&format!("{WEEK_NUM_CODE}{week:2}{RESET_CODE} "));
    }
    for cell in row {
        line.push_str(&render_cell(cell, today));
    }
    line
}

/// The previous, current and next month grids side by side.
pub fn render_window(window: &WindowBuffer, options: &RenderOptions, today: NaiveDate) -> String {
    let blocks = [WindowSlot::Previous, WindowSlot::Current, WindowSlot::Next]
        .map(|slot| window.block(slot));
    let width = options.block_width();
    let mut out = String::new();

    let titles: Vec<String> = blocks.iter().map(|block| month_title(block, width)).collect();
    out.push_str(&titles.join(BLOCK_GAP));
    out.push('\n');

    let header = weekday_header(options);
    out.push_str(&[header.as_str(); 3].join(BLOCK_GAP));
    out.push('\n');

    for week in 0..GRID_CELLS / 7 {
        let rows: Vec<String> = blocks
            .iter()
            .map(|block| render_week_row(&block[week * 7..week * 7 + 7], options, today))
            .collect();
        out.push_str(&rows.join(BLOCK_GAP));
        out.push('\n');
    }
    out
}

fn relative_days_label(date: NaiveDate, today: NaiveDate) -> String {
    let days_diff = date.signed_duration_since(today).num_days();
    if days_diff == 0 {
        String::new()
    } else if days_diff > 0 {
        format!(" \x1b[32m(In {BOLD_CODE}{days_diff}{RESET_CODE}\x1b[32m days){RESET_CODE}")
    } else {
        format!(
            " \x1b[34m({BOLD_CODE}{}{RESET_CODE}\x1b[34m days ago){RESET_CODE}",
            days_diff.abs()
        )
    }
}

/// Annotations recorded on the reference month's own days, with a total.
pub fn render_annotations(window: &WindowBuffer, today: NaiveDate) -> String {
    let cells: Vec<&DayCell> = window
        .block(WindowSlot::Current)
        .iter()
        .filter(|cell| cell.belongs_to_reference_month && !cell.annotations.is_empty())
        .collect();
    if cells.is_empty() {
        return String::new();
    }

    let mut out = format!("\n{BOLD_CODE}Annotations:{RESET_CODE}\n{}\n", "-".repeat(80));
    for cell in cells {
        for annotation in &cell.annotations {
            out.push_str(&format!(
                "{} - {} {}{}\n",
                annotation.date.format("%a, %d %b %Y"),
                annotation.kind,
                annotation.amount,
                relative_days_label(annotation.date, today)
            ));
        }
    }
    out.push_str(&format!("{BOLD_CODE}Total:{RESET_CODE} {}\n", window.annotation_total()));
    out
}

/// Surface that prints every published window to stdout.
pub struct TerminalSurface {
    options: RenderOptions,
    today: NaiveDate,
    offset: f64,
}

impl TerminalSurface {
    pub fn new(options: RenderOptions, today: NaiveDate) -> Self {
        TerminalSurface {
            options,
            today,
            offset: 0.0,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl RenderingSurface for TerminalSurface {
    fn apply_buffer(&mut self, buffer: Arc<WindowBuffer>) {
        println!();
        print!("{}", render_window(&buffer, &self.options, self.today));
        print!("{}", render_annotations(&buffer, self.today));
    }

    fn jump_to(&mut self, offset: f64) {
        info!(from = self.offset, to = offset, "surface recentred");
        self.offset = offset;
    }
}
