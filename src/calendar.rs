//! Month metadata and fixed-height month grids.
//!
//! Every grid is 6 rows of 7 days. Leading cells are borrowed from the
//! previous month and trailing cells from the next one, so a 28-day
//! February occupies exactly as many cells as a 31-day month.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::annotation::Annotation;
use crate::error::CalendarError;

/// Cells in one month grid (6 weeks).
pub const GRID_CELLS: usize = 42;

/// First column of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// 1-based column of `weekday` in a week starting on `self`.
    pub fn index_of(self, weekday: Weekday) -> u32 {
        let offset = match self {
            WeekStart::Monday => weekday.num_days_from_monday(),
            WeekStart::Sunday => weekday.num_days_from_sunday(),
        };
        offset + 1
    }

    /// Weekdays in column order.
    pub fn weekdays(self) -> [Weekday; 7] {
        let first = match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        };
        let mut days = [first; 7];
        for i in 1..7 {
            days[i] = days[i - 1].succ();
        }
        days
    }
}

/// Derived facts about one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthMetadata {
    /// 28..=31, or 0 for the "do not render" sentinel.
    pub number_of_days: u32,
    pub first_day_of_month: NaiveDate,
    /// 1..=7 relative to the week start, 0 for the sentinel.
    pub first_day_weekday_index: u32,
}

impl MonthMetadata {
    fn unresolved(reference: NaiveDate) -> Self {
        MonthMetadata {
            number_of_days: 0,
            first_day_of_month: reference,
            first_day_weekday_index: 0,
        }
    }

    /// True for the sentinel returned when the month cannot be resolved.
    pub fn is_empty(&self) -> bool {
        self.number_of_days == 0
    }
}

/// One cell of a month grid.
///
/// Cells compare and hash by date only.
#[derive(Debug, Clone)]
pub struct DayCell {
    pub date: NaiveDate,
    pub belongs_to_reference_month: bool,
    pub annotations: Vec<Annotation>,
}

impl DayCell {
    pub fn new(date: NaiveDate, belongs_to_reference_month: bool) -> Self {
        DayCell {
            date,
            belongs_to_reference_month,
            annotations: Vec::new(),
        }
    }

    /// Day of month shown in the cell.
    pub fn day_number(&self) -> u32 {
        self.date.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl PartialEq for DayCell {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl Eq for DayCell {}

impl std::hash::Hash for DayCell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.date.hash(state);
    }
}

/// Number of days in `month` of `year`, `None` if the month (or the one
/// after it) is outside chrono's range.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Metadata for the month containing `reference`.
///
/// Returns the sentinel (`number_of_days == 0`) when the month cannot be
/// resolved; callers must not render it.
pub fn month_metadata(reference: NaiveDate, week_start: WeekStart) -> MonthMetadata {
    let Some(first_day_of_month) = reference.with_day(1) else {
        return MonthMetadata::unresolved(reference);
    };
    let Some(number_of_days) = days_in_month(reference.year(), reference.month()) else {
        return MonthMetadata::unresolved(reference);
    };

    MonthMetadata {
        number_of_days,
        first_day_of_month,
        first_day_weekday_index: week_start.index_of(first_day_of_month.weekday()),
    }
}

/// Generates the 42-cell grid for the month containing `reference`.
///
/// Returns an empty vector if any cell falls outside the representable
/// range; a grid is never partial.
pub fn generate_month_grid(reference: NaiveDate, week_start: WeekStart) -> Vec<DayCell> {
    let metadata = month_metadata(reference, week_start);
    if metadata.is_empty() {
        return Vec::new();
    }

    let offset = i64::from(metadata.first_day_weekday_index);
    let cells: Option<Vec<DayCell>> = (1..=GRID_CELLS as i64)
        .map(|day| {
            let belongs = day >= offset
                && day - offset < i64::from(metadata.number_of_days);
            // Negative for leading filler days before the 1st.
            let day_offset = day - offset;
            metadata
                .first_day_of_month
                .checked_add_signed(Duration::days(day_offset))
                .map(|date| DayCell::new(date, belongs))
        })
        .collect();

    cells.unwrap_or_default()
}

fn shift_months(date: NaiveDate, months: i32) -> Result<NaiveDate, CalendarError> {
    let step = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    };
    shifted.ok_or(CalendarError::MonthOutOfRange { date, months })
}

/// Same day next month, clamped to the last valid day.
pub fn next_month(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    shift_months(date, 1)
}

/// Same day last month, clamped to the last valid day.
pub fn previous_month(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    shift_months(date, -1)
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
