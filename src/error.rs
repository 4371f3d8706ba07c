//! Error types for the scrollcal crate.

use chrono::NaiveDate;

/// Failure to resolve a calendar computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// Adding or subtracting months left the representable date range.
    #[error("cannot shift {date} by {months} month(s): out of calendar range")]
    MonthOutOfRange {
        /// The date that was being shifted.
        date: NaiveDate,
        /// Signed number of months requested.
        months: i32,
    },

    /// One of the three month grids could not be fully generated.
    #[error("window around {reference} is incomplete: {cells} of 126 cells")]
    IncompleteWindow {
        /// Reference date the window was built around.
        reference: NaiveDate,
        /// Number of cells that could be generated.
        cells: usize,
    },
}

/// Failure reading or writing annotations through a gateway.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    /// The backing store could not answer a lookup.
    #[error("annotation lookup for {date} failed: {reason}")]
    Lookup { date: NaiveDate, reason: String },

    /// A lookup did not complete in time.
    #[error("annotation lookup for {date} timed out")]
    TimedOut { date: NaiveDate },

    /// The record was rejected before being written.
    #[error("invalid annotation record: {reason}")]
    InvalidRecord { reason: String },

    /// A store line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Invalid paging configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("page width must be positive, got {0}")]
    PageWidth(f64),

    #[error("tolerance {tolerance} must lie in [0, {limit})")]
    Tolerance { tolerance: f64, limit: f64 },

    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),
}

/// Errors surfaced by the paging controller.
#[derive(Debug, thiserror::Error)]
pub enum PagingError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The rebuild task ended without reporting a buffer.
    #[error("window rebuild task ended without a result")]
    RebuildLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_out_of_range_message() {
        let err = CalendarError::MonthOutOfRange {
            date: NaiveDate::MAX,
            months: 1,
        };
        assert_eq!(
            err.to_string(),
            format!("cannot shift {} by 1 month(s): out of calendar range", NaiveDate::MAX)
        );
    }

    #[test]
    fn invalid_record_message() {
        let err = AnnotationError::InvalidRecord {
            reason: "kind is empty".into(),
        };
        assert_eq!(err.to_string(), "invalid annotation record: kind is empty");
    }

    #[test]
    fn paging_error_wraps_calendar_error() {
        let inner = CalendarError::IncompleteWindow {
            reference: NaiveDate::MIN,
            cells: 84,
        };
        let err: PagingError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<CalendarError>();
        assert_impl::<AnnotationError>();
        assert_impl::<ConfigError>();
        assert_impl::<PagingError>();
    }
}
