//! # scrollcal
//!
//! Month-window calculator and paging protocol for an endlessly scrolling
//! calendar.
//!
//! A reference date is expanded into a [`WindowBuffer`]: the previous,
//! current and next months as three fixed 6x7 grids (126 cells). A
//! [`PagingController`] watches scroll offsets from a [`RenderingSurface`],
//! moves the reference month when the user reaches either edge page, and
//! publishes a freshly built window while the surface jumps back to the
//! centre page.
//!
//! ## Quick start
//!
//! ```ignore
//! use scrollcal::{build_window, WeekStart, WindowSlot};
//! use chrono::NaiveDate;
//!
//! let reference = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//! let window = build_window(reference, WeekStart::Monday)?;
//! assert_eq!(window.len(), 126);
//! let february = window.block(WindowSlot::Current);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `calendar` | Month metadata, 42-cell grids, month arithmetic |
//! | `window` | Three-month buffers, annotated fan-out |
//! | `annotation` | Annotation records and the gateway trait |
//! | `store` | Plain-text file gateway |
//! | `debounce` | Trailing-edge sample debouncer |
//! | `paging` | Scroll paging state machine and controller |
//! | `config` | Paging configuration |
//! | `error` | Error types |

mod annotation;
mod calendar;
mod config;
mod debounce;
mod error;
mod paging;
mod store;
mod window;

pub use annotation::{Annotation, AnnotationGateway, MemoryGateway};
pub use calendar::{
    DayCell, GRID_CELLS, MonthMetadata, WeekStart, days_in_month, generate_month_grid,
    month_metadata, month_name, next_month, previous_month,
};
pub use config::PagingConfig;
pub use debounce::Debouncer;
pub use error::{AnnotationError, CalendarError, ConfigError, PagingError};
pub use paging::{
    PagingController, PagingState, RenderingSurface, ScrollEvent, ScrollPager, Shift,
    ShiftDirection,
};
pub use store::FileGateway;
pub use window::{WINDOW_CELLS, WindowBuffer, WindowSlot, build_annotated_window, build_window};
