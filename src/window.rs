//! Three-month window buffers.
//!
//! A [`WindowBuffer`] is the previous, current and next month grids laid end
//! to end. Buffers are built whole and never mutated afterwards; a shift
//! produces a new buffer.

use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::annotation::{Annotation, AnnotationGateway};
use crate::calendar::{self, DayCell, GRID_CELLS, WeekStart};
use crate::error::{AnnotationError, CalendarError};

/// Cells in a full window buffer.
pub const WINDOW_CELLS: usize = 3 * GRID_CELLS;

/// One of the three month blocks in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSlot {
    Previous,
    Current,
    Next,
}

impl WindowSlot {
    fn index(self) -> usize {
        match self {
            WindowSlot::Previous => 0,
            WindowSlot::Current => 1,
            WindowSlot::Next => 2,
        }
    }
}

/// 126 contiguous-per-block day cells centred on a reference month.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    reference: NaiveDate,
    cells: Vec<DayCell>,
}

impl WindowBuffer {
    pub fn reference_date(&self) -> NaiveDate {
        self.reference
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `index`, as a virtualized renderer would request it.
    pub fn get(&self, index: usize) -> Option<&DayCell> {
        self.cells.get(index)
    }

    /// The 42-cell grid for `slot`.
    pub fn block(&self, slot: WindowSlot) -> &[DayCell] {
        let start = slot.index() * GRID_CELLS;
        &self.cells[start..start + GRID_CELLS]
    }

    /// Sum of annotation amounts over the reference month's own days.
    pub fn annotation_total(&self) -> i64 {
        self.block(WindowSlot::Current)
            .iter()
            .filter(|cell| cell.belongs_to_reference_month)
            .flat_map(|cell| cell.annotations.iter())
            .map(|a| a.amount)
            .sum()
    }
}

/// Builds the unannotated window around `reference`.
///
/// # Errors
///
/// Fails if the adjacent months are not representable or any grid comes
/// back incomplete.
pub fn build_window(
    reference: NaiveDate,
    week_start: WeekStart,
) -> Result<WindowBuffer, CalendarError> {
    let previous = calendar::previous_month(reference)?;
    let next = calendar::next_month(reference)?;

    let mut cells = Vec::with_capacity(WINDOW_CELLS);
    for month in [previous, reference, next] {
        cells.extend(calendar::generate_month_grid(month, week_start));
    }

    if cells.len() != WINDOW_CELLS {
        return Err(CalendarError::IncompleteWindow {
            reference,
            cells: cells.len(),
        });
    }

    debug!(%reference, "window built");
    Ok(WindowBuffer { reference, cells })
}

/// Fetches annotations for one date, degrading failures and timeouts to
/// an empty list.
async fn lookup<G: AnnotationGateway>(
    gateway: &G,
    date: NaiveDate,
    limit: Duration,
) -> Vec<Annotation> {
    let outcome = match tokio::time::timeout(limit, gateway.fetch(date)).await {
        Ok(result) => result,
        Err(_) => Err(AnnotationError::TimedOut { date }),
    };
    outcome.unwrap_or_else(|e| {
        warn!(%date, "annotation lookup degraded to empty: {e}");
        Vec::new()
    })
}

/// Builds the window around `reference` and annotates every cell.
///
/// One lookup is issued per cell, keyed by that cell's own date, and all
/// of them run concurrently. The buffer is returned once every lookup has
/// completed, failed, or exceeded `lookup_timeout`.
pub async fn build_annotated_window<G: AnnotationGateway>(
    reference: NaiveDate,
    week_start: WeekStart,
    gateway: &G,
    lookup_timeout: Duration,
) -> Result<WindowBuffer, CalendarError> {
    let mut window = build_window(reference, week_start)?;

    let lookups = window
        .cells
        .iter()
        .map(|cell| lookup(gateway, cell.date, lookup_timeout));
    let results = join_all(lookups).await;

    for (cell, annotations) in window.cells.iter_mut().zip(results) {
        cell.annotations = annotations;
    }
    Ok(window)
}
