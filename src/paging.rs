//! Scroll-driven month paging.
//!
//! The surface lays the window out as three pages: previous at offset 0,
//! the reference month at one page width, next at two page widths. When a
//! settled scroll sample reaches either edge page, the reference month moves
//! one step in that direction, a new window is built around it, and the
//! surface is told to jump back to the centre page without animation.
//!
//! [`ScrollPager`] is the synchronous state machine. [`PagingController`]
//! drives it from a stream of [`ScrollEvent`]s on a tokio runtime.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace, warn};

use crate::annotation::{AnnotationGateway, MemoryGateway};
use crate::calendar;
use crate::config::PagingConfig;
use crate::debounce::Debouncer;
use crate::error::{CalendarError, ConfigError, PagingError};
use crate::window::{self, WindowBuffer};

type RebuildSender = mpsc::Sender<Result<WindowBuffer, CalendarError>>;

/// Consumer of window buffers, typically a virtualized grid view.
pub trait RenderingSurface {
    /// Replaces everything the surface shows with `buffer`.
    fn apply_buffer(&mut self, buffer: Arc<WindowBuffer>);

    /// Moves the scroll position to `offset` without animation.
    fn jump_to(&mut self, offset: f64);
}

/// Input emitted by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollEvent {
    /// A scroll position sample in logical units.
    Offset(f64),
    /// Scrolling decelerated to rest.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Backward,
    Forward,
}

/// A reference-month change that has started but not yet been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub direction: ShiftDirection,
    pub target: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingState {
    Idle,
    Shifting(Shift),
}

/// Owns the reference date and decides when it moves.
#[derive(Debug)]
pub struct ScrollPager {
    reference: NaiveDate,
    state: PagingState,
    debouncer: Debouncer<f64>,
    config: PagingConfig,
}

impl ScrollPager {
    pub fn new(reference: NaiveDate, config: PagingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(ScrollPager {
            reference,
            state: PagingState::Idle,
            debouncer: Debouncer::new(config.debounce),
            config,
        })
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference
    }

    pub fn state(&self) -> PagingState {
        self.state
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    pub fn is_shifting(&self) -> bool {
        matches!(self.state, PagingState::Shifting(_))
    }

    /// Which edge page, if any, `offset` has reached.
    pub fn classify(&self, offset: f64) -> Option<ShiftDirection> {
        let tolerance = self.config.tolerance;
        if offset <= self.config.leading_boundary() + tolerance {
            Some(ShiftDirection::Backward)
        } else if offset >= self.config.trailing_boundary() - tolerance {
            Some(ShiftDirection::Forward)
        } else {
            None
        }
    }

    /// Feeds a scroll sample. Returns `false` if it was dropped because a
    /// shift is in flight or the value is not finite.
    pub fn observe(&mut self, offset: f64, now: Instant) -> bool {
        if let PagingState::Shifting(shift) = self.state {
            trace!(offset, target = %shift.target, "sample dropped while shifting");
            return false;
        }
        if !offset.is_finite() {
            trace!(offset, "non-finite sample dropped");
            return false;
        }
        self.debouncer.push(offset, now);
        true
    }

    /// Treats the pending sample as settled.
    pub fn settle(&mut self, now: Instant) {
        self.debouncer.expire(now);
    }

    /// When the pending sample is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Acts on the pending sample once it is due. Returns the shift it
    /// started, if the sample sat on a boundary.
    pub fn poll(&mut self, now: Instant) -> Result<Option<Shift>, CalendarError> {
        let Some(offset) = self.debouncer.poll(now) else {
            return Ok(None);
        };
        match self.classify(offset) {
            Some(direction) => self.begin_shift(direction),
            None => Ok(None),
        }
    }

    /// Starts a shift unless one is already in flight.
    ///
    /// # Errors
    ///
    /// The adjacent month is outside the calendar range. The pager stays
    /// idle on the current reference date.
    pub fn begin_shift(
        &mut self,
        direction: ShiftDirection,
    ) -> Result<Option<Shift>, CalendarError> {
        if self.is_shifting() {
            return Ok(None);
        }
        let target = match direction {
            ShiftDirection::Forward => calendar::next_month(self.reference)?,
            ShiftDirection::Backward => calendar::previous_month(self.reference)?,
        };
        self.debouncer.clear();
        let shift = Shift { direction, target };
        self.state = PagingState::Shifting(shift);
        debug!(from = %self.reference, to = %target, ?direction, "shift started");
        Ok(Some(shift))
    }

    /// Commits the in-flight shift if `buffer` was built for it.
    pub fn complete(&mut self, buffer: &WindowBuffer) -> bool {
        match self.state {
            PagingState::Shifting(shift) if shift.target == buffer.reference_date() => {
                self.reference = shift.target;
                self.state = PagingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Abandons the in-flight shift, keeping the current reference date.
    pub fn abort(&mut self) {
        self.state = PagingState::Idle;
    }
}

/// Drives a [`ScrollPager`], rebuilds windows and publishes them.
///
/// Every published buffer goes to the surface and to [`subscribe`]rs.
///
/// [`subscribe`]: PagingController::subscribe
pub struct PagingController<S, G = MemoryGateway> {
    pager: ScrollPager,
    surface: S,
    gateway: Option<Arc<G>>,
    published: watch::Sender<Option<Arc<WindowBuffer>>>,
}

impl<S: RenderingSurface> PagingController<S> {
    /// Controller without annotations, centred on today.
    pub fn new(config: PagingConfig, surface: S) -> Result<Self, PagingError> {
        let today = chrono::Local::now().date_naive();
        Self::with_reference(today, config, surface)
    }

    /// Controller without annotations, centred on `reference`.
    pub fn with_reference(
        reference: NaiveDate,
        config: PagingConfig,
        surface: S,
    ) -> Result<Self, PagingError> {
        Self::build(reference, config, surface, None)
    }
}

impl<S, G> PagingController<S, G>
where
    S: RenderingSurface,
    G: AnnotationGateway + 'static,
{
    /// Controller whose windows are annotated through `gateway`.
    pub fn annotated(
        reference: NaiveDate,
        config: PagingConfig,
        surface: S,
        gateway: Arc<G>,
    ) -> Result<Self, PagingError> {
        Self::build(reference, config, surface, Some(gateway))
    }

    fn build(
        reference: NaiveDate,
        config: PagingConfig,
        surface: S,
        gateway: Option<Arc<G>>,
    ) -> Result<Self, PagingError> {
        let pager = ScrollPager::new(reference, config)?;
        let (published, _) = watch::channel(None);
        Ok(PagingController {
            pager,
            surface,
            gateway,
            published,
        })
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.pager.reference_date()
    }

    pub fn state(&self) -> PagingState {
        self.pager.state()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Receiver notified whenever the published buffer is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<WindowBuffer>>> {
        self.published.subscribe()
    }

    /// The most recently published buffer.
    pub fn current(&self) -> Option<Arc<WindowBuffer>> {
        self.published.borrow().clone()
    }

    /// Builds and publishes the window around the current reference date.
    pub async fn start(&mut self) -> Result<(), PagingError> {
        let buffer = build_for(
            self.pager.reference_date(),
            self.pager.config(),
            self.gateway.clone(),
        )
        .await?;
        self.publish(buffer);
        Ok(())
    }

    /// Shifts one month immediately, bypassing scroll detection.
    ///
    /// Returns `false` if a shift was already in flight.
    pub async fn shift(&mut self, direction: ShiftDirection) -> Result<bool, PagingError> {
        let Some(shift) = self.pager.begin_shift(direction)? else {
            return Ok(false);
        };
        let result = build_for(shift.target, self.pager.config(), self.gateway.clone()).await;
        self.finish_rebuild(result)?;
        Ok(true)
    }

    /// Processes scroll events until the sender side is dropped.
    ///
    /// Publishes the initial window first if nothing has been published
    /// yet. A rebuild still in flight when the channel closes is awaited and
    /// published; an unsettled pending sample is discarded.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ScrollEvent>,
    ) -> Result<Self, PagingError> {
        if self.current().is_none() {
            self.start().await?;
        }

        let (done_tx, mut done_rx) = mpsc::channel(1);
        loop {
            let deadline = self.pager.deadline();
            // Due samples and finished rebuilds go before new input.
            tokio::select! {
                biased;
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.poll_pager(&done_tx)?;
                }
                Some(result) = done_rx.recv() => self.finish_rebuild(result)?,
                event = events.recv() => match event {
                    Some(ScrollEvent::Offset(offset)) => {
                        self.pager.observe(offset, Instant::now());
                    }
                    Some(ScrollEvent::Settled) => {
                        self.pager.settle(Instant::now());
                        self.poll_pager(&done_tx)?;
                    }
                    None => break,
                },
            }
        }

        drop(done_tx);
        if self.pager.is_shifting() {
            let result = done_rx.recv().await.ok_or(PagingError::RebuildLost)?;
            self.finish_rebuild(result)?;
        }
        Ok(self)
    }

    /// Acts on a due sample, spawning the rebuild for any shift it starts.
    fn poll_pager(&mut self, done: &RebuildSender) -> Result<(), PagingError> {
        if let Some(shift) = self.pager.poll(Instant::now())? {
            self.spawn_rebuild(shift.target, done.clone());
        }
        Ok(())
    }

    fn spawn_rebuild(&self, target: NaiveDate, done: RebuildSender) {
        let config = self.pager.config().clone();
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            let result = build_for(target, &config, gateway).await;
            if done.send(result).await.is_err() {
                warn!(%target, "controller stopped before rebuild finished");
            }
        });
    }

    fn finish_rebuild(
        &mut self,
        result: Result<WindowBuffer, CalendarError>,
    ) -> Result<(), PagingError> {
        match result {
            Ok(buffer) => {
                if self.pager.complete(&buffer) {
                    self.publish(buffer);
                }
                Ok(())
            }
            Err(e) => {
                self.pager.abort();
                Err(e.into())
            }
        }
    }

    fn publish(&mut self, buffer: WindowBuffer) {
        let buffer = Arc::new(buffer);
        debug!(reference = %buffer.reference_date(), "window published");
        self.surface.apply_buffer(Arc::clone(&buffer));
        self.surface.jump_to(self.pager.config().center_offset());
        self.published.send_replace(Some(buffer));
    }
}

async fn build_for<G: AnnotationGateway>(
    reference: NaiveDate,
    config: &PagingConfig,
    gateway: Option<Arc<G>>,
) -> Result<WindowBuffer, CalendarError> {
    match gateway {
        Some(gateway) => {
            window::build_annotated_window(
                reference,
                config.week_start,
                gateway.as_ref(),
                config.lookup_timeout,
            )
            .await
        }
        None => window::build_window(reference, config.week_start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekStart;
    use std::time::Duration;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn pager(reference: NaiveDate) -> ScrollPager {
        ScrollPager::new(reference, PagingConfig::default()).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_shifts_once_on_last_sample() {
        let t0 = Instant::now();
        let mut pager = pager(ymd(2024, 2, 1));
        assert!(pager.observe(0.3, t0));
        assert!(pager.observe(0.9, t0 + ms(10)));
        assert!(pager.observe(2.0, t0 + ms(20)));

        assert_eq!(pager.poll(t0 + ms(40)).unwrap(), None);
        let shift = pager.poll(t0 + ms(70)).unwrap().unwrap();
        assert_eq!(shift.direction, ShiftDirection::Forward);
        assert_eq!(shift.target, ymd(2024, 3, 1));
        assert_eq!(pager.poll(t0 + ms(200)).unwrap(), None);
    }

    #[test]
    fn boundary_followed_by_interior_sample_does_not_shift() {
        let t0 = Instant::now();
        let mut pager = pager(ymd(2024, 2, 1));
        pager.observe(2.0, t0);
        pager.observe(0.9, t0 + ms(10));
        assert_eq!(pager.poll(t0 + ms(100)).unwrap(), None);
        assert_eq!(pager.state(), PagingState::Idle);
    }

    #[test]
    fn leading_boundary_shifts_backward() {
        let t0 = Instant::now();
        let mut pager = pager(ymd(2024, 1, 31));
        pager.observe(0.0, t0);
        pager.settle(t0);
        let shift = pager.poll(t0).unwrap().unwrap();
        assert_eq!(shift.direction, ShiftDirection::Backward);
        assert_eq!(shift.target, ymd(2023, 12, 31));
    }

    #[test]
    fn classify_uses_tolerance_and_overscroll() {
        let pager = pager(ymd(2024, 2, 1));
        assert_eq!(pager.classify(-0.2), Some(ShiftDirection::Backward));
        assert_eq!(pager.classify(0.005), Some(ShiftDirection::Backward));
        assert_eq!(pager.classify(0.5), None);
        assert_eq!(pager.classify(1.0), None);
        assert_eq!(pager.classify(1.995), Some(ShiftDirection::Forward));
        assert_eq!(pager.classify(2.3), Some(ShiftDirection::Forward));
    }

    #[test]
    fn samples_are_dropped_while_shifting() {
        let t0 = Instant::now();
        let mut pager = pager(ymd(2024, 2, 1));
        pager.begin_shift(ShiftDirection::Forward).unwrap();

        assert!(!pager.observe(2.0, t0));
        assert!(!pager.observe(0.0, t0));
        assert_eq!(pager.deadline(), None);
        assert_eq!(pager.begin_shift(ShiftDirection::Forward).unwrap(), None);

        let buffer = window::build_window(ymd(2024, 3, 1), WeekStart::Monday).unwrap();
        assert!(pager.complete(&buffer));
        assert_eq!(pager.reference_date(), ymd(2024, 3, 1));
        assert_eq!(pager.state(), PagingState::Idle);
    }

    #[test]
    fn stale_buffer_does_not_complete_shift() {
        let mut pager = pager(ymd(2024, 2, 1));
        pager.begin_shift(ShiftDirection::Backward).unwrap();
        let stale = window::build_window(ymd(2024, 3, 1), WeekStart::Monday).unwrap();
        assert!(!pager.complete(&stale));
        assert!(pager.is_shifting());
        pager.abort();
        assert_eq!(pager.reference_date(), ymd(2024, 2, 1));
    }

    #[test]
    fn shift_past_calendar_end_fails_and_stays_idle() {
        let mut pager = pager(NaiveDate::MAX);
        assert!(pager.begin_shift(ShiftDirection::Forward).is_err());
        assert_eq!(pager.state(), PagingState::Idle);
        assert_eq!(pager.reference_date(), NaiveDate::MAX);
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut pager = pager(ymd(2024, 2, 1));
        assert!(!pager.observe(f64::NAN, Instant::now()));
        assert_eq!(pager.deadline(), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PagingConfig {
            page_width: -1.0,
            ..PagingConfig::default()
        };
        assert!(ScrollPager::new(ymd(2024, 2, 1), config).is_err());
    }
}
