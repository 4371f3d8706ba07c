//! Trailing-edge debouncing of sampled values.

use std::time::Duration;

use tokio::time::Instant;

/// Keeps the most recent sample and releases it once `quiet` has passed
/// without a newer one.
///
/// The caller supplies the clock, so the same type serves both a timer
/// driven loop and deterministic tests.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            pending: None,
        }
    }

    /// Records `value`, replacing any pending sample and restarting the
    /// quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// When the pending sample becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Makes the pending sample due at `now`.
    pub fn expire(&mut self, now: Instant) {
        if let Some((_, due)) = self.pending.as_mut() {
            *due = now;
        }
    }

    /// Takes the pending sample if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if *due <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(50);

    #[test]
    fn releases_only_the_last_sample_of_a_burst() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push(0.3, start);
        debouncer.push(0.9, start + Duration::from_millis(10));
        debouncer.push(2.0, start + Duration::from_millis(20));

        assert_eq!(debouncer.poll(start + Duration::from_millis(60)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(70)), Some(2.0));
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn newer_sample_restarts_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push(1, start);
        assert_eq!(debouncer.deadline(), Some(start + QUIET));
        debouncer.push(2, start + Duration::from_millis(40));
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(90)));
    }

    #[test]
    fn expire_makes_sample_due_immediately() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("settled", start);
        debouncer.expire(start);
        assert_eq!(debouncer.poll(start), Some("settled"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn clear_drops_pending_sample() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push(1, start);
        debouncer.clear();
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(start + QUIET), None);
    }
}
