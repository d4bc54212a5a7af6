use std::time::{Duration, Instant};

/// Pointer-move processing interval used by the amplitude panel.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Holds back a stream of values so at most one is delivered per interval.
///
/// The first offer arms the timer; later offers before it fires only replace
/// the pending value, so the delivery carries the newest one. Time is passed
/// in by the caller.
#[derive(Debug)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    due: Instant,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn offer(&mut self, value: T, now: Instant) {
        match self.pending.as_mut() {
            Some(p) => p.value = value,
            None => {
                self.pending = Some(Pending {
                    value,
                    due: now + self.interval,
                })
            }
        }
    }

    /// Take the pending value if its timer has fired by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.due <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// When the pending value becomes deliverable.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
