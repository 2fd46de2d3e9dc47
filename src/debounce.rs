use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(150);

/// Coalesces a burst of values into the last one, released after a quiet window.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record `value` at `now`, replacing anything pending and restarting the window.
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some((now, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at + self.window)
    }

    /// Take the pending value once the window has elapsed since the last trigger.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(due) if now >= due => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_coalesces_to_last() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(150));
        d.trigger(1, start);
        d.trigger(2, start + Duration::from_millis(100));
        d.trigger(3, start + Duration::from_millis(200));
        assert_eq!(d.poll(start + Duration::from_millis(300)), None);
        assert_eq!(d.poll(start + Duration::from_millis(350)), Some(3));
        assert_eq!(d.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn idle_has_no_deadline() {
        let d: Debouncer<()> = Debouncer::default();
        assert!(d.deadline().is_none());
        assert_eq!(d.window(), DEFAULT_WINDOW);
    }
}
