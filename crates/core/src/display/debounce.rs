use std::time::{Duration, Instant};

/// Delay after which a burst of range-slider events settles.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(100);

/// Which event of a burst gets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The first event passes at once; the rest of the burst is dropped.
    Leading,
    /// Nothing passes until the burst has been quiet for `delay`; then the
    /// latest payload is released.
    Trailing,
}

/// Coalesces bursts of display events (zoom drags, slider moves) so the
/// session recomputes once per settled interaction.
///
/// The clock is passed in by the caller, which keeps the debouncer free of
/// timers and deterministic under test.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    edge: Edge,
    last_event: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration, edge: Edge) -> Self {
        Self {
            delay,
            edge,
            last_event: None,
            pending: None,
        }
    }

    pub fn trailing(delay: Duration) -> Self {
        Self::new(delay, Edge::Trailing)
    }

    pub fn leading(delay: Duration) -> Self {
        Self::new(delay, Edge::Leading)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Record an event at `now`. Returns the payload if it should be acted
    /// on immediately (leading edge only).
    pub fn event(&mut self, now: Instant, payload: T) -> Option<T> {
        let quiet = self
            .last_event
            .map_or(true, |last| now.saturating_duration_since(last) >= self.delay);
        self.last_event = Some(now);

        match self.edge {
            Edge::Leading => quiet.then_some(payload),
            Edge::Trailing => {
                self.pending = Some(payload);
                None
            }
        }
    }

    /// Release the pending payload once the burst has been quiet for `delay`.
    /// Always `None` on the leading edge.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now >= deadline {
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending payload becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        match (&self.pending, self.last_event) {
            (Some(_), Some(last)) => Some(last + self.delay),
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending payload.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::trailing(DEFAULT_DEBOUNCE_DELAY)
    }
}
