//! Input event record (§3 "Input event record", §4.D).

/// `{old, new, timestamp, pending}` for one input source. Exactly one
/// pending slot is kept per source — a second edge before the foreground
/// consumes the first overwrites it, per §4.D ("A missed event is a bug:
/// exactly one `pending` slot per source is kept").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<T> {
    pub old: T,
    pub new: T,
    pub timestamp: u32,
    pub pending: bool,
}

impl<T: Copy> Event<T> {
    pub fn synthetic(value: T, timestamp: u32) -> Self {
        Self {
            old: value,
            new: value,
            timestamp,
            pending: true,
        }
    }

    /// Marks this event as consumed by the foreground (§4.D).
    pub fn acknowledge(&mut self) {
        self.pending = false;
    }

    /// Returns `Some(self)` once, the first time this is called while
    /// `pending`, then clears `pending`. Lets callers write
    /// `if let Some(ev) = event.take() { ... }` instead of manually
    /// checking then acknowledging.
    pub fn take(&mut self) -> Option<Event<T>> {
        if self.pending {
            let ev = *self;
            self.pending = false;
            Some(ev)
        } else {
            None
        }
    }
}
