//! Shared machinery behind the enter/exit-LOCKED and enter/exit-DEMO
//! gestures (§4.E): count a specific `(old, new)` transition, arm a
//! wrap-safe timing window on the first occurrence, and fire once the
//! required count arrives within the window.

use crate::input::Event;
use crate::timebase::elapsed_since;

pub struct EdgeCountGesture<T> {
    edge: (T, T),
    count_req: u8,
    timeout: u32,
    count: u8,
    window_start: u32,
    armed: bool,
}

impl<T: Copy + PartialEq> EdgeCountGesture<T> {
    pub fn new(edge: (T, T), count_req: u8, timeout: u32) -> Self {
        Self {
            edge,
            count_req,
            timeout,
            count: 0,
            window_start: 0,
            armed: false,
        }
    }

    /// Must be called once per sample period (even when no matching edge
    /// arrived) so a window that elapsed without completing resets on its
    /// own, not only when the next matching edge happens to show up
    /// (§4.E "If the window elapses without completion, the counter
    /// resets").
    pub fn expire(&mut self, now: u32) {
        if self.armed && elapsed_since(now, self.window_start) > self.timeout {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.armed = false;
    }

    /// Feeds one transition event. `key_on` gates the whole recognizer
    /// (§4.E "while Key is ON..."); events while the key is off are
    /// ignored without disturbing an already-armed window, since the key
    /// can chatter independently of the switch gesture in progress.
    /// Returns `true` the tick the gesture fires.
    pub fn on_event(&mut self, event: &Event<T>, key_on: bool) -> bool {
        if !key_on || (event.old, event.new) != self.edge {
            return false;
        }

        if self.armed && elapsed_since(event.timestamp, self.window_start) <= self.timeout {
            self.count += 1;
        } else {
            self.armed = true;
            self.window_start = event.timestamp;
            self.count = 1;
        }

        if self.count >= self.count_req {
            self.reset();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(old: u8, new: u8, ts: u32) -> Event<u8> {
        Event {
            old,
            new,
            timestamp: ts,
            pending: true,
        }
    }

    #[test]
    fn fires_on_nth_edge_within_window() {
        let mut g = EdgeCountGesture::new((0u8, 1u8), 4, 3000);
        assert!(!g.on_event(&ev(0, 1, 100), true));
        assert!(!g.on_event(&ev(0, 1, 400), true));
        assert!(!g.on_event(&ev(0, 1, 800), true));
        assert!(g.on_event(&ev(0, 1, 1500), true));
    }

    #[test]
    fn resets_when_window_expires_before_nth_edge() {
        let mut g = EdgeCountGesture::new((0u8, 1u8), 4, 3000);
        assert!(!g.on_event(&ev(0, 1, 100), true));
        assert!(!g.on_event(&ev(0, 1, 400), true));
        g.expire(4000); // more than 3000 ms after window_start = 100
        assert!(!g.on_event(&ev(0, 1, 4100), true));
        assert!(!g.on_event(&ev(0, 1, 4400), true));
        assert!(!g.on_event(&ev(0, 1, 4800), true));
        assert!(g.on_event(&ev(0, 1, 5500), true));
    }

    #[test]
    fn ignores_edges_while_key_is_off() {
        let mut g = EdgeCountGesture::new((0u8, 1u8), 2, 3000);
        assert!(!g.on_event(&ev(0, 1, 100), false));
        assert!(!g.on_event(&ev(0, 1, 200), false));
        // Key still off: no progress should have been made.
        assert!(!g.on_event(&ev(0, 1, 300), true));
        assert!(g.on_event(&ev(0, 1, 400), true));
    }

    #[test]
    fn missing_the_window_by_one_ms_fails() {
        let mut g = EdgeCountGesture::new((0u8, 1u8), 2, 1000);
        assert!(!g.on_event(&ev(0, 1, 0), true));
        // exactly at the limit still counts ("<=")
        assert!(g.on_event(&ev(0, 1, 1000), true));

        let mut g2 = EdgeCountGesture::new((0u8, 1u8), 2, 1000);
        assert!(!g2.on_event(&ev(0, 1, 0), true));
        // one ms past the limit restarts the window instead of firing
        assert!(!g2.on_event(&ev(0, 1, 1001), true));
    }
}
