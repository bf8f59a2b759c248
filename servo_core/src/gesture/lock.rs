//! Enter/exit-LOCKED gesture (§4.E): UP→CENTER (entering NORMAL) or
//! DOWN→CENTER (exiting LOCKED) × `LOCKED_CNT_REQ` within `LOCKED_TIMEOUT`.

use crate::input::{Event, SwitchPos};
use crate::variant::{LOCKED_CNT_REQ, LOCKED_TIMEOUT};

use super::edge_count::EdgeCountGesture;

pub struct LockGesture {
    inner: EdgeCountGesture<SwitchPos>,
}

impl LockGesture {
    /// `edge` is `(SwitchPos::Up, SwitchPos::Center)` for the NORMAL→LOCKED
    /// direction, `(SwitchPos::Down, SwitchPos::Center)` for the
    /// LOCKED→NORMAL direction (§4.F).
    pub fn new(edge: (SwitchPos, SwitchPos)) -> Self {
        Self {
            inner: EdgeCountGesture::new(edge, LOCKED_CNT_REQ, LOCKED_TIMEOUT),
        }
    }

    pub fn expire(&mut self, now: u32) {
        self.inner.expire(now);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn on_switch_event(&mut self, event: &Event<SwitchPos>, key_on: bool) -> bool {
        self.inner.on_event(event, key_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_locked_fires_on_four_up_to_center_edges_within_timeout() {
        let mut g = LockGesture::new((SwitchPos::Up, SwitchPos::Center));
        let edge = |ts| Event {
            old: SwitchPos::Up,
            new: SwitchPos::Center,
            timestamp: ts,
            pending: true,
        };
        assert!(!g.on_switch_event(&edge(100), true));
        assert!(!g.on_switch_event(&edge(400), true));
        assert!(!g.on_switch_event(&edge(800), true));
        assert!(g.on_switch_event(&edge(1500), true));
    }
}
