//! Enter/exit-DEMO gesture (§4.E): CENTER→DOWN × `DEMO_CNT_REQ` within
//! `DEMO_TIMEOUT`. The same edge drives both directions — whether a fire
//! means "enter DEMO" or "exit DEMO" depends on which mode state owns the
//! recognizer instance (§4.F).

use crate::input::{Event, SwitchPos};
use crate::variant::{DEMO_CNT_REQ, DEMO_TIMEOUT};

use super::edge_count::EdgeCountGesture;

pub struct DemoGesture {
    inner: EdgeCountGesture<SwitchPos>,
}

impl DemoGesture {
    pub fn new() -> Self {
        Self {
            inner: EdgeCountGesture::new(
                (SwitchPos::Center, SwitchPos::Down),
                DEMO_CNT_REQ,
                DEMO_TIMEOUT,
            ),
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

impl Default for DemoGesture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_fifth_center_to_down_edge_within_timeout() {
        let mut g = DemoGesture::new();
        let edge = |ts| Event {
            old: SwitchPos::Center,
            new: SwitchPos::Down,
            timestamp: ts,
            pending: true,
        };
        for ts in [100, 1100, 2100, 3100] {
            assert!(!g.on_switch_event(&edge(ts), true));
        }
        assert!(g.on_switch_event(&edge(4100), true));
    }
}
