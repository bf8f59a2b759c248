//! Enter-PROGRAM gesture, V2 only (§4.E): while the switch stays DOWN,
//! count Key OFF→ON→OFF cycles via a strict two-state alternation tracker.
//! Fires at `PROG_CYCLES` complete cycles, with the elapsed time since the
//! first rising edge inside `(PROG_CYCLE_LO_LIM, PROG_CYCLE_HI_LIM)`.

use crate::input::{Event, KeyPos};
use crate::timebase::elapsed_since;
use crate::variant::{PROG_CYCLES, PROG_CYCLE_HI_LIM, PROG_CYCLE_LO_LIM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the next OFF→ON (rising) edge.
    PosEdge,
    /// Waiting for the matching ON→OFF (falling) edge.
    NegEdge,
}

pub struct ProgramGesture {
    phase: Phase,
    cycles: u8,
    first_rise: u32,
}

impl ProgramGesture {
    pub fn new() -> Self {
        Self {
            phase: Phase::PosEdge,
            cycles: 0,
            first_rise: 0,
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::PosEdge;
        self.cycles = 0;
    }

    /// Must be called every sample period with the current filtered
    /// switch position: "a switch-away-from-DOWN resets the count"
    /// (§4.E).
    pub fn on_switch_sample(&mut self, switch_is_down: bool) {
        if !switch_is_down {
            self.reset();
        }
    }

    /// Feeds one key transition event while the switch is DOWN. Returns
    /// `true` the tick the gesture fires.
    pub fn on_key_event(&mut self, event: &Event<KeyPos>, switch_is_down: bool) -> bool {
        if !switch_is_down {
            self.reset();
            return false;
        }

        match (self.phase, event.old, event.new) {
            (Phase::PosEdge, KeyPos::Off, KeyPos::On) => {
                if self.cycles == 0 {
                    self.first_rise = event.timestamp;
                }
                self.phase = Phase::NegEdge;
                false
            }
            (Phase::NegEdge, KeyPos::On, KeyPos::Off) => {
                self.cycles += 1;
                self.phase = Phase::PosEdge;
                if self.cycles >= PROG_CYCLES {
                    let elapsed = elapsed_since(event.timestamp, self.first_rise);
                    let fired = elapsed > PROG_CYCLE_LO_LIM && elapsed < PROG_CYCLE_HI_LIM;
                    self.reset();
                    fired
                } else {
                    false
                }
            }
            _ => {
                // Alternation broken (e.g. a missed edge from upstream
                // filtering): restart the count from scratch.
                self.reset();
                false
            }
        }
    }
}

impl Default for ProgramGesture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rise(ts: u32) -> Event<KeyPos> {
        Event {
            old: KeyPos::Off,
            new: KeyPos::On,
            timestamp: ts,
            pending: true,
        }
    }

    fn fall(ts: u32) -> Event<KeyPos> {
        Event {
            old: KeyPos::On,
            new: KeyPos::Off,
            timestamp: ts,
            pending: true,
        }
    }

    #[test]
    fn fires_after_four_cycles_within_window() {
        let mut g = ProgramGesture::new();
        assert!(!g.on_key_event(&rise(0), true));
        assert!(!g.on_key_event(&fall(500), true));
        assert!(!g.on_key_event(&rise(1000), true));
        assert!(!g.on_key_event(&fall(1500), true));
        assert!(!g.on_key_event(&rise(2000), true));
        assert!(!g.on_key_event(&fall(2500), true));
        assert!(!g.on_key_event(&rise(3500), true));
        // Fourth falling edge completes the fourth cycle at t=4000,
        // 4000ms after the first rise at t=0: inside (3000, 8000).
        assert!(g.on_key_event(&fall(4000), true));
    }

    #[test]
    fn too_fast_does_not_fire() {
        let mut g = ProgramGesture::new();
        assert!(!g.on_key_event(&rise(0), true));
        assert!(!g.on_key_event(&fall(200), true));
        assert!(!g.on_key_event(&rise(400), true));
        assert!(!g.on_key_event(&fall(600), true));
        assert!(!g.on_key_event(&rise(800), true));
        assert!(!g.on_key_event(&fall(1000), true));
        assert!(!g.on_key_event(&rise(1200), true));
        // Completes in 1400ms, well under the 3000ms floor.
        assert!(!g.on_key_event(&fall(1400), true));
    }

    #[test]
    fn switch_leaving_down_resets_the_count() {
        let mut g = ProgramGesture::new();
        assert!(!g.on_key_event(&rise(0), true));
        assert!(!g.on_key_event(&fall(500), true));
        g.on_switch_sample(false);
        assert!(!g.on_key_event(&rise(1000), true));
        assert!(!g.on_key_event(&fall(1500), true));
        assert!(!g.on_key_event(&rise(2000), true));
        assert!(!g.on_key_event(&fall(2500), true));
        assert!(!g.on_key_event(&rise(3500), true));
        // Only 4 cycles since the reset, not counting the pre-reset one;
        // with the reset this is cycle 4 of a fresh window starting at
        // t=1000, firing at 1000ms later... too fast to fire.
        assert!(!g.on_key_event(&fall(4000), true));
    }
}
