//! 3-deep majority/settling filter and ADC-count decoding (§4.C).

use crate::variant::{A2D_ACC_ON_COUNT, DOWN_MAX_COUNT, UP_MIN_COUNT};

use super::event::Event;
use super::{KeyPos, NormRev, SwitchPos};

/// Decodes a raw 10-bit switch ADC count (channel 1) into a position
/// (§4.C).
pub fn decode_switch(count: u16) -> SwitchPos {
    if count < DOWN_MAX_COUNT {
        SwitchPos::Down
    } else if count <= UP_MIN_COUNT {
        SwitchPos::Center
    } else {
        SwitchPos::Up
    }
}

/// Decodes a raw 10-bit ACC ADC count (channel 0, V1's analog-key variant)
/// into a key position (§4.C).
pub fn decode_key_analog(count: u16) -> KeyPos {
    if count >= A2D_ACC_ON_COUNT {
        KeyPos::On
    } else {
        KeyPos::Off
    }
}

/// Decodes a digital ACC pin level (V2/V3) into a key position (§4.C).
pub fn decode_key_digital(asserted: bool) -> KeyPos {
    if asserted {
        KeyPos::On
    } else {
        KeyPos::Off
    }
}

/// Decodes the NORM/REV sense pin (§6).
pub fn decode_norm_rev(asserted: bool) -> NormRev {
    if asserted {
        NormRev::Norm
    } else {
        NormRev::Rev
    }
}

/// A 3-element shift window that accepts a new filtered value only when
/// all three raw samples agree (§4.C); otherwise the previous filtered
/// value persists.
#[derive(Debug, Clone, Copy)]
struct AgreementFilter<T> {
    window: [T; 3],
    filled: u8,
    filtered: T,
}

impl<T: Copy + PartialEq> AgreementFilter<T> {
    fn new(initial: T) -> Self {
        Self {
            window: [initial; 3],
            filled: 0,
            filtered: initial,
        }
    }

    /// Pushes a new raw sample; returns `true` if the filtered value just
    /// changed.
    fn push(&mut self, sample: T) -> bool {
        self.window[0] = self.window[1];
        self.window[1] = self.window[2];
        self.window[2] = sample;
        if self.filled < 3 {
            self.filled += 1;
        }

        if self.filled == 3 && self.window[0] == self.window[1] && self.window[1] == self.window[2]
        {
            if self.filtered != sample {
                self.filtered = sample;
                return true;
            }
        }
        false
    }

    fn value(&self) -> T {
        self.filtered
    }
}

/// Snapshot of the current filtered inputs, handed to the mode machine
/// each time the foreground consumes a sample (§4.C, §4.F).
#[derive(Debug, Clone, Copy)]
pub struct Inputs {
    pub switch: SwitchPos,
    pub key: KeyPos,
    pub norm_rev: NormRev,
}

/// Owns the switch/key filters and their paired [`Event`] slots (§4.C,
/// §4.D). The direction-sense pin is read alongside but is not filtered or
/// event-tracked — it only ever gates the V1 ACC-inversion rule (§4.F).
pub struct Sampler {
    switch: AgreementFilter<SwitchPos>,
    key: AgreementFilter<KeyPos>,
    norm_rev: NormRev,
    switch_event: Event<SwitchPos>,
    key_event: Event<KeyPos>,
}

impl Sampler {
    /// Seeds the filters and emits the synthetic "no-change" event REBOOT
    /// requires (§4.F "REBOOT... seed the event detector with a synthetic
    /// 'no-change' event carrying the current inputs and a timestamp").
    pub fn new(initial: Inputs, now: u32) -> Self {
        Self {
            switch: AgreementFilter::new(initial.switch),
            key: AgreementFilter::new(initial.key),
            norm_rev: initial.norm_rev,
            switch_event: Event::synthetic(initial.switch, now),
            key_event: Event::synthetic(initial.key, now),
        }
    }

    /// Feeds one new raw sample of each source (§4.C) and, for any filtered
    /// value that changed, arms its [`Event`] slot with the old/new value
    /// and `now` as the timestamp (§4.D).
    pub fn sample(
        &mut self,
        raw_switch: SwitchPos,
        raw_key: KeyPos,
        raw_norm_rev: NormRev,
        now: u32,
    ) {
        let old_switch = self.switch.value();
        if self.switch.push(raw_switch) {
            self.switch_event = Event {
                old: old_switch,
                new: self.switch.value(),
                timestamp: now,
                pending: true,
            };
        }

        let old_key = self.key.value();
        if self.key.push(raw_key) {
            self.key_event = Event {
                old: old_key,
                new: self.key.value(),
                timestamp: now,
                pending: true,
            };
        }

        self.norm_rev = raw_norm_rev;
    }

    pub fn inputs(&self) -> Inputs {
        Inputs {
            switch: self.switch.value(),
            key: self.key.value(),
            norm_rev: self.norm_rev,
        }
    }

    /// Takes the pending switch event, if any, acknowledging it (§4.D).
    pub fn take_switch_event(&mut self) -> Option<Event<SwitchPos>> {
        self.switch_event.take()
    }

    /// Takes the pending key event, if any, acknowledging it (§4.D).
    pub fn take_key_event(&mut self) -> Option<Event<KeyPos>> {
        self.key_event.take()
    }
}
