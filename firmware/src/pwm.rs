//! 50 Hz servo PWM channel (SPEC_FULL.md §6, §4.A `PwmOutput`).
//!
//! Timer1 runs Fast PWM, mode 14 (WGM13:0 = 1110, TOP = `ICR1`), prescaler
//! 8 — at the 16 MHz system clock that's a 2 MHz timer clock (0.5 µs per
//! tick), so `ICR1 = 39999` gives the spec's 20 ms / 50 Hz period and every
//! `servo_core` duty count (1 µs units) maps to two timer ticks on `OCR1A`.
//!
//! Disabling the channel (hum suppression, §4.G) disconnects `OC1A` from
//! the pin *and* switches the pin's data-direction bit to input, so the
//! drive line actually floats instead of being held low by the port
//! register — "no edges" per §4.A, not just "no PWM edges".

use arduino_hal::pac::{PORTB, TC1};
use servo_hal::PwmOutput;

/// 2 MHz / 50 Hz - 1 = 39999 timer ticks per PWM period (prescale/8).
const ICR1_TOP: u16 = 39_999;

/// `DDRB`/`PORTB` bit for `OC1A` (Arduino Uno D9, PB1).
const OC1A_BIT: u8 = 0b0000_0010;

pub struct ServoPwm {
    tc1: TC1,
    portb: PORTB,
}

impl ServoPwm {
    /// Programs Timer1 for Fast PWM / `ICR1`-top / non-inverting `OC1A`
    /// and leaves the channel enabled with `initial_duty` already latched
    /// (§4.G expects a PWM-enabled channel the first time the slew engine
    /// settles, not a disabled one it has to guess about).
    pub fn new(tc1: TC1, portb: PORTB, initial_duty: u16) -> Self {
        // TCCR1A: COM1A1:0 = 10 (non-inverting OC1A), WGM11:0 = 10.
        tc1.tccr1a.write(|w| unsafe { w.bits(0b1000_0010) });
        // TCCR1B: WGM13:2 = 11, CS12:0 = 010 (prescale/8).
        tc1.tccr1b.write(|w| unsafe { w.bits(0b0001_1010) });
        tc1.icr1.write(|w| unsafe { w.bits(ICR1_TOP) });
        tc1.ocr1a.write(|w| unsafe { w.bits(initial_duty * 2) });

        portb.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | OC1A_BIT) });

        Self { tc1, portb }
    }
}

impl PwmOutput for ServoPwm {
    fn set_duty(&mut self, ticks: u16) {
        self.tc1.ocr1a.write(|w| unsafe { w.bits(ticks * 2) });
    }

    fn enable(&mut self) {
        self.portb
            .ddrb
            .modify(|r, w| unsafe { w.bits(r.bits() | OC1A_BIT) });
        self.tc1
            .tccr1a
            .modify(|r, w| unsafe { w.bits(r.bits() | 0b1000_0000) });
    }

    fn disable(&mut self) {
        self.tc1
            .tccr1a
            .modify(|r, w| unsafe { w.bits(r.bits() & !0b1100_0000) });
        self.portb
            .ddrb
            .modify(|r, w| unsafe { w.bits(r.bits() & !OC1A_BIT) });
    }

    fn is_enabled(&self) -> bool {
        self.portb.ddrb.read().bits() & OC1A_BIT != 0
    }

    fn in_low_phase(&self) -> bool {
        self.tc1.tcnt1.read().bits() <= self.tc1.ocr1a.read().bits()
    }
}
