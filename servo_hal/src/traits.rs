//! Capability-object traits injected into `servo_core`'s state machine.
//!
//! Mirrors the teacher's `TimPWM` / `Spi<SPI1>` split: a small owned driver
//! per peripheral, constructed once against real registers in `firmware`,
//! or swapped for a `mock` implementation in tests.

use crate::channel::Channel;

/// The single 50 Hz servo PWM channel.
///
/// `set_duty` never blocks and never fails: the duty register is a single
/// hardware write. Disabling tri-states the drive pin (hum suppression);
/// enabling re-asserts it as an output. No default duty is implied by
/// `enable()` — callers must `set_duty` before or after as appropriate.
pub trait PwmOutput {
    /// Duty in timer ticks (1 µs resolution, see SPEC_FULL.md §6).
    fn set_duty(&mut self, ticks: u16);
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;

    /// True once the timer's free-running counter is in the low phase of
    /// the current PWM cycle (count <= compare register), i.e. safe to
    /// change the compare register without glitching the current pulse.
    fn in_low_phase(&self) -> bool;
}

/// Blocking 10-bit ADC sampler, addressed by logical channel.
pub trait AdcChannel {
    /// Blocks for one conversion; returns a right-justified 10-bit result.
    fn sample(&mut self, channel: Channel) -> u16;
}

/// Digital pin input used for the NORM/REV sense line and the external
/// reset request line (§6).
pub trait DigitalInput {
    /// True when the pin reads asserted (NORM for the sense pin, requested
    /// for the reset pin — callers interpret polarity).
    fn is_asserted(&self) -> bool;
}

/// Persistent calibration storage (§6 "Persisted state"). Blocking;
/// never invoked from interrupt context (§4.A, §5).
pub trait EepromStorage {
    fn read_block(&mut self, offset: u16, dst: &mut [u8]);
    fn write_block(&mut self, offset: u16, src: &[u8]);
    fn read_byte(&mut self, offset: u16) -> u8;
    fn write_byte(&mut self, offset: u16, value: u8);
}

/// The immutable factory-defaults copy embedded in program memory (§3).
pub trait DefaultsSource {
    fn read_block(&self, dst: &mut [u8]);
}

/// Hardware watchdog (§4.A, §5). `kick` must be called at least once per
/// `period_ms` from the foreground loop or the controller resets.
pub trait Watchdog {
    fn enable(&mut self, period_ms: u16);
    fn kick(&mut self);
}
