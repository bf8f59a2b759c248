#![cfg_attr(not(feature = "std"), no_std)]

//! Logic for the tCover AutoMotion servo controller: filtered input
//! sampling, gesture recognition, the mode state machine, and the PWM
//! slew engine. Everything here is hardware-agnostic — it runs against
//! real AVR peripherals (`firmware`) or against `servo_hal::mock` in
//! tests, and never touches a register directly.
//!
//! The ISR-resident half ([`timebase::Timebase`], [`slew::SlewEngine`])
//! and the foreground half ([`input::Sampler`], [`mode::Machine`]) are
//! kept as separate types rather than one combined struct, because on
//! real hardware they run at different priority levels behind a critical
//! section (SPEC_FULL.md §5) — only `firmware` is in a position to own
//! that boundary. [`Controller`] below is a convenience that combines
//! them for host-side tests, where there is no real concurrency to keep
//! apart.

pub mod calibration;
pub mod gesture;
pub mod input;
pub mod mode;
pub mod slew;
pub mod timebase;
pub mod variant;

// Exactly one of variant-v1 / variant-v2 / variant-v3 must be enabled
// (SPEC_FULL.md §9 "Variant selection... is a compile-time feature"); two
// enabled at once would make `variant::current()` silently return whichever
// `cfg` arm the compiler happens to evaluate last.
#[cfg(not(any(feature = "variant-v1", feature = "variant-v2", feature = "variant-v3")))]
compile_error!("exactly one of variant-v1, variant-v2, variant-v3 must be enabled");

#[cfg(all(feature = "variant-v1", feature = "variant-v2"))]
compile_error!("variant-v1 and variant-v2 are mutually exclusive");

#[cfg(all(feature = "variant-v1", feature = "variant-v3"))]
compile_error!("variant-v1 and variant-v3 are mutually exclusive");

#[cfg(all(feature = "variant-v2", feature = "variant-v3"))]
compile_error!("variant-v2 and variant-v3 are mutually exclusive");

#[cfg(feature = "variant-v3")]
use servo_hal::AdcChannel;
use servo_hal::{DefaultsSource, DigitalInput, EepromStorage, PwmOutput, Watchdog};

pub use calibration::CalibrationRecord;
pub use input::{
    decode_key_analog, decode_key_digital, decode_norm_rev, decode_switch, Event, Inputs, KeyPos,
    NormRev, Sampler, SwitchPos,
};
pub use mode::{Machine, State};
pub use slew::SlewEngine;
pub use timebase::Timebase;

/// Raw per-sample readings a caller hands to [`Controller::sample_and_step`],
/// already decoded from ADC counts / pin levels into the input sampler's
/// vocabulary (§4.C decode functions).
#[derive(Debug, Clone, Copy)]
pub struct RawSample {
    pub switch: SwitchPos,
    pub key: KeyPos,
    pub norm_rev: NormRev,
}

/// Combines the timebase, sampler, mode machine, and slew engine into one
/// owner, for hosts (tests, and any single-threaded deployment without a
/// true ISR) where foreground and "interrupt" work can share one mutable
/// borrow. `firmware` does not use this type — it drives [`Timebase`] and
/// [`SlewEngine`] from its tick ISR and [`Sampler`]/[`Machine`] from its
/// main loop, each behind its own `avr_device::interrupt::Mutex`.
pub struct Controller {
    timebase: Timebase,
    sampler: Sampler,
    machine: Machine,
    slew: SlewEngine,
}

impl Controller {
    /// Runs the REBOOT sequence (§4.F) and seeds the sampler with the
    /// current raw inputs, per "seed the event detector with a synthetic
    /// 'no-change' event carrying the current inputs and a timestamp".
    pub fn boot(
        eeprom: &mut impl EepromStorage,
        initial: RawSample,
        watchdog: &mut impl Watchdog,
    ) -> Self {
        let now = 0;
        let machine = Machine::boot(eeprom, now);
        watchdog.enable(variant::WDT_PERIOD_MS);
        let sampler = Sampler::new(
            Inputs {
                switch: initial.switch,
                key: initial.key,
                norm_rev: initial.norm_rev,
            },
            now,
        );
        let slew = SlewEngine::new(machine.desired_duty());
        Self {
            timebase: Timebase::new(),
            sampler,
            machine,
            slew,
        }
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    pub fn calibration(&self) -> CalibrationRecord {
        self.machine.calibration()
    }

    pub fn current_duty(&self) -> u16 {
        self.slew.current_duty()
    }

    /// The ISR-resident half of one tick (§4.B, §4.G): advances the
    /// timebase and always runs the slew engine, regardless of whether
    /// this tick also happens to be a sample tick. Returns whether the
    /// foreground should call [`Self::sample_and_step`].
    pub fn tick(&mut self, pwm: &mut impl PwmOutput) -> bool {
        let sample_due = self.timebase.tick();
        self.slew.step(
            self.machine.desired_duty(),
            self.machine.calibration().speed,
            self.machine.state(),
            pwm,
        );
        sample_due
    }

    /// The foreground half: reads one set of raw inputs, feeds them
    /// through the sampler, advances the mode machine, and (V3 only)
    /// recomputes the continuously-read calibration. Call only when
    /// [`Self::tick`] last returned `true` (§4.C "When the foreground
    /// observes `sample_flag`...").
    pub fn sample_and_step(
        &mut self,
        raw: RawSample,
        reset_pin: &impl DigitalInput,
        eeprom: &mut impl EepromStorage,
        defaults: &impl DefaultsSource,
        #[cfg(feature = "variant-v3")] adc: &mut impl AdcChannel,
        watchdog: &mut impl Watchdog,
    ) {
        let now = self.timebase.now();
        self.sampler.sample(raw.switch, raw.key, raw.norm_rev, now);

        #[cfg(feature = "variant-v3")]
        self.machine.recompute_continuous(adc);

        let switch_event = self.sampler.take_switch_event();
        let key_event = self.sampler.take_key_event();
        self.machine.step(
            self.sampler.inputs(),
            switch_event,
            key_event,
            reset_pin.is_asserted(),
            now,
            eeprom,
            defaults,
        );
        watchdog.kick();
    }
}
