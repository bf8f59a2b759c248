//! The ~1 ms tick ISR (SPEC_FULL.md §4.B, §4.G, §5) and the handful of
//! fields it shares with the foreground loop.
//!
//! Timer0 runs in CTC mode, prescale/64, `OCR0A = 249` — 16 MHz / 64 / 250
//! = 1 kHz, matching "a second periodic timer raising a ~1 ms tick
//! interrupt" (§1). Timer1 stays dedicated to the PWM waveform (§6).
//!
//! Everything the ISR touches lives behind one of the two statics below,
//! each wrapped the way the teacher wraps an RTIC `#[shared]` resource —
//! except RTIC doesn't target AVR, so this crate uses the ecosystem's
//! standard substitute instead: `avr_device::interrupt::Mutex` plus
//! `avr_device::interrupt::free` scoped critical sections (§5 "scoped
//! interrupt-mask acquire/release"), the same primitive
//! `favilo-turret-avr-rust`'s `Servo` driver uses for its own
//! ISR/foreground-shared channel table.

use core::cell::{Cell, RefCell};

use arduino_hal::pac::TC0;
use avr_device::interrupt::Mutex;
use servo_core::mode::State;
use servo_core::slew::SlewEngine;
use servo_core::timebase::Timebase;
use servo_hal::PwmOutput;

use crate::pwm::ServoPwm;

/// Foreground→ISR setpoint (§3 "desired_duty... foreground-written,
/// ISR-read") plus the two other fields the ISR needs to run the slew
/// engine without touching `servo_core::mode::Machine` itself.
#[derive(Clone, Copy)]
pub struct SlewSetpoint {
    pub desired_duty: u16,
    pub speed: u16,
    pub state: State,
}

/// Single-word (well, single-`Cell`) handoff — kept separate from
/// [`TickState`] below so a foreground write never has to cross a
/// critical section with the ISR's own `RefCell` borrow (§5 "Shrink these
/// regions to a single assignment").
pub static SETPOINT: Mutex<Cell<SlewSetpoint>> = Mutex::new(Cell::new(SlewSetpoint {
    desired_duty: 1500,
    speed: 4,
    state: State::Reboot,
}));

struct TickState {
    timebase: Timebase,
    slew: SlewEngine,
    pwm: ServoPwm,
    sample_flag: bool,
}

static TICK: Mutex<RefCell<Option<TickState>>> = Mutex::new(RefCell::new(None));

/// Moves the already-booted slew engine and PWM driver into ISR ownership.
/// Call once from `main`, before unmasking interrupts.
pub fn install(tc0: &TC0, timebase: Timebase, slew: SlewEngine, pwm: ServoPwm) {
    // TCCR0A: WGM01 = 1 (CTC, TOP = OCR0A).
    tc0.tccr0a.write(|w| unsafe { w.bits(0b0000_0010) });
    // TCCR0B: CS02:0 = 011 (prescale/64).
    tc0.tccr0b.write(|w| unsafe { w.bits(0b0000_0011) });
    tc0.ocr0a.write(|w| unsafe { w.bits(249) });
    // TIMSK0: OCIE0A = 1.
    tc0.timsk0.write(|w| unsafe { w.bits(0b0000_0010) });

    avr_device::interrupt::free(|cs| {
        *TICK.borrow(cs).borrow_mut() = Some(TickState {
            timebase,
            slew,
            pwm,
            sample_flag: false,
        });
    });
}

/// Masked read of the free-running millisecond counter (§4.B "Foreground
/// reads of `MS_TIMER` must be performed inside `irq_mask()`").
pub fn now() -> u32 {
    avr_device::interrupt::free(|cs| {
        TICK.borrow(cs)
            .borrow()
            .as_ref()
            .map(|t| t.timebase.now())
            .unwrap_or(0)
    })
}

/// Clears and returns the sample flag the ISR raised, if any (§4.C "When
/// the foreground observes `sample_flag`, it clears the flag").
pub fn take_sample_flag() -> bool {
    avr_device::interrupt::free(|cs| {
        let mut tick = TICK.borrow(cs).borrow_mut();
        if let Some(state) = tick.as_mut() {
            core::mem::take(&mut state.sample_flag)
        } else {
            false
        }
    })
}

/// Foreground's only outbound write: the new setpoint the next tick's
/// slew step should converge toward (§5 "`desired_duty` writes from
/// foreground are observed by the next-tick slew iteration").
pub fn publish_setpoint(setpoint: SlewSetpoint) {
    avr_device::interrupt::free(|cs| SETPOINT.borrow(cs).set(setpoint));
}

pub fn current_duty() -> u16 {
    avr_device::interrupt::free(|cs| {
        TICK.borrow(cs)
            .borrow()
            .as_ref()
            .map(|t| t.slew.current_duty())
            .unwrap_or(0)
    })
}

#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    // Interrupts are already globally masked for the duration of an ISR
    // on AVR, so this just mints the critical-section token `Mutex`
    // requires — it does not itself disable anything (§5 "non-preemptible
    // by foreground... preempting foreground at any instruction boundary").
    avr_device::interrupt::free(|cs| {
        let mut tick = TICK.borrow(cs).borrow_mut();
        let Some(state) = tick.as_mut() else {
            return;
        };

        // §4.B: tick count, then sample flag, then slew step — in that
        // exact order, once per tick.
        let sample_due = state.timebase.tick();
        if sample_due {
            state.sample_flag = true;
        }

        let setpoint = SETPOINT.borrow(cs).get();
        state
            .slew
            .step(setpoint.desired_duty, setpoint.speed, setpoint.state, &mut state.pwm);
    });
}
