//! Hardware watchdog (SPEC_FULL.md §4.A, §5 "Any ISR-foreground deadlock
//! or infinite EEPROM wait will reset the controller").
//!
//! `servo_core::variant::WDT_PERIOD_MS` is always one of 250 or 500, so
//! rather than compute a prescaler from an arbitrary period this driver
//! only ever programs the two `WDP` values the spec actually uses —
//! anything else is a configuration error, not a runtime one.
//!
//! Changing the watchdog prescaler requires the timed "change enable"
//! sequence from the ATmega328P datasheet (§11.9.2): write `WDCE` and
//! `WDE` together, then write the final prescaler within four clock
//! cycles. `WDTCSR` layout: bit7 WDIF, bit6 WDIE, bit5 WDP3, bit4 WDCE,
//! bit3 WDE, bit2:0 WDP2:0.

use arduino_hal::pac::WDT;
use servo_hal::Watchdog;

const WDCE_WDE: u8 = 0b0001_1000;

pub struct BoardWatchdog(WDT);

impl BoardWatchdog {
    pub fn new(wdt: WDT) -> Self {
        Self(wdt)
    }
}

impl Watchdog for BoardWatchdog {
    fn enable(&mut self, period_ms: u16) {
        // WDE=1, WDP3:0 = 0100 (250 ms) or 0101 (500 ms); system-reset
        // mode only, no watchdog interrupt.
        let prescaler = match period_ms {
            250 => 0b0000_1100u8,
            _ => 0b0000_1101u8, // 500 ms, and the fallback for anything else.
        };
        avr_device::interrupt::free(|_| {
            self.0.wdtcsr.write(|w| unsafe { w.bits(WDCE_WDE) });
            self.0.wdtcsr.write(|w| unsafe { w.bits(prescaler) });
        });
    }

    fn kick(&mut self) {
        avr_device::asm::wdr();
    }
}
