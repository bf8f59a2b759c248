//! Persistent calibration storage (SPEC_FULL.md §4.A `EepromStorage` /
//! `DefaultsSource`, §6 "Persisted state").
//!
//! `BoardEeprom` is a thin byte-at-a-time wrapper over `arduino-hal`'s
//! internal-EEPROM driver — blocking, ready-wait handled by the driver
//! itself, and (per §4.A / §5) never constructed or touched from
//! [`crate::tick`]'s ISR, only from `main`'s foreground loop.

use arduino_hal::Eeprom;
use servo_hal::{DefaultsSource, EepromStorage};

pub struct BoardEeprom(Eeprom);

impl BoardEeprom {
    pub fn new(eeprom: Eeprom) -> Self {
        Self(eeprom)
    }
}

impl EepromStorage for BoardEeprom {
    fn read_block(&mut self, offset: u16, dst: &mut [u8]) {
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = self.0.read_byte(offset + i as u16);
        }
    }

    fn write_block(&mut self, offset: u16, src: &[u8]) {
        for (i, byte) in src.iter().enumerate() {
            self.0.write_byte(offset + i as u16, *byte);
        }
    }

    fn read_byte(&mut self, offset: u16) -> u8 {
        self.0.read_byte(offset)
    }

    fn write_byte(&mut self, offset: u16, value: u8) {
        self.0.write_byte(offset, value)
    }
}

/// The immutable factory-defaults copy (§3 "Defaults source"). A real
/// flash-constrained port would place this in `.progmem` via the
/// `avr-progmem` crate; `servo_core`/`servo_hal` stay agnostic to that
/// choice (DESIGN.md notes the simplification), so this crate keeps it as
/// an ordinary `static` the linker places in `.rodata`.
pub struct ProgmemDefaults(pub [u8; servo_core::CalibrationRecord::BYTE_LEN]);

impl DefaultsSource for ProgmemDefaults {
    fn read_block(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.0);
    }
}
