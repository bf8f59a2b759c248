//! Digital sense pins (SPEC_FULL.md §6 "Digital inputs"): the NORM/REV
//! direction pin and the external user-reset request pin. Both are
//! pull-up inputs; only their *polarity* differs — see each type's own
//! doc comment below.

use arduino_hal::hal::port::{PD2, PD3, PD4};
use arduino_hal::port::{mode::{Input, PullUp}, Pin};
use servo_hal::DigitalInput;

/// ACC accessory-signal digital input, variant-v2/v3 only (§4.C "in
/// variants that read a digital pin, the pin's logic level maps to
/// ON/OFF"). Active-high: pulled up when the key is off ACC, driven by
/// the ignition switch when on.
#[cfg(not(feature = "variant-v1"))]
pub struct AccDigitalPin(pub Pin<Input<PullUp>, PD2>);

#[cfg(not(feature = "variant-v1"))]
impl AccDigitalPin {
    pub fn is_on(&self) -> bool {
        self.0.is_high()
    }
}

/// Pull-up asserted (pin reads high) means NORM.
pub struct NormRevPin(pub Pin<Input<PullUp>, PD3>);

impl DigitalInput for NormRevPin {
    fn is_asserted(&self) -> bool {
        self.0.is_high()
    }
}

/// Pulled to ground (pin reads low) means a reset is requested.
pub struct ResetRequestPin(pub Pin<Input<PullUp>, PD4>);

impl DigitalInput for ResetRequestPin {
    fn is_asserted(&self) -> bool {
        self.0.is_low()
    }
}
