#![cfg_attr(not(feature = "std"), no_std)]

//! Hardware capability traits for the tCover AutoMotion servo controller.
//!
//! `servo_core` is driven entirely through the traits defined here — a PWM
//! channel, an ADC channel selector, an EEPROM byte/block store, and a
//! watchdog — so the same mode/slew/gesture logic runs unmodified against
//! real AVR peripherals (see the `firmware` crate) or against the `mock`
//! module's virtual clock, scripted ADC and in-memory EEPROM in tests.

pub mod channel;
pub mod traits;

#[cfg(feature = "mock")]
pub mod mock;

pub use channel::Channel;
pub use traits::{AdcChannel, DefaultsSource, EepromStorage, PwmOutput, Watchdog};
