//! ADC channel reads (SPEC_FULL.md §4.A `AdcChannel`, §6 "ADC inputs").
//!
//! The Arduino Uno's analog pins already line up with the spec's logical
//! channel numbers — `A0`..`A4` are ADC channels 0..4 — so `servo_hal`'s
//! [`Channel`] enum doubles as the pin index without any remapping table.

use arduino_hal::hal::port::{PC0, PC1, PC2, PC3, PC4};
use arduino_hal::port::{mode::Analog, Pin};
use arduino_hal::Adc;
use servo_hal::{AdcChannel, Channel};

pub struct BoardAdc {
    adc: Adc,
    #[cfg(feature = "variant-v1")]
    acc: Pin<Analog, PC0>,
    switch: Pin<Analog, PC1>,
    speed: Pin<Analog, PC2>,
    high_limit: Pin<Analog, PC3>,
    low_limit: Pin<Analog, PC4>,
}

impl BoardAdc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        adc: Adc,
        #[cfg(feature = "variant-v1")] acc: Pin<Analog, PC0>,
        switch: Pin<Analog, PC1>,
        speed: Pin<Analog, PC2>,
        high_limit: Pin<Analog, PC3>,
        low_limit: Pin<Analog, PC4>,
    ) -> Self {
        Self {
            adc,
            #[cfg(feature = "variant-v1")]
            acc,
            switch,
            speed,
            high_limit,
            low_limit,
        }
    }
}

impl AdcChannel for BoardAdc {
    fn sample(&mut self, channel: Channel) -> u16 {
        match channel {
            #[cfg(feature = "variant-v1")]
            Channel::Acc => self.acc.analog_read(&mut self.adc),
            #[cfg(not(feature = "variant-v1"))]
            Channel::Acc => unreachable!("ACC is read on a digital pin outside variant-v1"),
            Channel::Switch => self.switch.analog_read(&mut self.adc),
            Channel::Speed => self.speed.analog_read(&mut self.adc),
            Channel::HighLimit => self.high_limit.analog_read(&mut self.adc),
            Channel::LowLimit => self.low_limit.analog_read(&mut self.adc),
        }
    }
}
