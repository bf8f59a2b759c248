//! tCover AutoMotion firmware binary (SPEC_FULL.md §0: "a thin
//! `#![no_main]` binary for an AVR 8-bit target"). Wires real peripherals
//! to `servo_hal`'s traits and drives `servo_core`'s foreground loop; the
//! ISR half lives in [`tick`].
//!
//! Two scheduling domains, exactly as §5 describes: this file's `main`
//! loop is the foreground, `tick::TIMER0_COMPA` is the ~1 ms ISR. They
//! share only [`tick::SETPOINT`] (foreground→ISR) and the masked reads in
//! [`tick`] (ISR→foreground) — everything else here (the ADC, the
//! EEPROM, the digital sense pins, `Sampler` and `Machine`) is
//! foreground-only and is never touched from interrupt context.
#![no_std]
#![no_main]

mod adc;
mod eeprom;
mod pins;
mod pwm;
mod tick;
mod watchdog;

use panic_halt as _;

use servo_core::{decode_norm_rev, decode_switch};
use servo_core::{Inputs, Sampler};
use servo_hal::{AdcChannel, Channel, DigitalInput, Watchdog};

use crate::adc::BoardAdc;
use crate::eeprom::{BoardEeprom, ProgmemDefaults};
use crate::pins::{NormRevPin, ResetRequestPin};
use crate::tick::SlewSetpoint;
use crate::watchdog::BoardWatchdog;

#[cfg(not(feature = "variant-v1"))]
use crate::pins::AccDigitalPin;
#[cfg(feature = "variant-v1")]
use servo_core::decode_key_analog;
#[cfg(not(feature = "variant-v1"))]
use servo_core::decode_key_digital;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    #[cfg(feature = "serial-log")]
    let mut serial = arduino_hal::default_serial!(dp, pins, 57600);

    let mut adc_periph = arduino_hal::Adc::new(dp.ADC, Default::default());
    #[cfg(feature = "variant-v1")]
    let acc_pin = pins.a0.into_analog_input(&mut adc_periph);
    let switch_pin = pins.a1.into_analog_input(&mut adc_periph);
    let speed_pin = pins.a2.into_analog_input(&mut adc_periph);
    let high_limit_pin = pins.a3.into_analog_input(&mut adc_periph);
    let low_limit_pin = pins.a4.into_analog_input(&mut adc_periph);

    let mut board_adc = BoardAdc::new(
        adc_periph,
        #[cfg(feature = "variant-v1")]
        acc_pin,
        switch_pin,
        speed_pin,
        high_limit_pin,
        low_limit_pin,
    );

    #[cfg(not(feature = "variant-v1"))]
    let acc_digital = AccDigitalPin(pins.d2.into_pull_up_input());
    let norm_rev_pin = NormRevPin(pins.d3.into_pull_up_input());
    let reset_pin = ResetRequestPin(pins.d4.into_pull_up_input());

    let mut board_eeprom = BoardEeprom::new(arduino_hal::Eeprom::new(dp.EEPROM));
    let defaults = ProgmemDefaults(servo_core::calibration::FACTORY_DEFAULTS.to_bytes());
    let mut board_watchdog = BoardWatchdog::new(dp.WDT);

    // §4.F REBOOT: seed the event detector with the current inputs before
    // the mode machine's own boot sequence runs.
    let initial_switch = decode_switch(board_adc.sample(Channel::Switch));
    let initial_key = read_key(
        &mut board_adc,
        #[cfg(not(feature = "variant-v1"))]
        &acc_digital,
    );
    let initial_norm_rev = decode_norm_rev(norm_rev_pin.is_asserted());

    let mut machine = servo_core::Machine::boot(&mut board_eeprom, 0);
    board_watchdog.enable(servo_core::variant::WDT_PERIOD_MS);

    let mut sampler = Sampler::new(
        Inputs {
            switch: initial_switch,
            key: initial_key,
            norm_rev: initial_norm_rev,
        },
        0,
    );

    #[cfg(feature = "serial-log")]
    {
        let cal = machine.calibration();
        ufmt::uwriteln!(
            &mut serial,
            "tCover AutoMotion boot: upper={} lower={} speed={}\r",
            cal.upper_limit,
            cal.lower_limit,
            cal.speed,
        )
        .ok();
    }

    let slew = servo_core::SlewEngine::new(machine.desired_duty());
    let servo_pwm = pwm::ServoPwm::new(dp.TC1, dp.PORTB, machine.desired_duty());
    tick::install(&dp.TC0, servo_core::Timebase::new(), slew, servo_pwm);
    tick::publish_setpoint(SlewSetpoint {
        desired_duty: machine.desired_duty(),
        speed: machine.calibration().speed,
        state: machine.state(),
    });

    unsafe { avr_device::interrupt::enable() };

    loop {
        if tick::take_sample_flag() {
            let now = tick::now();
            let raw_switch = decode_switch(board_adc.sample(Channel::Switch));
            let raw_key = read_key(
                &mut board_adc,
                #[cfg(not(feature = "variant-v1"))]
                &acc_digital,
            );
            let raw_norm_rev = decode_norm_rev(norm_rev_pin.is_asserted());
            sampler.sample(raw_switch, raw_key, raw_norm_rev, now);

            #[cfg(feature = "variant-v3")]
            machine.recompute_continuous(&mut board_adc);

            let switch_event = sampler.take_switch_event();
            let key_event = sampler.take_key_event();
            let desired_duty = machine.step(
                sampler.inputs(),
                switch_event,
                key_event,
                reset_pin.is_asserted(),
                now,
                &mut board_eeprom,
                &defaults,
            );

            tick::publish_setpoint(SlewSetpoint {
                desired_duty,
                speed: machine.calibration().speed,
                state: machine.state(),
            });
        }

        board_watchdog.kick();
    }
}

#[cfg(feature = "variant-v1")]
fn read_key(adc: &mut BoardAdc) -> servo_core::KeyPos {
    decode_key_analog(adc.sample(Channel::Acc))
}

#[cfg(not(feature = "variant-v1"))]
fn read_key(_adc: &mut BoardAdc, acc: &AccDigitalPin) -> servo_core::KeyPos {
    decode_key_digital(acc.is_on())
}
