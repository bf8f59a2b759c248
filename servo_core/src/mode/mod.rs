//! Mode state machine (§4.F): the only place that decides `desired_duty`
//! and that ever touches EEPROM outside of boot.

use servo_hal::{DefaultsSource, EepromStorage};

use crate::calibration::{self, CalibrationRecord};
use crate::gesture::{DemoGesture, LockGesture};
use crate::input::{Event, Inputs, KeyPos, NormRev, SwitchPos};
use crate::timebase::elapsed_since;
use crate::variant;

#[cfg(feature = "variant-v2")]
use crate::gesture::ProgramGesture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Transient: resolved to `Normal` or `Locked` within the same call
    /// that set it, never observed between calls (§4.F "REBOOT (initial)").
    Reboot,
    Normal,
    Locked,
    Demo,
    #[cfg(feature = "variant-v2")]
    LoLim,
    #[cfg(feature = "variant-v2")]
    HiLim,
    #[cfg(feature = "variant-v2")]
    Speed,
    /// Transient like `Reboot`: resolved to `Normal` within the same call.
    #[cfg(feature = "variant-v2")]
    EepromCommit,
}

/// Whether a state's settled output gets tri-stated by the hum-suppression
/// timer (§4.G point 6: "Program states always keep PWM driven so the
/// operator can see adjustments").
pub fn allows_hum_suppression(state: State) -> bool {
    matches!(state, State::Normal | State::Locked | State::Demo)
}

fn invert_key(key: KeyPos) -> KeyPos {
    match key {
        KeyPos::On => KeyPos::Off,
        KeyPos::Off => KeyPos::On,
    }
}

/// Owns the calibration record, the lock flag, and every gesture
/// recognizer, and produces `desired_duty` for the slew engine (§4.G) to
/// converge on. Never touches the PWM pin directly.
pub struct Machine {
    state: State,
    calibration: CalibrationRecord,
    lock_flag: bool,
    desired_duty: u16,
    open_time: u32,
    open_time_active: bool,
    last_activity: u32,
    reset_latch: bool,
    demo_saved_speed: Option<u16>,
    demo_cycle_start: u32,
    enter_lock_gesture: LockGesture,
    exit_lock_gesture: LockGesture,
    demo_gesture: DemoGesture,
    #[cfg(feature = "variant-v2")]
    program_gesture: ProgramGesture,
}

impl Machine {
    /// Performs the REBOOT sequence (§4.F) and returns the machine already
    /// settled into `Normal` or `Locked`. Boot never blocks on anything the
    /// caller didn't already block on to get `eeprom` and `now`.
    pub fn boot(eeprom: &mut impl EepromStorage, now: u32) -> Self {
        let mut machine = Self {
            state: State::Reboot,
            calibration: calibration::FACTORY_DEFAULTS,
            lock_flag: false,
            desired_duty: calibration::FACTORY_DEFAULTS.lower_limit,
            open_time: now,
            open_time_active: false,
            last_activity: now,
            reset_latch: false,
            demo_saved_speed: None,
            demo_cycle_start: now,
            enter_lock_gesture: LockGesture::new((SwitchPos::Up, SwitchPos::Center)),
            exit_lock_gesture: LockGesture::new((SwitchPos::Down, SwitchPos::Center)),
            demo_gesture: DemoGesture::new(),
            #[cfg(feature = "variant-v2")]
            program_gesture: ProgramGesture::new(),
        };
        machine.finish_reboot(eeprom, now);
        machine
    }

    fn finish_reboot(&mut self, eeprom: &mut impl EepromStorage, now: u32) {
        let (record, lock_flag, _load_error) = calibration::load(eeprom);
        self.calibration = record;
        self.lock_flag = lock_flag;
        self.desired_duty = record.lower_limit;
        self.open_time_active = false;
        self.last_activity = now;
        self.enter_lock_gesture.reset();
        self.exit_lock_gesture.reset();
        self.demo_gesture.reset();
        #[cfg(feature = "variant-v2")]
        self.program_gesture.reset();
        self.state = if lock_flag { State::Locked } else { State::Normal };
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn calibration(&self) -> CalibrationRecord {
        self.calibration
    }

    pub fn lock_flag(&self) -> bool {
        self.lock_flag
    }

    pub fn desired_duty(&self) -> u16 {
        self.desired_duty
    }

    /// V3 only: recomputes `upper_limit`/`lower_limit`/`speed` from the
    /// trim pots every sample tick, ahead of the ordinary [`Self::step`]
    /// (§4.F "the LO_LIM/HI_LIM/SPEED/EEPROM_COMMIT chain is absent").
    #[cfg(feature = "variant-v3")]
    pub fn recompute_continuous(&mut self, adc: &mut impl servo_hal::AdcChannel) {
        use crate::variant::continuous::{LIMIT_POT_SCALE, LIMIT_POT_SHIFT, SPEED_POT_SHIFT};
        use servo_hal::Channel;

        let open_adc = adc.sample(Channel::HighLimit) as i32;
        let closed_adc = adc.sample(Channel::LowLimit) as i32;
        let speed_adc = adc.sample(Channel::Speed);

        let upper = variant::PWM_OPEN_LIM as i32 - LIMIT_POT_SCALE * (open_adc >> LIMIT_POT_SHIFT);
        let lower =
            variant::PWM_CLOSED_LIM as i32 + LIMIT_POT_SCALE * (closed_adc >> LIMIT_POT_SHIFT);
        self.calibration.upper_limit = upper.clamp(0, u16::MAX as i32) as u16;
        self.calibration.lower_limit = lower.clamp(0, u16::MAX as i32) as u16;
        self.calibration.speed = (speed_adc >> SPEED_POT_SHIFT).max(variant::SPEED_MIN);
    }

    /// Advances the machine by one foreground sample (§4.C, §4.F). Returns
    /// the new `desired_duty` for the slew engine to converge toward.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        inputs: Inputs,
        switch_event: Option<Event<SwitchPos>>,
        key_event: Option<Event<KeyPos>>,
        reset_requested: bool,
        now: u32,
        eeprom: &mut impl EepromStorage,
        defaults: &impl DefaultsSource,
    ) -> u16 {
        if reset_requested {
            if !self.reset_latch {
                self.reset_latch = true;
                calibration::reset_to_defaults(eeprom, defaults);
                self.state = State::Reboot;
            }
        } else {
            self.reset_latch = false;
        }

        if matches!(self.state, State::Reboot) {
            self.finish_reboot(eeprom, now);
        }

        if switch_event.is_some() || key_event.is_some() {
            self.last_activity = now;
        }

        match self.state {
            State::Reboot => unreachable!("resolved above"),
            State::Normal => self.step_normal(
                inputs,
                switch_event,
                key_event,
                now,
                eeprom,
                #[cfg(feature = "variant-v2")]
                defaults,
            ),
            State::Locked => self.step_locked(inputs, switch_event, eeprom, now),
            State::Demo => self.step_demo(inputs, switch_event, now),
            #[cfg(feature = "variant-v2")]
            State::LoLim => self.step_lo_lim(switch_event, key_event, now, eeprom),
            #[cfg(feature = "variant-v2")]
            State::HiLim => self.step_hi_lim(switch_event, key_event, now, eeprom),
            #[cfg(feature = "variant-v2")]
            State::Speed => self.step_speed(switch_event, key_event, now, eeprom),
            #[cfg(feature = "variant-v2")]
            State::EepromCommit => {}
        }

        self.desired_duty
    }

    #[allow(clippy::too_many_arguments)]
    fn step_normal(
        &mut self,
        inputs: Inputs,
        switch_event: Option<Event<SwitchPos>>,
        key_event: Option<Event<KeyPos>>,
        now: u32,
        eeprom: &mut impl EepromStorage,
        #[cfg(feature = "variant-v2")] defaults: &impl DefaultsSource,
    ) {
        match inputs.switch {
            SwitchPos::Up => self.desired_duty = self.calibration.upper_limit,
            SwitchPos::Down => self.desired_duty = self.calibration.lower_limit,
            SwitchPos::Center => self.step_normal_center(inputs, key_event, now),
        }

        #[cfg(feature = "variant-v2")]
        {
            let switch_down = inputs.switch == SwitchPos::Down;
            self.program_gesture.on_switch_sample(switch_down);
            if let Some(ev) = &key_event {
                if self.program_gesture.on_key_event(ev, switch_down) {
                    self.enter_lo_lim(now, defaults);
                    return;
                }
            }
        }

        self.enter_lock_gesture.expire(now);
        self.demo_gesture.expire(now);
        let key_on = inputs.key == KeyPos::On;
        if let Some(ev) = &switch_event {
            if self.enter_lock_gesture.on_switch_event(ev, key_on) {
                self.enter_locked(eeprom);
                return;
            }
            if self.demo_gesture.on_switch_event(ev, key_on) {
                self.enter_demo(now);
            }
        }
    }

    /// The CENTER+ACC hold-open rule (§4.F), with V1's NORM/REV inversion
    /// applied only here: "the V1 variant additionally consults the
    /// NORM/REV pin to swap the meaning of ACC".
    fn step_normal_center(&mut self, inputs: Inputs, key_event: Option<Event<KeyPos>>, now: u32) {
        let invert = variant::APPLIES_NORM_REV_INVERSION && inputs.norm_rev == NormRev::Rev;

        if let Some(ev) = &key_event {
            let (old, new) = if invert {
                (invert_key(ev.old), invert_key(ev.new))
            } else {
                (ev.old, ev.new)
            };
            match (old, new) {
                (KeyPos::Off, KeyPos::On) => {
                    self.open_time = now;
                    self.open_time_active = true;
                }
                (KeyPos::On, KeyPos::Off) => {
                    self.desired_duty = self.calibration.lower_limit;
                    self.open_time_active = false;
                }
                _ => {}
            }
        }

        let effective_key = if invert { invert_key(inputs.key) } else { inputs.key };
        if effective_key == KeyPos::On {
            if self.open_time_active && elapsed_since(now, self.open_time) > variant::ACC_TIMEOUT {
                self.desired_duty = self.calibration.upper_limit;
            }
        } else {
            self.desired_duty = self.calibration.lower_limit;
        }
    }

    fn enter_locked(&mut self, eeprom: &mut impl EepromStorage) {
        self.desired_duty = self.calibration.lower_limit;
        self.lock_flag = true;
        calibration::store(eeprom, self.calibration, true);
        self.enter_lock_gesture.reset();
        self.exit_lock_gesture.reset();
        self.demo_gesture.reset();
        self.state = State::Locked;
    }

    fn step_locked(
        &mut self,
        inputs: Inputs,
        switch_event: Option<Event<SwitchPos>>,
        eeprom: &mut impl EepromStorage,
        now: u32,
    ) {
        self.desired_duty = self.calibration.lower_limit;
        self.exit_lock_gesture.expire(now);
        let key_on = inputs.key == KeyPos::On;
        if let Some(ev) = &switch_event {
            if self.exit_lock_gesture.on_switch_event(ev, key_on) {
                self.lock_flag = false;
                calibration::store(eeprom, self.calibration, false);
                self.exit_lock_gesture.reset();
                self.state = State::Normal;
            }
        }
    }

    fn enter_demo(&mut self, now: u32) {
        self.demo_saved_speed = Some(self.calibration.speed);
        self.calibration.speed = variant::DEMO_SPEED;
        self.demo_cycle_start = now;
        self.desired_duty = self.calibration.lower_limit;
        self.demo_gesture.reset();
        self.state = State::Demo;
    }

    fn step_demo(&mut self, inputs: Inputs, switch_event: Option<Event<SwitchPos>>, now: u32) {
        if elapsed_since(now, self.demo_cycle_start) >= variant::DEMO_CYCLE_TIME {
            self.demo_cycle_start = now;
            self.desired_duty = if self.desired_duty == self.calibration.upper_limit {
                self.calibration.lower_limit
            } else {
                self.calibration.upper_limit
            };
        }

        self.demo_gesture.expire(now);
        let key_on = inputs.key == KeyPos::On;
        if let Some(ev) = &switch_event {
            if self.demo_gesture.on_switch_event(ev, key_on) {
                if let Some(speed) = self.demo_saved_speed.take() {
                    self.calibration.speed = speed;
                }
                self.demo_gesture.reset();
                self.state = State::Normal;
            }
        }
    }

    /// §4.F "LO_LIM... on entry (once): reload RAM calibration from the
    /// in-program defaults" — discards whatever calibration NORMAL was
    /// running with, the same way `examples/original_source/Code/V2a/
    /// main.c`'s `STATE_LO_LIM` handler `memcpy_P`s the flash-resident
    /// defaults over `ServoParamsRamPtr` the first time it's entered. The
    /// EEPROM record itself is untouched until EEPROM_COMMIT.
    #[cfg(feature = "variant-v2")]
    fn enter_lo_lim(&mut self, now: u32, defaults: &impl DefaultsSource) {
        self.calibration = calibration::load_defaults(defaults);
        self.desired_duty = self.calibration.lower_limit;
        self.last_activity = now;
        self.program_gesture.reset();
        self.state = State::LoLim;
    }

    #[cfg(feature = "variant-v2")]
    fn step_lo_lim(
        &mut self,
        switch_event: Option<Event<SwitchPos>>,
        key_event: Option<Event<KeyPos>>,
        now: u32,
        eeprom: &mut impl EepromStorage,
    ) {
        if let Some(ev) = &switch_event {
            match (ev.old, ev.new) {
                (SwitchPos::Center, SwitchPos::Down) => {
                    self.calibration.lower_limit = self
                        .calibration
                        .lower_limit
                        .saturating_sub(variant::PWM_ADJ_RESOLUTION);
                    self.desired_duty = self.calibration.lower_limit;
                }
                (SwitchPos::Center, SwitchPos::Up) => {
                    self.calibration.lower_limit = self
                        .calibration
                        .lower_limit
                        .saturating_add(variant::PWM_ADJ_RESOLUTION);
                    self.desired_duty = self.calibration.lower_limit;
                }
                _ => {}
            }
        }
        if let Some(ev) = &key_event {
            if (ev.old, ev.new) == (KeyPos::On, KeyPos::Off) {
                self.enter_hi_lim(now);
                return;
            }
        }
        self.check_program_timeout(now, eeprom);
    }

    #[cfg(feature = "variant-v2")]
    fn enter_hi_lim(&mut self, now: u32) {
        self.desired_duty = self.calibration.upper_limit;
        self.last_activity = now;
        self.state = State::HiLim;
    }

    #[cfg(feature = "variant-v2")]
    fn step_hi_lim(
        &mut self,
        switch_event: Option<Event<SwitchPos>>,
        key_event: Option<Event<KeyPos>>,
        now: u32,
        eeprom: &mut impl EepromStorage,
    ) {
        if let Some(ev) = &switch_event {
            match (ev.old, ev.new) {
                (SwitchPos::Center, SwitchPos::Down) => {
                    self.calibration.upper_limit = self
                        .calibration
                        .upper_limit
                        .saturating_sub(variant::PWM_ADJ_RESOLUTION);
                    self.desired_duty = self.calibration.upper_limit;
                }
                (SwitchPos::Center, SwitchPos::Up) => {
                    self.calibration.upper_limit = self
                        .calibration
                        .upper_limit
                        .saturating_add(variant::PWM_ADJ_RESOLUTION);
                    self.desired_duty = self.calibration.upper_limit;
                }
                _ => {}
            }
        }
        if let Some(ev) = &key_event {
            if (ev.old, ev.new) == (KeyPos::On, KeyPos::Off) {
                self.enter_speed(now);
                return;
            }
        }
        self.check_program_timeout(now, eeprom);
    }

    #[cfg(feature = "variant-v2")]
    fn enter_speed(&mut self, now: u32) {
        self.last_activity = now;
        self.state = State::Speed;
    }

    #[cfg(feature = "variant-v2")]
    fn step_speed(
        &mut self,
        switch_event: Option<Event<SwitchPos>>,
        key_event: Option<Event<KeyPos>>,
        now: u32,
        eeprom: &mut impl EepromStorage,
    ) {
        if let Some(ev) = &switch_event {
            match (ev.old, ev.new) {
                (SwitchPos::Center, SwitchPos::Down) => {
                    self.desired_duty = self.calibration.lower_limit;
                }
                (SwitchPos::Center, SwitchPos::Up) => {
                    self.desired_duty = self.calibration.upper_limit;
                }
                (SwitchPos::Up, SwitchPos::Center) => {
                    let doubled = self.calibration.speed.saturating_mul(2);
                    self.calibration.speed = if doubled > variant::SPEED_MAX {
                        variant::SPEED_MIN
                    } else if doubled < variant::SPEED_MIN {
                        variant::SPEED_MIN
                    } else {
                        doubled
                    };
                }
                _ => {}
            }
        }
        if let Some(ev) = &key_event {
            if (ev.old, ev.new) == (KeyPos::On, KeyPos::Off) {
                self.state = State::EepromCommit;
                self.finish_eeprom_commit(eeprom);
                return;
            }
        }
        self.check_program_timeout(now, eeprom);
    }

    #[cfg(feature = "variant-v2")]
    fn finish_eeprom_commit(&mut self, eeprom: &mut impl EepromStorage) {
        calibration::store(eeprom, self.calibration, self.lock_flag);
        self.state = State::Normal;
    }

    #[cfg(feature = "variant-v2")]
    fn check_program_timeout(&mut self, now: u32, eeprom: &mut impl EepromStorage) {
        if elapsed_since(now, self.last_activity) > variant::PROG_TIMEOUT {
            let (record, lock_flag, _load_error) = calibration::load(eeprom);
            self.calibration = record;
            self.lock_flag = lock_flag;
            self.desired_duty = record.lower_limit;
            self.state = State::Normal;
        }
    }
}
