//! Servo slew engine (§4.G): the one piece of `servo_core` meant to run
//! from the 1 ms tick ISR. Steps `current_duty` toward `desired_duty` at a
//! fixed per-tick rate and tri-states the PWM pin once settled.

use crate::mode::{self, State};
use crate::variant::{HUM_TIMEOUT, PWM_ADJ_RESOLUTION, PWM_CLOSED_LIM, PWM_OPEN_LIM};
use servo_hal::PwmOutput;

/// ISR-owned slew state (§4.G, §5 "the ISR may not block"). `step` never
/// calls anything that can block; the busy-wait on `in_low_phase` is the
/// PWM hardware's own free-running counter, not a suspension point.
pub struct SlewEngine {
    current_duty: u16,
    speed_timer: u16,
    hum_count: u32,
}

impl SlewEngine {
    pub fn new(initial_duty: u16) -> Self {
        Self {
            current_duty: initial_duty.clamp(PWM_CLOSED_LIM, PWM_OPEN_LIM),
            speed_timer: 0,
            hum_count: 0,
        }
    }

    pub fn current_duty(&self) -> u16 {
        self.current_duty
    }

    /// One tick of §4.G's six-step algorithm. `speed` is the calibrated
    /// slew rate (ticks between steps); `desired_duty` and `state` are the
    /// foreground's latest values, read by the caller inside a critical
    /// section per §5.
    pub fn step(
        &mut self,
        desired_duty: u16,
        speed: u16,
        state: State,
        pwm: &mut impl PwmOutput,
    ) {
        if self.speed_timer > 0 {
            self.speed_timer -= 1;
            return;
        }

        let target = desired_duty.clamp(PWM_CLOSED_LIM, PWM_OPEN_LIM);
        let diff = target as i32 - self.current_duty as i32;
        let step = PWM_ADJ_RESOLUTION as i32;

        if diff > step + 1 {
            self.apply_step(self.current_duty + PWM_ADJ_RESOLUTION, speed, pwm);
        } else if diff < -(step + 1) {
            self.apply_step(self.current_duty - PWM_ADJ_RESOLUTION, speed, pwm);
        } else {
            self.settle(state, pwm);
        }
    }

    fn apply_step(&mut self, new_duty: u16, speed: u16, pwm: &mut impl PwmOutput) {
        while !pwm.in_low_phase() {}
        self.current_duty = new_duty;
        pwm.set_duty(new_duty);
        pwm.enable();
        self.speed_timer = speed;
        self.hum_count = 0;
    }

    fn settle(&mut self, state: State, pwm: &mut impl PwmOutput) {
        if pwm.is_enabled() && self.hum_count == 0 {
            self.hum_count = HUM_TIMEOUT;
        }

        if self.hum_count > 0 {
            self.hum_count -= 1;
            if self.hum_count == 0 && mode::allows_hum_suppression(state) {
                while !pwm.in_low_phase() {}
                pwm.disable();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_hal::mock::RecordingPwm;

    #[test]
    fn steps_toward_target_by_fixed_resolution() {
        let mut engine = SlewEngine::new(750);
        let mut pwm = RecordingPwm::new();
        engine.step(2250, 1, State::Normal, &mut pwm);
        assert_eq!(engine.current_duty(), 760);
        assert!(pwm.is_enabled());
    }

    #[test]
    fn current_duty_never_leaves_the_clamp_range() {
        let mut engine = SlewEngine::new(750);
        let mut pwm = RecordingPwm::new();
        for _ in 0..200 {
            engine.step(u16::MAX, 0, State::Normal, &mut pwm);
            assert!(engine.current_duty() >= PWM_CLOSED_LIM);
            assert!(engine.current_duty() <= PWM_OPEN_LIM);
        }
    }

    #[test]
    fn speed_gates_how_often_a_step_is_taken() {
        let mut engine = SlewEngine::new(750);
        let mut pwm = RecordingPwm::new();
        engine.step(2250, 4, State::Normal, &mut pwm);
        assert_eq!(engine.current_duty(), 760);
        // Four more ticks are absorbed by the speed timer, not stepping.
        for _ in 0..4 {
            engine.step(2250, 4, State::Normal, &mut pwm);
            assert_eq!(engine.current_duty(), 760);
        }
        engine.step(2250, 4, State::Normal, &mut pwm);
        assert_eq!(engine.current_duty(), 770);
    }

    #[test]
    fn tristates_after_hum_timeout_in_settled_states() {
        let mut engine = SlewEngine::new(750);
        let mut pwm = RecordingPwm::new();
        engine.step(750, 0, State::Normal, &mut pwm); // drive duty once, enabling the pin
        pwm.set_duty(750);
        pwm.enable();

        for _ in 0..HUM_TIMEOUT {
            engine.step(750, 0, State::Normal, &mut pwm);
        }
        assert!(!pwm.is_enabled());
    }

    #[cfg(feature = "variant-v2")]
    #[test]
    fn program_states_never_get_tri_stated() {
        let mut engine = SlewEngine::new(750);
        let mut pwm = RecordingPwm::new();
        pwm.set_duty(750);
        pwm.enable();

        for _ in 0..(HUM_TIMEOUT + 10) {
            engine.step(750, 0, State::LoLim, &mut pwm);
        }
        assert!(pwm.is_enabled());
    }
}
