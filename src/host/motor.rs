// Host-side motor abstraction
//
// A motor is driven by one control value in [-1, 1]: sign picks direction,
// magnitude picks PWM duty, 0 brakes.

use tracing::debug;

use super::keymap::Keymap;
use super::serial::{CommandSink, Result};
use crate::messages::MotorId;

/// Full-scale PWM duty
pub const MAX_DUTY: f64 = 255.0;

/// Convert a control value to an 8-bit duty (magnitude only).
/// Halves round to even, so 0.3 gives 76 and 0.5 gives 128.
pub fn control_to_duty(control: f64) -> u8 {
    (MAX_DUTY * control.abs()).round_ties_even().clamp(0.0, MAX_DUTY) as u8
}

#[derive(Debug, Clone)]
pub struct Motor {
    keymap: Keymap,
    pwm_enabled: bool,
    direction_enabled: bool,
    control: f64,
}

impl Motor {
    /// Motor with both PWM and direction control
    pub fn new(keymap: Keymap) -> Self {
        Self::with_capabilities(keymap, true, true)
    }

    /// Motor using the endpoint's default command strings
    pub fn for_id(motor: MotorId) -> Self {
        Self::new(Keymap::for_motor(motor))
    }

    pub fn with_capabilities(keymap: Keymap, pwm_enabled: bool, direction_enabled: bool) -> Self {
        Self {
            keymap,
            pwm_enabled,
            direction_enabled,
            control: 0.0,
        }
    }

    /// Set the control value (clamped to [-1, 1]) and, with `autocommit`,
    /// send the commands that realise it
    pub fn set_control<S: CommandSink>(&mut self, sink: &mut S, value: f64, autocommit: bool) -> Result<()> {
        self.control = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
        if autocommit {
            self.commit(sink)?;
        }
        Ok(())
    }

    /// Send the commands for the current control value
    pub fn commit<S: CommandSink>(&self, sink: &mut S) -> Result<()> {
        debug!("Committing control {} via {:?}", self.control, self.keymap.speed);

        if self.control == 0.0 {
            return sink.send(&self.keymap.brake);
        }

        if self.pwm_enabled {
            // Endpoint reads the line after SPEED as the duty
            sink.send(&self.keymap.speed)?;
            sink.send(&control_to_duty(self.control).to_string())?;
        }

        if !self.direction_enabled || self.control > 0.0 {
            sink.send(&self.keymap.forwards)?;
        } else {
            sink.send(&self.keymap.backwards)?;
        }

        sink.send(&self.keymap.release)
    }

    /// Drive forwards at `speed` (0..=1, sign ignored)
    pub fn forward<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.set_control(sink, speed.abs(), true)
    }

    /// Drive backwards at `speed` (0..=1, sign ignored)
    pub fn backward<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.set_control(sink, -speed.abs(), true)
    }

    /// Brake
    pub fn stop<S: CommandSink>(&mut self, sink: &mut S) -> Result<()> {
        self.set_control(sink, 0.0, true)
    }

    pub fn control(&self) -> f64 {
        self.control
    }
}
