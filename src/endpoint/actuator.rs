// Output side of the endpoint
//
// The interpreter only talks to `MotorActuator`. `PinActuator` turns motor
// actions into pin writes on a `PinWriter` (real peripheral or `SimulatedPins`).

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::config::{
    LEFT_BRAKE_PIN, LEFT_DIRECTION_PIN, LEFT_PWM_PIN, RIGHT_BRAKE_PIN, RIGHT_DIRECTION_PIN,
    RIGHT_PWM_PIN,
};
use crate::messages::{Actuation, MotorId, PinLevel};

/// Motor-level actuation capability
pub trait MotorActuator {
    fn set_brake(&mut self, motor: MotorId, level: PinLevel);
    fn set_direction(&mut self, motor: MotorId, level: PinLevel);
    fn set_speed(&mut self, motor: MotorId, duty: u8);

    /// Route an `Actuation` to the matching operation
    fn apply(&mut self, actuation: Actuation) {
        match actuation {
            Actuation::Brake { motor, level } => self.set_brake(motor, level),
            Actuation::Direction { motor, level } => self.set_direction(motor, level),
            Actuation::Speed { motor, duty } => self.set_speed(motor, duty),
        }
    }
}

/// Raw pin output capability (digital level / PWM duty)
pub trait PinWriter {
    fn digital_write(&mut self, pin: u8, level: PinLevel);
    fn analog_write(&mut self, pin: u8, duty: u8);
}

/// Error types for pin assignment
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PinMapError {
    #[error("Pin {pin} is assigned more than once")]
    Overlap { pin: u8 },
}

/// Output lines for one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MotorPins {
    pub pwm: u8,
    pub direction: u8,
    pub brake: u8,
}

impl MotorPins {
    pub fn as_array(&self) -> [u8; 3] {
        [self.pwm, self.direction, self.brake]
    }
}

/// Pin triples for both motors, all six pins distinct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    left: MotorPins,
    right: MotorPins,
}

impl PinMap {
    pub fn new(left: MotorPins, right: MotorPins) -> Result<Self, PinMapError> {
        let all = [left.as_array(), right.as_array()].concat();
        for (i, pin) in all.iter().enumerate() {
            if all[i + 1..].contains(pin) {
                return Err(PinMapError::Overlap { pin: *pin });
            }
        }
        Ok(Self { left, right })
    }

    /// Load and validate a pin map from JSON (`{"left": {...}, "right": {...}}`)
    pub fn from_json(json: &str) -> Result<Self, PinMapLoadError> {
        #[derive(Deserialize)]
        struct Raw {
            left: MotorPins,
            right: MotorPins,
        }
        let raw: Raw = serde_json::from_str(json)?;
        Ok(Self::new(raw.left, raw.right)?)
    }

    pub fn pins(&self, motor: MotorId) -> MotorPins {
        match motor {
            MotorId::Left => self.left,
            MotorId::Right => self.right,
        }
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            left: MotorPins {
                pwm: LEFT_PWM_PIN,
                direction: LEFT_DIRECTION_PIN,
                brake: LEFT_BRAKE_PIN,
            },
            right: MotorPins {
                pwm: RIGHT_PWM_PIN,
                direction: RIGHT_DIRECTION_PIN,
                brake: RIGHT_BRAKE_PIN,
            },
        }
    }
}

/// Error types for loading a pin map file
#[derive(Debug, thiserror::Error)]
pub enum PinMapLoadError {
    #[error("Invalid pin map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    PinMap(#[from] PinMapError),
}

/// Maps motor actions onto the motor's pin triple
pub struct PinActuator<P: PinWriter> {
    pins: PinMap,
    writer: P,
}

impl<P: PinWriter> PinActuator<P> {
    pub fn new(pins: PinMap, writer: P) -> Self {
        Self { pins, writer }
    }

    pub fn writer(&self) -> &P {
        &self.writer
    }
}

impl<P: PinWriter> MotorActuator for PinActuator<P> {
    fn set_brake(&mut self, motor: MotorId, level: PinLevel) {
        let pin = self.pins.pins(motor).brake;
        self.writer.digital_write(pin, level);
    }

    fn set_direction(&mut self, motor: MotorId, level: PinLevel) {
        let pin = self.pins.pins(motor).direction;
        self.writer.digital_write(pin, level);
    }

    fn set_speed(&mut self, motor: MotorId, duty: u8) {
        let pin = self.pins.pins(motor).pwm;
        self.writer.analog_write(pin, duty);
    }
}

/// Last value written to a simulated pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Digital(PinLevel),
    Pwm(u8),
}

/// In-memory output lines. Remembers the last write per pin and counts writes.
#[derive(Debug, Default)]
pub struct SimulatedPins {
    states: BTreeMap<u8, PinState>,
    writes: usize,
}

impl SimulatedPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, pin: u8) -> Option<PinState> {
        self.states.get(&pin).copied()
    }

    pub fn level(&self, pin: u8) -> Option<PinLevel> {
        match self.state(pin)? {
            PinState::Digital(level) => Some(level),
            PinState::Pwm(_) => None,
        }
    }

    pub fn duty(&self, pin: u8) -> Option<u8> {
        match self.state(pin)? {
            PinState::Pwm(duty) => Some(duty),
            PinState::Digital(_) => None,
        }
    }

    /// Total number of writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PinWriter for SimulatedPins {
    fn digital_write(&mut self, pin: u8, level: PinLevel) {
        debug!("digital_write pin={} level={:?}", pin, level);
        self.states.insert(pin, PinState::Digital(level));
        self.writes += 1;
    }

    fn analog_write(&mut self, pin: u8, duty: u8) {
        debug!("analog_write pin={} duty={}", pin, duty);
        self.states.insert(pin, PinState::Pwm(duty));
        self.writes += 1;
    }
}

/// Records every call, for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub calls: Vec<Actuation>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded calls, leaving the log empty
    pub fn drain(&mut self) -> Vec<Actuation> {
        std::mem::take(&mut self.calls)
    }
}

impl MotorActuator for RecordingActuator {
    fn set_brake(&mut self, motor: MotorId, level: PinLevel) {
        self.calls.push(Actuation::Brake { motor, level });
    }

    fn set_direction(&mut self, motor: MotorId, level: PinLevel) {
        self.calls.push(Actuation::Direction { motor, level });
    }

    fn set_speed(&mut self, motor: MotorId, duty: u8) {
        self.calls.push(Actuation::Speed { motor, duty });
    }
}
