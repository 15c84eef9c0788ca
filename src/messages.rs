// Value types shared by the endpoint and the host client

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independently controlled motors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorId {
    Left,
    Right,
}

impl MotorId {
    /// Dispatch order: every Left check runs before any Right check
    pub const ALL: [MotorId; 2] = [MotorId::Left, MotorId::Right];

    /// Name used on the wire, e.g. `MOTOR_FORWARD MotorLeft`
    pub fn wire_name(self) -> &'static str {
        match self {
            MotorId::Left => "MotorLeft",
            MotorId::Right => "MotorRight",
        }
    }

    fn from_wire(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|motor| motor.wire_name().as_bytes() == name)
    }

    /// Slot in per-motor arrays
    pub fn index(self) -> usize {
        match self {
            MotorId::Left => 0,
            MotorId::Right => 1,
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Digital output level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinLevel {
    Low,
    High,
}

/// Command verbs understood by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    BrakeHold,
    BrakeRelease,
    Forward,
    Backward,
    Speed,
}

impl Verb {
    /// Evaluation order within one motor's checks
    pub const ALL: [Verb; 5] = [
        Verb::BrakeHold,
        Verb::BrakeRelease,
        Verb::Forward,
        Verb::Backward,
        Verb::Speed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::BrakeHold => "MOTOR_BRAKE_HOLD",
            Verb::BrakeRelease => "MOTOR_BRAKE_RELEASE",
            Verb::Forward => "MOTOR_FORWARD",
            Verb::Backward => "MOTOR_BACKWARD",
            Verb::Speed => "MOTOR_SPEED",
        }
    }

    fn from_wire(verb: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str().as_bytes() == verb)
    }
}

/// A recognised command line: `<VERB> <motor>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub motor: MotorId,
}

impl Command {
    pub fn new(verb: Verb, motor: MotorId) -> Self {
        Self { verb, motor }
    }

    /// Exact, case-sensitive match of a whole line against the command table.
    /// Anything else (extra spaces, trailing CR, lowercase) is not a command.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let space = line.iter().position(|&b| b == b' ')?;
        let (verb, rest) = line.split_at(space);
        let motor = rest.get(1..)?;
        Some(Self {
            verb: Verb::from_wire(verb)?,
            motor: MotorId::from_wire(motor)?,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb.as_str(), self.motor)
    }
}

/// One fire-and-forget output action issued by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Actuation {
    Brake { motor: MotorId, level: PinLevel },
    Direction { motor: MotorId, level: PinLevel },
    Speed { motor: MotorId, duty: u8 },
}
