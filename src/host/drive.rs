// Dual motor drive train

use super::motor::Motor;
use super::serial::{CommandSink, Result};
use crate::messages::MotorId;

/// Left/right motor pair (differential drive)
#[derive(Debug, Clone)]
pub struct DualMotor {
    pub left: Motor,
    pub right: Motor,
}

impl DualMotor {
    pub fn new(left: Motor, right: Motor) -> Self {
        Self { left, right }
    }

    pub fn forward<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.left.forward(sink, speed)?;
        self.right.forward(sink, speed)
    }

    pub fn backward<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.left.backward(sink, speed)?;
        self.right.backward(sink, speed)
    }

    /// Spin in place turning right
    pub fn clockwise<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.left.forward(sink, speed)?;
        self.right.backward(sink, speed)
    }

    /// Spin in place turning left
    pub fn counterclockwise<S: CommandSink>(&mut self, sink: &mut S, speed: f64) -> Result<()> {
        self.left.backward(sink, speed)?;
        self.right.forward(sink, speed)
    }

    pub fn stop<S: CommandSink>(&mut self, sink: &mut S) -> Result<()> {
        self.left.stop(sink)?;
        self.right.stop(sink)
    }
}

impl Default for DualMotor {
    fn default() -> Self {
        Self::new(Motor::for_id(MotorId::Left), Motor::for_id(MotorId::Right))
    }
}
