// Serial command endpoint
//
// Provides:
// - Line accumulation with overflow truncation
// - Exact-text command dispatch with the two-line speed protocol
// - Motor / pin actuation seams so the loop runs without hardware

pub mod actuator;
mod interpreter;
pub mod line;
pub mod parse;

pub use actuator::{
    MotorActuator, MotorPins, PinActuator, PinMap, PinMapError, PinMapLoadError, PinState,
    PinWriter, RecordingActuator, SimulatedPins,
};
pub use interpreter::Interpreter;
pub use line::LineBuffer;
