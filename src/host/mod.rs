// Host-side client for the serial endpoint
//
// Provides:
// - Line-oriented serial controller (send / receive LF-terminated text)
// - Per-motor keymaps (command strings, loadable from JSON)
// - Motor abstraction with a single -1..1 control value
// - Dual motor drive train action group

pub mod drive;
pub mod keymap;
pub mod motor;
pub mod serial;

pub use drive::DualMotor;
pub use keymap::Keymap;
pub use motor::Motor;
pub use serial::{CommandSink, ControllerError, SerialController};
