// Serial command endpoint for two DC motors, plus the host-side client that drives it

pub mod config;
pub mod endpoint;
pub mod host;
pub mod messages;
pub mod runtime;
pub mod teleop;
