// Per-motor command strings

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::serial::{ControllerError, Result};
use crate::messages::{Command, MotorId, Verb};

/// Command strings a `Motor` sends for each action.
/// JSON form: `{"FORWARDS": ..., "BACKWARDS": ..., "SPEED": ..., "BRAKE": ..., "RELEASE": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Keymap {
    pub forwards: String,
    pub backwards: String,
    pub speed: String,
    pub brake: String,
    pub release: String,
}

impl Keymap {
    /// Keymap matching the endpoint's built-in command table
    pub fn for_motor(motor: MotorId) -> Self {
        let text = |verb| Command::new(verb, motor).to_string();
        Self {
            forwards: text(Verb::Forward),
            backwards: text(Verb::Backward),
            speed: text(Verb::Speed),
            brake: text(Verb::BrakeHold),
            release: text(Verb::BrakeRelease),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a keymap JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ControllerError::KeymapRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
