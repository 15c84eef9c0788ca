// Line-oriented serial controller
// Every message goes out as ASCII followed by a single LF.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::config::LINE_DELIMITER;

/// Error types for the host client
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to open serial controller: {0}")]
    Open(#[from] serialport::Error),

    #[error("Serial controller IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read keymap {path}: {source}")]
    KeymapRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid keymap: {0}")]
    KeymapParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;

/// Anything that accepts command lines
pub trait CommandSink {
    fn send(&mut self, line: &str) -> Result<()>;
}

// Collects lines in memory (dry runs, tests)
impl CommandSink for Vec<String> {
    fn send(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Encode a message as ASCII, replacing anything else with `?`, plus LF
pub fn encode_line(message: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = message
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    bytes.push(LINE_DELIMITER);
    bytes
}

/// Serial controller over any byte link
pub struct SerialController<T: Read + Write> {
    link: T,
}

impl SerialController<Box<dyn SerialPort>> {
    /// Open a serial port as a controller
    pub fn open(port_name: &str, baudrate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baudrate).timeout(timeout).open()?;
        Ok(Self::new(port))
    }
}

impl<T: Read + Write> SerialController<T> {
    pub fn new(link: T) -> Self {
        Self { link }
    }

    /// Write one message and its LF terminator
    pub fn send_line(&mut self, message: &str) -> Result<()> {
        debug!("Sending: {}", message);
        self.link.write_all(&encode_line(message))?;
        self.link.flush()?;
        Ok(())
    }

    /// Read up to the next LF (excluded). Returns whatever arrived if the
    /// link times out or closes first.
    pub fn receive(&mut self) -> Result<String> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.link.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == LINE_DELIMITER => break,
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn get_ref(&self) -> &T {
        &self.link
    }
}

impl<T: Read + Write> CommandSink for SerialController<T> {
    fn send(&mut self, line: &str) -> Result<()> {
        self.send_line(line)
    }
}
