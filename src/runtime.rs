// Endpoint polling loop
// Each tick drains whatever bytes the link has buffered into the interpreter,
// one byte at a time. Bytes not yet polled stay in the port's own buffer.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::SERIAL_TIMEOUT;
use crate::endpoint::{Interpreter, MotorActuator, PinActuator, PinMap, SimulatedPins};
use crate::messages::Actuation;

/// Error types for the endpoint transport
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Loop rate must be non-zero")]
    ZeroLoopRate,
}

pub type Result<T> = std::result::Result<T, EndpointError>;

/// Byte-oriented input link
pub trait ByteSource {
    /// Number of bytes ready to read without blocking
    fn available(&mut self) -> Result<usize>;

    /// Read one byte, `None` if nothing arrived after all
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// Serial port input for the endpoint
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(SERIAL_TIMEOUT)
            .open()?;
        Ok(Self { port })
    }
}

impl ByteSource for SerialSource {
    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// In-memory link, used by tests and replay
impl ByteSource for VecDeque<u8> {
    fn available(&mut self) -> Result<usize> {
        Ok(self.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.pop_front())
    }
}

/// Drain every available byte into the interpreter.
/// `on_dispatch` sees the actuations of each completed line.
/// Returns the number of bytes consumed.
pub fn pump<S, A, F>(source: &mut S, interpreter: &mut Interpreter<A>, mut on_dispatch: F) -> Result<usize>
where
    S: ByteSource,
    A: MotorActuator,
    F: FnMut(&[Actuation]) -> Result<()>,
{
    let mut consumed = 0;
    while source.available()? > 0 {
        let Some(byte) = source.read_byte()? else {
            break;
        };
        consumed += 1;
        if let Some(actuations) = interpreter.feed(byte) {
            on_dispatch(actuations)?;
        }
    }
    Ok(consumed)
}

/// Settings for `serve`
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub port: String,
    pub baud_rate: u32,
    pub loop_hz: u64,
    pub pins: PinMap,
    /// Print each actuation as a JSON line on stdout
    pub json: bool,
}

/// Emit dispatched actuations: one JSON object per line to `out`, or log them
fn report<W: Write>(out: &mut W, actuations: &[Actuation], json: bool) -> Result<()> {
    for actuation in actuations {
        if json {
            serde_json::to_writer(&mut *out, actuation)?;
            out.write_all(b"\n")?;
        } else {
            info!("Actuation: {:?}", actuation);
        }
    }
    Ok(())
}

/// Run the endpoint on a serial port, driving simulated pins, until ctrl-c
pub async fn run(options: ServeOptions) -> Result<()> {
    if options.loop_hz == 0 {
        return Err(EndpointError::ZeroLoopRate);
    }

    info!("Opening serial port {} at {} baud...", options.port, options.baud_rate);
    let mut source = SerialSource::open(&options.port, options.baud_rate)?;

    let actuator = PinActuator::new(options.pins, SimulatedPins::new());
    let mut interpreter = Interpreter::new(actuator);
    let stdout = std::io::stdout();
    let mut tick = interval(Duration::from_millis((1000 / options.loop_hz).max(1)));

    info!("Endpoint started: {}Hz polling, pins {:?}", options.loop_hz, options.pins);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let consumed = pump(&mut source, &mut interpreter, |acts| {
                    report(&mut stdout.lock(), acts, options.json)
                })?;
                if consumed > 0 {
                    debug!("Consumed {} bytes", consumed);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
                break;
            }
        }
    }

    info!(
        "Endpoint stopped after {} lines, {} pin writes",
        interpreter.lines_dispatched(),
        interpreter.actuator().writer().writes()
    );
    Ok(())
}
