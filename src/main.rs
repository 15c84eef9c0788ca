use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kinetic_endpoint::config::{BAUD_RATE, DEFAULT_PORT, LOOP_HZ, SERIAL_TIMEOUT};
use kinetic_endpoint::endpoint::PinMap;
use kinetic_endpoint::host::{CommandSink, DualMotor, Keymap, Motor, SerialController};
use kinetic_endpoint::messages::MotorId;
use kinetic_endpoint::runtime::{self, ServeOptions};
use kinetic_endpoint::teleop::{self, DriveAction};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "kinetic", version, about = "Serial motor endpoint and host client")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the command endpoint on a serial port, driving simulated pins
    Serve {
        #[arg(long, default_value = DEFAULT_PORT)]
        port: String,
        #[arg(long, default_value_t = BAUD_RATE)]
        baud: u32,
        #[arg(long, default_value_t = LOOP_HZ)]
        loop_hz: u64,
        /// Pin map JSON file (defaults to the built-in assignment)
        #[arg(long)]
        pins: Option<PathBuf>,
        /// Print each actuation as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Send raw command lines
    Send {
        #[arg(long, default_value = DEFAULT_PORT)]
        port: String,
        #[arg(long, default_value_t = BAUD_RATE)]
        baud: u32,
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Run one drive train action
    Drive {
        #[command(flatten)]
        host: HostArgs,
        #[arg(value_enum)]
        action: DriveAction,
        /// Speed as a fraction of full duty (0..=1)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Print the command lines instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Drive the motors from the keyboard
    Teleop {
        #[command(flatten)]
        host: HostArgs,
    },
}

#[derive(clap::Args)]
struct HostArgs {
    #[arg(long, default_value = DEFAULT_PORT)]
    port: String,
    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,
    /// Keymap JSON for the left motor
    #[arg(long)]
    left_keymap: Option<PathBuf>,
    /// Keymap JSON for the right motor
    #[arg(long)]
    right_keymap: Option<PathBuf>,
}

impl HostArgs {
    fn drive_train(&self) -> Result<DualMotor, BoxError> {
        let motor = |path: &Option<PathBuf>, id| -> Result<Motor, BoxError> {
            Ok(match path {
                Some(path) => Motor::new(Keymap::load(path)?),
                None => Motor::for_id(id),
            })
        };
        Ok(DualMotor::new(
            motor(&self.left_keymap, MotorId::Left)?,
            motor(&self.right_keymap, MotorId::Right)?,
        ))
    }

    fn controller(&self) -> Result<SerialController<Box<dyn serialport::SerialPort>>, BoxError> {
        info!("Opening serial port {}...", self.port);
        Ok(SerialController::open(&self.port, self.baud, SERIAL_TIMEOUT)?)
    }
}

/// Prints lines instead of sending them
struct StdoutSink;

impl CommandSink for StdoutSink {
    fn send(&mut self, line: &str) -> kinetic_endpoint::host::serial::Result<()> {
        println!("{}", line);
        Ok(())
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    match cli.command {
        Cmd::Serve {
            port,
            baud,
            loop_hz,
            pins,
            json,
        } => {
            let pins = match pins {
                Some(path) => PinMap::from_json(&std::fs::read_to_string(path)?)?,
                None => PinMap::default(),
            };
            runtime::run(ServeOptions {
                port,
                baud_rate: baud,
                loop_hz,
                pins,
                json,
            })
            .await?;
        }
        Cmd::Send { port, baud, lines } => {
            let mut controller = SerialController::open(&port, baud, SERIAL_TIMEOUT)?;
            for line in &lines {
                controller.send(line)?;
            }
            info!("Sent {} lines", lines.len());
        }
        Cmd::Drive {
            host,
            action,
            speed,
            dry_run,
        } => {
            let mut drive = host.drive_train()?;
            if dry_run {
                action.apply(&mut drive, &mut StdoutSink, speed)?;
            } else {
                let mut controller = host.controller()?;
                action.apply(&mut drive, &mut controller, speed)?;
            }
        }
        Cmd::Teleop { host } => {
            let mut drive = host.drive_train()?;
            let mut controller = host.controller()?;
            teleop::run(&mut drive, &mut controller)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug for per-line and per-pin detail)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
