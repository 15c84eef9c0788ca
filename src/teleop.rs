// Keyboard teleop: W/S forward/back, A/D spin, space stop, R/F speed, Q quit
use std::time::{Duration, Instant};

use clap::ValueEnum;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::info;

use crate::host::{CommandSink, DualMotor};

const SPEEDS: [f64; 3] = [0.25, 0.5, 1.0]; // fraction of full duty
const SPEED_LABELS: [&str; 3] = ["LOW", "MED", "HIGH"];
const POLL_INTERVAL: Duration = Duration::from_millis(20);
// Brake after this much time with no input. Must outlast the terminal's
// key-repeat delay (typically ~500ms) so a held key does not brake between
// the first press and the first repeat.
const INPUT_TIMEOUT: Duration = Duration::from_millis(750);

/// Drive train actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriveAction {
    Forward,
    Backward,
    Clockwise,
    Counterclockwise,
    Stop,
}

impl DriveAction {
    /// Send the commands for this action
    pub fn apply<S: CommandSink>(
        self,
        drive: &mut DualMotor,
        sink: &mut S,
        speed: f64,
    ) -> crate::host::serial::Result<()> {
        match self {
            DriveAction::Forward => drive.forward(sink, speed),
            DriveAction::Backward => drive.backward(sink, speed),
            DriveAction::Clockwise => drive.clockwise(sink, speed),
            DriveAction::Counterclockwise => drive.counterclockwise(sink, speed),
            DriveAction::Stop => drive.stop(sink),
        }
    }
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIntent {
    Drive(DriveAction),
    SpeedUp,
    SpeedDown,
    Quit,
}

pub fn key_intent(code: KeyCode) -> Option<KeyIntent> {
    match code {
        KeyCode::Char('w') => Some(KeyIntent::Drive(DriveAction::Forward)),
        KeyCode::Char('s') => Some(KeyIntent::Drive(DriveAction::Backward)),
        KeyCode::Char('a') => Some(KeyIntent::Drive(DriveAction::Counterclockwise)),
        KeyCode::Char('d') => Some(KeyIntent::Drive(DriveAction::Clockwise)),
        KeyCode::Char(' ') => Some(KeyIntent::Drive(DriveAction::Stop)),
        KeyCode::Char('r') => Some(KeyIntent::SpeedUp),
        KeyCode::Char('f') => Some(KeyIntent::SpeedDown),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyIntent::Quit),
        _ => None,
    }
}

/// Run keyboard teleop until Q/Esc. Always leaves the motors braked.
pub fn run<S: CommandSink>(
    drive: &mut DualMotor,
    sink: &mut S,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Controls: W/S=forward/back, A/D=spin, space=stop, R/F=speed, Q=quit");
    info!("Speed: {}", SPEED_LABELS[0]);

    enable_raw_mode()?;
    let result = run_teleop(drive, sink);
    finish(result, drive, sink, disable_raw_mode)
}

/// Brake, then restore the terminal. The first error wins, but the brake
/// is sent whatever happened before it.
fn finish<S, R>(
    result: Result<(), Box<dyn std::error::Error + Send + Sync>>,
    drive: &mut DualMotor,
    sink: &mut S,
    restore_terminal: R,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: CommandSink,
    R: FnOnce() -> std::io::Result<()>,
{
    let stopped = drive.stop(sink);
    let restored = restore_terminal();
    result?;
    stopped?;
    restored?;
    Ok(())
}

/// Whether the last movement key is too old to keep driving
fn input_expired(since_input: Duration) -> bool {
    since_input > INPUT_TIMEOUT
}

fn run_teleop<S: CommandSink>(
    drive: &mut DualMotor,
    sink: &mut S,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;
    let mut wanted = DriveAction::Stop;
    // What the endpoint was last told (action, speed index)
    let mut sent: Option<(DriveAction, usize)> = None;
    let mut last_movement_input = Instant::now();

    loop {
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match key_intent(code) {
                    Some(KeyIntent::Drive(action)) if pressed => {
                        wanted = action;
                        last_movement_input = Instant::now();
                    }
                    Some(KeyIntent::SpeedUp) if pressed => {
                        speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                        info!("Speed: {}", SPEED_LABELS[speed_idx]);
                    }
                    Some(KeyIntent::SpeedDown) if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        info!("Speed: {}", SPEED_LABELS[speed_idx]);
                    }
                    Some(KeyIntent::Quit) if pressed => break,
                    _ => {}
                }
            }
        }

        if input_expired(last_movement_input.elapsed()) {
            wanted = DriveAction::Stop;
        }

        // The link is slow, only send on change
        if sent != Some((wanted, speed_idx)) {
            wanted.apply(drive, sink, SPEEDS[speed_idx])?;
            sent = Some((wanted, speed_idx));
        }
    }

    Ok(())
}
