// Command interpreter: bytes in, motor actuations out
//
// Bytes accumulate in a 64-byte line buffer until LF. A completed line is
// matched against the command table; `MOTOR_SPEED <motor>` arms that motor's
// pending-speed flag and the next completed line, whatever it says, is read
// as the PWM duty. Nothing is ever reported back to the sender.

use tracing::debug;

use super::actuator::MotorActuator;
use super::line::LineBuffer;
use super::parse::parse_duty;
use crate::config::LINE_DELIMITER;
use crate::messages::{Actuation, Command, MotorId, PinLevel, Verb};

pub struct Interpreter<A: MotorActuator> {
    line: LineBuffer,
    speed_pending: [bool; 2],
    actuator: A,
    last_dispatch: Vec<Actuation>,
    lines_dispatched: u64,
}

impl<A: MotorActuator> Interpreter<A> {
    pub fn new(actuator: A) -> Self {
        Self {
            line: LineBuffer::new(),
            speed_pending: [false; 2],
            actuator,
            last_dispatch: Vec::new(),
            lines_dispatched: 0,
        }
    }

    /// Feed one byte from the link.
    ///
    /// Returns the actuations issued for the completed line when `byte` is the
    /// delimiter, `None` while a line is still accumulating.
    pub fn feed(&mut self, byte: u8) -> Option<&[Actuation]> {
        if byte == LINE_DELIMITER {
            self.dispatch();
            return Some(self.last_dispatch.as_slice());
        }

        if !self.line.push(byte) && self.line.dropped() == 1 {
            debug!("Line buffer full, dropping bytes until newline");
        }
        None
    }

    /// Feed a run of bytes, returning how many lines were completed
    pub fn feed_all(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.feed(b).is_some()).count()
    }

    fn dispatch(&mut self) {
        // Flags armed by earlier lines; this line's own MOTOR_SPEED arms the next one
        let armed = std::mem::take(&mut self.speed_pending);
        // A NUL ends the line's text, anything after it is ignored
        let text = self.line.text();
        let command = Command::parse(text);
        self.last_dispatch.clear();

        match command {
            Some(command) => debug!("Dispatching: {}", command),
            None => debug!(
                "Unrecognised line: {:?}",
                String::from_utf8_lossy(text)
            ),
        }

        for motor in MotorId::ALL {
            if let Some(command) = command.filter(|c| c.motor == motor) {
                match command.verb {
                    Verb::BrakeHold => self.emit(Actuation::Brake {
                        motor,
                        level: PinLevel::High,
                    }),
                    Verb::BrakeRelease => self.emit(Actuation::Brake {
                        motor,
                        level: PinLevel::Low,
                    }),
                    Verb::Forward => self.emit(Actuation::Direction {
                        motor,
                        level: PinLevel::High,
                    }),
                    Verb::Backward => self.emit(Actuation::Direction {
                        motor,
                        level: PinLevel::Low,
                    }),
                    Verb::Speed => self.speed_pending[motor.index()] = true,
                }
            }

            if armed[motor.index()] {
                let duty = parse_duty(self.line.text());
                self.emit(Actuation::Speed { motor, duty });
            }
        }

        self.line.clear();
        self.lines_dispatched += 1;
    }

    fn emit(&mut self, actuation: Actuation) {
        self.actuator.apply(actuation);
        self.last_dispatch.push(actuation);
    }

    /// Actuations issued by the most recently completed line
    pub fn last_dispatch(&self) -> &[Actuation] {
        &self.last_dispatch
    }

    /// Whether the next completed line will be read as `motor`'s speed
    pub fn speed_pending(&self, motor: MotorId) -> bool {
        self.speed_pending[motor.index()]
    }

    /// Bytes accumulated since the last newline
    pub fn pending_line(&self) -> &LineBuffer {
        &self.line
    }

    pub fn lines_dispatched(&self) -> u64 {
        self.lines_dispatched
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LINE_CAPACITY;
    use crate::endpoint::actuator::{PinActuator, PinMap, RecordingActuator, SimulatedPins};

    fn recording() -> Interpreter<RecordingActuator> {
        Interpreter::new(RecordingActuator::new())
    }

    fn send(interp: &mut Interpreter<RecordingActuator>, line: &str) -> Vec<Actuation> {
        interp.feed_all(line.as_bytes());
        let dispatched = interp.feed(b'\n').map(<[Actuation]>::to_vec);
        assert_eq!(dispatched.as_deref(), Some(interp.last_dispatch()));
        interp.actuator_mut().drain()
    }

    #[test]
    fn test_each_command_single_write() {
        let cases: [(&str, fn(MotorId) -> Actuation); 4] = [
            ("MOTOR_BRAKE_HOLD", |m| Actuation::Brake { motor: m, level: PinLevel::High }),
            ("MOTOR_BRAKE_RELEASE", |m| Actuation::Brake { motor: m, level: PinLevel::Low }),
            ("MOTOR_FORWARD", |m| Actuation::Direction { motor: m, level: PinLevel::High }),
            ("MOTOR_BACKWARD", |m| Actuation::Direction { motor: m, level: PinLevel::Low }),
        ];

        for motor in MotorId::ALL {
            for (verb, expected) in cases {
                let mut interp = recording();
                let calls = send(&mut interp, &format!("{} {}", verb, motor));
                assert_eq!(calls, vec![expected(motor)], "{} {}", verb, motor);
            }
        }
    }

    #[test]
    fn test_speed_line_only_arms() {
        let mut interp = recording();
        let calls = send(&mut interp, "MOTOR_SPEED MotorLeft");
        assert!(calls.is_empty());
        assert!(interp.speed_pending(MotorId::Left));
        assert!(!interp.speed_pending(MotorId::Right));
    }

    #[test]
    fn test_speed_value_on_next_line() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorLeft");
        let calls = send(&mut interp, "200");
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Left,
                duty: 200
            }]
        );
        assert!(!interp.speed_pending(MotorId::Left));

        // Flag is gone, a later number does nothing
        assert!(send(&mut interp, "100").is_empty());
    }

    #[test]
    fn test_command_after_speed_fires_both() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorLeft");
        let calls = send(&mut interp, "MOTOR_FORWARD MotorLeft");
        assert_eq!(
            calls,
            vec![
                Actuation::Direction {
                    motor: MotorId::Left,
                    level: PinLevel::High
                },
                Actuation::Speed {
                    motor: MotorId::Left,
                    duty: 0
                },
            ]
        );
        assert!(!interp.speed_pending(MotorId::Left));
    }

    #[test]
    fn test_other_motor_command_consumes_speed() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorLeft");
        let calls = send(&mut interp, "MOTOR_BRAKE_HOLD MotorRight");
        assert_eq!(
            calls,
            vec![
                Actuation::Speed {
                    motor: MotorId::Left,
                    duty: 0
                },
                Actuation::Brake {
                    motor: MotorId::Right,
                    level: PinLevel::High
                },
            ]
        );
    }

    #[test]
    fn test_speed_after_speed_rearms() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorRight");
        let calls = send(&mut interp, "MOTOR_SPEED MotorRight");
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Right,
                duty: 0
            }]
        );
        assert!(interp.speed_pending(MotorId::Right));
        let calls = send(&mut interp, "64");
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Right,
                duty: 64
            }]
        );
    }

    #[test]
    fn test_both_motors_armed() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorLeft");
        // Consumes Left (as 0) and arms Right
        let calls = send(&mut interp, "MOTOR_SPEED MotorRight");
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Left,
                duty: 0
            }]
        );
        let calls = send(&mut interp, "150");
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Right,
                duty: 150
            }]
        );
    }

    #[test]
    fn test_unrecognised_lines_ignored() {
        let mut interp = recording();
        for line in ["", "hello", "MOTOR_FORWARD", "MOTOR_FORWARD MotorMiddle", "200"] {
            assert!(send(&mut interp, line).is_empty(), "{:?}", line);
        }
        assert_eq!(interp.lines_dispatched(), 5);
    }

    #[test]
    fn test_carriage_return_breaks_match() {
        let mut interp = recording();
        assert!(send(&mut interp, "MOTOR_FORWARD MotorLeft\r").is_empty());
    }

    #[test]
    fn test_nul_terminates_line() {
        let mut interp = recording();
        interp.feed_all(b"MOTOR_FORWARD MotorLeft\0junk\n");
        assert_eq!(
            interp.actuator_mut().drain(),
            vec![Actuation::Direction {
                motor: MotorId::Left,
                level: PinLevel::High
            }]
        );

        // Speed value is also read only up to the NUL
        interp.feed_all(b"MOTOR_SPEED MotorRight\n");
        interp.feed_all(b"\x00150\n");
        assert_eq!(
            interp.actuator_mut().drain(),
            vec![Actuation::Speed {
                motor: MotorId::Right,
                duty: 0
            }]
        );

        interp.feed_all(b"MOTOR_SPEED MotorRight\n90\x007\n");
        assert_eq!(
            interp.actuator_mut().drain(),
            vec![Actuation::Speed {
                motor: MotorId::Right,
                duty: 90
            }]
        );
    }

    #[test]
    fn test_overflow_truncates() {
        let mut interp = recording();
        let long = "A".repeat(LINE_CAPACITY + 10);
        interp.feed_all(long.as_bytes());
        assert_eq!(interp.pending_line().len(), LINE_CAPACITY);
        assert_eq!(interp.pending_line().dropped(), 10);
        assert!(interp.pending_line().as_bytes().iter().all(|&b| b == b'A'));

        // Still evaluated once the newline arrives
        assert_eq!(interp.feed(b'\n'), Some(&[][..]));
        assert_eq!(interp.lines_dispatched(), 1);
        assert!(interp.pending_line().is_empty());
    }

    #[test]
    fn test_overflow_keeps_prefix_command() {
        // A command padded past capacity no longer matches: the retained
        // 64 bytes are the command plus padding
        let mut interp = recording();
        let mut line = String::from("MOTOR_FORWARD MotorLeft");
        line.push_str(&" ".repeat(LINE_CAPACITY));
        assert!(send(&mut interp, &line).is_empty());

        // Dropped bytes do not leak into the next line
        let calls = send(&mut interp, "MOTOR_BACKWARD MotorLeft");
        assert_eq!(
            calls,
            vec![Actuation::Direction {
                motor: MotorId::Left,
                level: PinLevel::Low
            }]
        );
    }

    #[test]
    fn test_buffer_cleared_after_line() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_BRAKE_HOLD MotorLeft");
        assert!(interp.pending_line().storage().iter().all(|&b| b == 0));
        assert!(interp.pending_line().is_empty());

        // Empty line must not replay the previous command
        assert!(send(&mut interp, "").is_empty());
        assert!(interp.last_dispatch().is_empty());
    }

    #[test]
    fn test_speed_value_may_overflow_buffer() {
        let mut interp = recording();
        send(&mut interp, "MOTOR_SPEED MotorLeft");
        let mut line = String::from("42");
        line.push_str(&"x".repeat(LINE_CAPACITY * 2));
        let calls = send(&mut interp, &line);
        assert_eq!(
            calls,
            vec![Actuation::Speed {
                motor: MotorId::Left,
                duty: 42
            }]
        );
    }

    #[test]
    fn test_brake_hold_then_release_on_pins() {
        let mut interp = Interpreter::new(PinActuator::new(PinMap::default(), SimulatedPins::new()));
        interp.feed_all(b"MOTOR_BRAKE_HOLD MotorLeft\n");
        assert_eq!(interp.actuator().writer().level(4), Some(PinLevel::High));
        interp.feed_all(b"MOTOR_BRAKE_RELEASE MotorLeft\n");
        assert_eq!(interp.actuator().writer().level(4), Some(PinLevel::Low));
        assert_eq!(interp.actuator().writer().writes(), 2);
    }

    #[test]
    fn test_speed_on_pins() {
        let mut interp = Interpreter::new(PinActuator::new(PinMap::default(), SimulatedPins::new()));
        assert_eq!(interp.feed_all(b"MOTOR_SPEED MotorLeft\n200\n"), 2);
        let pins = interp.actuator().writer();
        assert_eq!(pins.duty(3), Some(200));
        assert_eq!(pins.writes(), 1);
    }

    #[test]
    fn test_motors_independent() {
        let mut interp = Interpreter::new(PinActuator::new(PinMap::default(), SimulatedPins::new()));
        interp.feed_all(
            b"MOTOR_BRAKE_HOLD MotorRight\nMOTOR_FORWARD MotorRight\nMOTOR_SPEED MotorRight\n255\n",
        );
        let pins = interp.actuator().writer();
        let left = PinMap::default().pins(MotorId::Left);
        for pin in left.as_array() {
            assert_eq!(pins.state(pin), None, "left pin {} touched", pin);
        }
        assert_eq!(pins.level(6), Some(PinLevel::High));
        assert_eq!(pins.level(5), Some(PinLevel::High));
        assert_eq!(pins.duty(9), Some(255));

        interp.feed_all(b"MOTOR_BACKWARD MotorLeft\n");
        let pins = interp.actuator().writer();
        assert_eq!(pins.level(2), Some(PinLevel::Low));
        assert_eq!(pins.level(5), Some(PinLevel::High));
    }

    #[test]
    fn test_bytes_across_feeds() {
        let mut interp = recording();
        assert_eq!(interp.feed_all(b"MOTOR_FORW"), 0);
        assert_eq!(interp.feed_all(b"ARD MotorRight\nMOTOR_BA"), 1);
        assert_eq!(
            interp.actuator_mut().drain(),
            vec![Actuation::Direction {
                motor: MotorId::Right,
                level: PinLevel::High
            }]
        );
        assert_eq!(interp.pending_line().as_bytes(), b"MOTOR_BA");
    }
}
