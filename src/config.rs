// Serial link, line framing, loop rate, pin assignments
use std::time::Duration;

// Serial link speed expected by the endpoint
pub const BAUD_RATE: u32 = 9600;

// Read timeout for the serial port (only bounds a single poll)
pub const SERIAL_TIMEOUT: Duration = Duration::from_millis(10);

// Default serial port for the endpoint / host client
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

// Polling loop frequency for `serve`
pub const LOOP_HZ: u64 = 200;

// Line accumulator size, excess bytes before a newline are dropped
pub const LINE_CAPACITY: usize = 64;

// Line delimiter (LF). CR is not special.
pub const LINE_DELIMITER: u8 = 0x0A;

// Pin assignments (Arduino numbering)
pub const LEFT_PWM_PIN: u8 = 3;
pub const LEFT_DIRECTION_PIN: u8 = 2;
pub const LEFT_BRAKE_PIN: u8 = 4;
pub const RIGHT_PWM_PIN: u8 = 9;
pub const RIGHT_DIRECTION_PIN: u8 = 5;
pub const RIGHT_BRAKE_PIN: u8 = 6;
