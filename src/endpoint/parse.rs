// Numeric payload parsing for speed lines

/// Leading-integer parse with C `atoi` rules: skip leading whitespace
/// (space, `\t`, `\n`, VT, FF, `\r`),
/// optional sign, then decimal digits up to the first non-digit.
/// No digits gives 0. Saturates instead of overflowing.
pub fn parse_leading_int(line: &[u8]) -> i32 {
    let mut rest = line;
    while let [first, tail @ ..] = rest {
        if matches!(first, b' ' | b'\t'..=b'\r') {
            rest = tail;
        } else {
            break;
        }
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    // Accumulate as negative so i32::MIN is reachable
    let mut value: i32 = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i32::from(b - b'0');
        value = value.saturating_mul(10).saturating_sub(digit);
    }

    if negative {
        value
    } else {
        value.saturating_neg()
    }
}

/// Clamp a parsed value into the 8-bit PWM duty range
pub fn duty_from_value(value: i32) -> u8 {
    value.clamp(0, i32::from(u8::MAX)) as u8
}

/// Interpret a whole line as a PWM duty
pub fn parse_duty(line: &[u8]) -> u8 {
    duty_from_value(parse_leading_int(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_leading_int(b"200"), 200);
        assert_eq!(parse_leading_int(b"0"), 0);
        assert_eq!(parse_leading_int(b"007"), 7);
    }

    #[test]
    fn test_leading_digits_only() {
        assert_eq!(parse_leading_int(b"128abc"), 128);
        assert_eq!(parse_leading_int(b"12 34"), 12);
        assert_eq!(parse_leading_int(b"99\r"), 99);
    }

    #[test]
    fn test_non_numeric_is_zero() {
        assert_eq!(parse_leading_int(b""), 0);
        assert_eq!(parse_leading_int(b"MOTOR_FORWARD MotorLeft"), 0);
        assert_eq!(parse_leading_int(b"-"), 0);
        assert_eq!(parse_leading_int(b"x12"), 0);
    }

    #[test]
    fn test_whitespace_and_sign() {
        assert_eq!(parse_leading_int(b"  \t42"), 42);
        assert_eq!(parse_leading_int(b"\x0b200"), 200);
        assert_eq!(parse_leading_int(b"\x0c\r\n7"), 7);
        assert_eq!(parse_leading_int(b"+17"), 17);
        assert_eq!(parse_leading_int(b"-17"), -17);
        assert_eq!(parse_leading_int(b"- 17"), 0);
    }

    #[test]
    fn test_saturates() {
        assert_eq!(parse_leading_int(b"99999999999999"), i32::MAX);
        assert_eq!(parse_leading_int(b"-99999999999999"), i32::MIN);
        assert_eq!(parse_leading_int(b"-2147483648"), i32::MIN);
    }

    #[test]
    fn test_duty_clamp() {
        assert_eq!(parse_duty(b"200"), 200);
        assert_eq!(parse_duty(b"255"), 255);
        assert_eq!(parse_duty(b"256"), 255);
        assert_eq!(parse_duty(b"-5"), 0);
        assert_eq!(parse_duty(b"hello"), 0);
    }
}
