use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Errors from parsing a polling interval such as `1m30s`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("duration {0:?} is too large")]
    Overflow(String),
    #[error("duration must be greater than zero: {0:?}")]
    NotPositive(String),
}

/// Parses a duration string made of decimal numbers with unit suffixes.
///
/// Accepts the same grammar as the Go duration syntax: an optional sign then
/// one or more `<number><unit>` components, where the number may carry a
/// fraction (`1.5h`) and the unit is one of `ns`, `us` (`µs`), `ms`, `s`, `m`,
/// `h`. Components add up, so `1h30m` is ninety minutes.
///
/// Only strictly positive durations are returned; `0`, `0s`, and negative
/// values are rejected because they cannot drive a ticker.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gator::util::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert!(parse_duration("10").is_err());
/// assert!(parse_duration("-1s").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let (negative, mut rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    if rest == "0" {
        return Err(DurationError::NotPositive(input.to_string()));
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(stripped) => {
                let frac_len = stripped.bytes().take_while(u8::is_ascii_digit).count();
                stripped.split_at(frac_len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_len);
        let unit_nanos = unit_in_nanos(unit).ok_or_else(|| {
            if unit.is_empty() {
                DurationError::MissingUnit(input.to_string())
            } else {
                DurationError::UnknownUnit {
                    unit: unit.to_string(),
                    input: input.to_string(),
                }
            }
        })?;

        if !int_part.is_empty() {
            let value: u128 = int_part.parse().map_err(|_| overflow())?;
            let nanos = value.checked_mul(unit_nanos).ok_or_else(overflow)?;
            total = total.checked_add(nanos).ok_or_else(overflow)?;
        }
        if !frac_part.is_empty() {
            // Digits past nanosecond precision of the largest unit cannot matter
            let digits = &frac_part[..frac_part.len().min(18)];
            let value: u128 = digits.parse().map_err(|_| overflow())?;
            let scale = 10u128.pow(digits.len() as u32);
            total = total
                .checked_add(value * unit_nanos / scale)
                .ok_or_else(overflow)?;
        }
        if total > i64::MAX as u128 {
            return Err(overflow());
        }

        rest = next;
    }

    if negative || total == 0 {
        return Err(DurationError::NotPositive(input.to_string()));
    }

    Ok(Duration::from_nanos(total as u64))
}

fn unit_in_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Formats a duration the way `parse_duration` reads it: `1m30s`, `1h0m0s`, `250ms`.
pub fn format_duration(d: Duration) -> String {
    let total_nanos = d.as_nanos();
    if total_nanos == 0 {
        return "0s".to_string();
    }
    if total_nanos < NANOS_PER_SEC {
        return if total_nanos % 1_000_000 == 0 {
            format!("{}ms", total_nanos / 1_000_000)
        } else if total_nanos % 1_000 == 0 {
            format!("{}µs", total_nanos / 1_000)
        } else {
            format!("{}ns", total_nanos)
        };
    }

    let secs = d.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut seconds_str = seconds.to_string();
    let subsec = d.subsec_nanos();
    if subsec > 0 {
        let frac = format!("{:09}", subsec);
        seconds_str.push('.');
        seconds_str.push_str(frac.trim_end_matches('0'));
    }

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds_str}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds_str}s")
    } else {
        format!("{seconds_str}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compound_units() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2h45m10s").unwrap(), Duration::from_secs(9910));
        assert_eq!(parse_duration("+5s").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_fractional_and_small_units() {
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1.s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("300us").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("300µs").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("42ns").unwrap(), Duration::from_nanos(42));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert_eq!(
            parse_duration("30"),
            Err(DurationError::MissingUnit("30".into()))
        );
        assert_eq!(
            parse_duration("1d"),
            Err(DurationError::UnknownUnit {
                unit: "d".into(),
                input: "1d".into()
            })
        );
        assert!(matches!(parse_duration("abc"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("1m.s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-"), Err(DurationError::Invalid(_))));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(parse_duration("0"), Err(DurationError::NotPositive(_))));
        assert!(matches!(parse_duration("0s"), Err(DurationError::NotPositive(_))));
        assert!(matches!(parse_duration("-10s"), Err(DurationError::NotPositive(_))));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            parse_duration("9999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    proptest! {
        #[test]
        fn prop_hms_components_add_up(h in 0u64..1000, m in 0u64..60, s in 1u64..60) {
            let parsed = parse_duration(&format!("{h}h{m}m{s}s")).unwrap();
            prop_assert_eq!(parsed, Duration::from_secs(h * 3600 + m * 60 + s));
        }

        #[test]
        fn prop_never_panics(input in "\\PC{0,16}") {
            let _ = parse_duration(&input);
        }
    }
}
