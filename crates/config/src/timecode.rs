//! `HH:MM:SS` timecodes as printed by HandBrake scans and accepted on the command line

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Error returned when a timecode string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimecodeError {
    input: String,
}

impl fmt::Display for TimecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid timecode '{}', expected HH:MM:SS", self.input)
    }
}

impl std::error::Error for TimecodeError {}

/// A duration expressed as hours, minutes and seconds.
///
/// Ordering and equality use the total number of seconds, so `00:60:00`
/// compares equal to `01:00:00`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timecode {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl Timecode {
    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self::new(0, minutes, 0)
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Total length in seconds
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimecodeError {
            input: s.to_string(),
        };

        let mut fields = s.trim().split(':');
        let mut next = || -> Result<u32, TimecodeError> {
            let field = fields.next().ok_or_else(err)?;
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            field.parse().map_err(|_| err())
        };

        let hours = next()?;
        let minutes = next()?;
        let seconds = next()?;

        if fields.next().is_some() {
            return Err(err());
        }

        Ok(Self::new(hours, minutes, seconds))
    }
}

impl TryFrom<String> for Timecode {
    type Error = TimecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timecode> for String {
    fn from(value: Timecode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

impl PartialEq for Timecode {
    fn eq(&self, other: &Self) -> bool {
        self.total_seconds() == other.total_seconds()
    }
}

impl Eq for Timecode {}

impl PartialOrd for Timecode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timecode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_seconds().cmp(&other.total_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_scan_format() {
        let tc: Timecode = "00:41:07".parse().unwrap();
        assert_eq!(tc.hours(), 0);
        assert_eq!(tc.minutes(), 41);
        assert_eq!(tc.seconds(), 7);
        assert_eq!(tc.total_seconds(), 41 * 60 + 7);
    }

    #[test]
    fn test_parse_relaxed_digit_counts() {
        assert_eq!("1:5:0".parse::<Timecode>().unwrap(), Timecode::new(1, 5, 0));
        assert_eq!(" 00:40:00 ".parse::<Timecode>().unwrap(), Timecode::from_minutes(40));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let malformed = [
            "", "40", "00:40", "00:40:00:00", "aa:bb:cc", "00:-1:00", "00::00", "+1:00:00",
        ];
        for bad in malformed {
            assert!(bad.parse::<Timecode>().is_err(), "'{}' should not parse", bad);
        }
    }

    #[test]
    fn test_error_message_names_input() {
        let err = "abc".parse::<Timecode>().unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_display_zero_pads() {
        assert_eq!(Timecode::new(1, 2, 3).to_string(), "01:02:03");
        assert_eq!(Timecode::new(100, 0, 0).to_string(), "100:00:00");
    }

    #[test]
    fn test_unnormalized_fields_compare_by_total() {
        assert_eq!(Timecode::new(0, 60, 0), Timecode::new(1, 0, 0));
        assert!(Timecode::new(0, 59, 60) >= Timecode::new(1, 0, 0));
        assert!(Timecode::new(0, 39, 59) < Timecode::from_minutes(40));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_ordering_matches_total_seconds(
            a in (0u32..100, 0u32..100, 0u32..100),
            b in (0u32..100, 0u32..100, 0u32..100),
        ) {
            let ta = Timecode::new(a.0, a.1, a.2);
            let tb = Timecode::new(b.0, b.1, b.2);
            prop_assert_eq!(ta.cmp(&tb), ta.total_seconds().cmp(&tb.total_seconds()));
        }

        #[test]
        fn prop_display_parses_back(h in 0u32..1000, m in 0u32..60, s in 0u32..60) {
            let tc = Timecode::new(h, m, s);
            let parsed: Timecode = tc.to_string().parse().unwrap();
            prop_assert_eq!(parsed.hours(), h);
            prop_assert_eq!(parsed.minutes(), m);
            prop_assert_eq!(parsed.seconds(), s);
        }
    }
}
