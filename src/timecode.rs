/*!
 * Timecode values and offset arithmetic.
 *
 * A `Timecode` is kept as separate hour/minute/second/millisecond fields.
 * Shifting by an offset normalizes the fields as a mixed-radix counter
 * (1000 → 60 → 60 → unbounded hours). A shift that ends before zero is
 * reported as `None`, which callers treat as "drop this caption".
 */

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TimecodeError;

// [HH:]MM:SS(.|,)mmm, hours of any width, fraction of 1-3 digits
static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2})(?:[.,](\d{1,3}))?$").expect("valid timecode regex")
});

/// A non-negative timestamp split into its components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub millis: u16,
}

impl Timecode {
    /// Build a timecode from components; minutes, seconds and millis must already be in range
    pub fn new(hours: u64, minutes: u8, seconds: u8, millis: u16) -> Self {
        debug_assert!(minutes < 60 && seconds < 60 && millis < 1000);
        Self { hours, minutes, seconds, millis }
    }

    /// Build a timecode from an absolute millisecond count
    pub fn from_millis(total_ms: u64) -> Self {
        Self {
            hours: total_ms / 3_600_000,
            minutes: ((total_ms % 3_600_000) / 60_000) as u8,
            seconds: ((total_ms % 60_000) / 1_000) as u8,
            millis: (total_ms % 1_000) as u16,
        }
    }

    /// Absolute value in milliseconds; `u128` holds any hour count
    pub fn as_millis(&self) -> u128 {
        u128::from(self.hours) * 3_600_000
            + u128::from(self.minutes) * 60_000
            + u128::from(self.seconds) * 1_000
            + u128::from(self.millis)
    }

    /// Sum of two timecodes, `None` when the hours no longer fit
    pub fn checked_add(&self, other: Timecode) -> Option<Timecode> {
        let total = self.as_millis() + other.as_millis();
        Some(Timecode {
            hours: u64::try_from(total / 3_600_000).ok()?,
            minutes: ((total % 3_600_000) / 60_000) as u8,
            seconds: ((total % 60_000) / 1_000) as u8,
            millis: (total % 1_000) as u16,
        })
    }

    /// Absolute value in seconds, used for cutoff comparisons
    pub fn total_seconds(&self) -> f64 {
        self.hours as f64 * 3600.0
            + f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.millis) / 1000.0
    }

    /// Shift by `offset_ms` and renormalize.
    ///
    /// Returns `None` when any component is still negative after carrying,
    /// i.e. the shifted instant would precede zero.
    pub fn shift(&self, offset_ms: i64) -> Option<Timecode> {
        let (hours, minutes, seconds, millis) = normalize(
            i128::from(self.hours),
            i128::from(self.minutes),
            i128::from(self.seconds),
            i128::from(self.millis) + i128::from(offset_ms),
        );

        if hours < 0 || minutes < 0 || seconds < 0 || millis < 0 {
            return None;
        }

        Some(Timecode {
            hours: u64::try_from(hours).ok()?,
            minutes: minutes as u8,
            seconds: seconds as u8,
            millis: millis as u16,
        })
    }

    /// Render with a custom separator before the milliseconds (`.` for WebVTT/TTML, `,` for SRT)
    pub fn format_with(&self, millis_separator: char) -> String {
        format!(
            "{:02}:{:02}:{:02}{}{:03}",
            self.hours, self.minutes, self.seconds, millis_separator, self.millis
        )
    }
}

/// Carry/borrow across ms → s → min → h; hours is left unbounded and may stay negative
fn normalize(hours: i128, minutes: i128, seconds: i128, millis: i128) -> (i128, i128, i128, i128) {
    let seconds = seconds + millis.div_euclid(1000);
    let millis = millis.rem_euclid(1000);

    let minutes = minutes + seconds.div_euclid(60);
    let seconds = seconds.rem_euclid(60);

    let hours = hours + minutes.div_euclid(60);
    let minutes = minutes.rem_euclid(60);

    (hours, minutes, seconds, millis)
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with('.'))
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = TIMECODE_REGEX
            .captures(trimmed)
            .ok_or_else(|| TimecodeError::Format(s.to_string()))?;

        let hours: u64 = match caps.get(1) {
            Some(m) => m.as_str().parse().map_err(|_| TimecodeError::OutOfRange(s.to_string()))?,
            None => 0,
        };
        let minutes: u8 = caps[2].parse().map_err(|_| TimecodeError::Format(s.to_string()))?;
        let seconds: u8 = caps[3].parse().map_err(|_| TimecodeError::Format(s.to_string()))?;

        // A short fraction such as ".5" means 500 ms
        let millis: u16 = match caps.get(4) {
            Some(m) => {
                let digits = m.as_str();
                let value: u16 = digits.parse().map_err(|_| TimecodeError::Format(s.to_string()))?;
                value * 10u16.pow(3 - digits.len() as u32)
            }
            None => 0,
        };

        if minutes >= 60 || seconds >= 60 {
            return Err(TimecodeError::OutOfRange(s.to_string()));
        }

        Ok(Timecode { hours, minutes, seconds, millis })
    }
}

/// Shift a textual timecode by `offset_ms`.
///
/// Returns the normalized `HH:MM:SS.mmm` string together with the shifted
/// value in seconds, or `(None, 0.0)` when the shifted instant is negative.
pub fn offset_timecode(timecode: &str, offset_ms: i64) -> Result<(Option<String>, f64), TimecodeError> {
    let parsed: Timecode = timecode.parse()?;
    Ok(match parsed.shift(offset_ms) {
        Some(shifted) => (Some(shifted.to_string()), shifted.total_seconds()),
        None => (None, 0.0),
    })
}
