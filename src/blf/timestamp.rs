//! Calendar timestamp conversion for the file header.
//!
//! BLF stores the stream start/stop instants as Vector's spin on Windows
//! `SYSTEMTIME`: eight 16-bit calendar fields. Conversion from a nanosecond
//! epoch value is pure UTC expansion, with one guard: values whose whole
//! seconds land before 1990 are treated as a relative or uninitialized
//! clock, not wall time, and come out all-zero.

use chrono::{DateTime, Datelike, Timelike, Utc};

// 1990-01-01T00:00:00Z. Anything earlier is clearly not a real capture date.
const EPOCH_FLOOR_SECS: i64 = 631_152_000;

/// Calendar timestamp embedded in the file header (16 bytes on disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemTime {
    pub year: u16,
    /// 1-based month.
    pub month: u16,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    pub isoweekday: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: u16,
}

impl SystemTime {
    /// The all-zero value used for implausible or absent timestamps.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Expands a nanoseconds-since-Unix-epoch value into UTC calendar
    /// fields.
    ///
    /// Returns [`SystemTime::zeroed`] when the value, taken as whole
    /// seconds, falls before 1990 - such inputs are almost certainly a
    /// monotonic or boot-relative clock rather than wall time.
    pub fn from_epoch_ns(timestamp_ns: u64) -> Self {
        let secs = (timestamp_ns / 1_000_000_000) as i64;
        if secs < EPOCH_FLOOR_SECS {
            return Self::zeroed();
        }
        let Some(utc) = DateTime::<Utc>::from_timestamp(secs, 0) else {
            return Self::zeroed();
        };

        Self {
            year: utc.year() as u16,
            month: utc.month() as u16,
            isoweekday: utc.weekday().number_from_monday() as u16,
            day: utc.day() as u16,
            hour: utc.hour() as u16,
            minute: utc.minute() as u16,
            second: utc.second() as u16,
            millisecond: ((timestamp_ns / 1_000_000) % 1_000) as u16,
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for field in [
            self.year,
            self.month,
            self.isoweekday,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.millisecond,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
    }
}
