//! Date and time literals (RFC 3339 as profiled by TOML).

#[cfg(test)]
#[path = "./time_tests.rs"]
mod tests;

use crate::{Error, ErrorKind, Span};
use std::fmt;
use std::str::FromStr;

/// A calendar date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    /// May be 60 to admit a leap second.
    pub second: u8,
    pub nanosecond: u32,
    /// Number of fractional-second digits to write, 0 for none. Inputs with
    /// more than nine digits are truncated to nanoseconds.
    pub precision: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeOffset {
    /// A suffix which, when applied to a time, denotes a UTC offset of 00:00;
    /// often spoken “Zulu” from the ICAO phonetic alphabet representation of the letter “Z”.
    /// RFC 3339 section 2
    Z,
    /// Offset between local time and UTC
    Custom { minutes: i16 },
}

/// Which of the four TOML date/time shapes a [`Datetime`] has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatetimeKind {
    /// `1979-05-27T07:32:00Z`
    OffsetDatetime,
    /// `1979-05-27T07:32:00`
    LocalDatetime,
    /// `1979-05-27`
    LocalDate,
    /// `07:32:00`
    LocalTime,
}

impl DatetimeKind {
    /// The name `toml-test` uses for this shape.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffsetDatetime => "datetime",
            Self::LocalDatetime => "datetime-local",
            Self::LocalDate => "date-local",
            Self::LocalTime => "time-local",
        }
    }
}

/// Container for temporal values of the TOML format, based on RFC 3339.
///
/// The fields are public so callers can build values for encoding. Not every
/// combination is a TOML literal: see [`Datetime::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Datetime {
    pub date: Option<Date>,
    pub time: Option<Time>,
    pub offset: Option<TimeOffset>,
}

pub(crate) fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: u16, month: u8) -> u8 {
    const DAYS: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[month as usize]
    }
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a run of digits that must be exactly `width` long.
    fn field(&mut self, width: usize) -> Option<u32> {
        let mut value = 0u32;
        let mut len = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            if len == width {
                return None;
            }
            value = value * 10 + (b - b'0') as u32;
            len += 1;
            self.pos += 1;
        }
        (len == width).then_some(value)
    }

    fn bounded(&mut self, width: usize, min: u32, max: u32) -> Option<u8> {
        let value = self.field(width)?;
        (value >= min && value <= max).then_some(value as u8)
    }

    fn date(&mut self) -> Option<Date> {
        let year = self.field(4)? as u16;
        if !self.eat(b'-') {
            return None;
        }
        let month = self.bounded(2, 1, 12)?;
        if !self.eat(b'-') {
            return None;
        }
        let day = self.bounded(2, 1, days_in_month(year, month) as u32)?;
        Some(Date { year, month, day })
    }

    fn time(&mut self) -> Option<Time> {
        let hour = self.bounded(2, 0, 23)?;
        if !self.eat(b':') {
            return None;
        }
        let minute = self.bounded(2, 0, 59)?;
        let mut time = Time {
            hour,
            minute,
            second: 0,
            nanosecond: 0,
            precision: 0,
        };
        if !self.eat(b':') {
            return Some(time);
        }
        time.second = self.bounded(2, 0, 60)?;
        if !self.eat(b'.') {
            return Some(time);
        }
        let mut digits = 0u8;
        let mut nanos = 0u32;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            if digits < 9 {
                nanos = nanos * 10 + (b - b'0') as u32;
                digits += 1;
            }
            self.pos += 1;
        }
        if digits == 0 {
            return None;
        }
        for _ in digits..9 {
            nanos *= 10;
        }
        time.nanosecond = nanos;
        time.precision = digits;
        Some(time)
    }

    fn offset(&mut self) -> Option<Option<TimeOffset>> {
        let sign: i16 = match self.peek() {
            Some(b'Z' | b'z') => {
                self.pos += 1;
                return Some(Some(TimeOffset::Z));
            }
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Some(None),
        };
        self.pos += 1;
        let hours = self.bounded(2, 0, 23)? as i16;
        if !self.eat(b':') {
            return None;
        }
        let minutes = self.bounded(2, 0, 59)? as i16;
        Some(Some(TimeOffset::Custom {
            minutes: sign * (hours * 60 + minutes),
        }))
    }
}

impl Datetime {
    /// Returns `true` when `input` starts like a date (`DDDD-`) or a time
    /// (`DD:`), so a failed [`Datetime::munch`] is a bad datetime rather than
    /// some other token.
    pub(crate) fn looks_like(input: &[u8]) -> bool {
        matches!(
            input,
            [a, b, c, d, b'-', ..] if [a, b, c, d].iter().all(|x| x.is_ascii_digit())
        ) || matches!(
            input,
            [a, b, b':', ..] if a.is_ascii_digit() && b.is_ascii_digit()
        )
    }

    /// Recognizes a date/time literal at the start of `input`, returning the
    /// number of bytes consumed. Trailing bytes are left for the caller.
    pub(crate) fn munch(input: &[u8]) -> Option<(usize, Datetime)> {
        let mut scan = Scanner { input, pos: 0 };
        let mut value = Datetime {
            date: None,
            time: None,
            offset: None,
        };

        match input {
            [_, _, b':', ..] => {
                value.time = Some(scan.time()?);
                // A local time never carries an offset.
                if matches!(scan.peek(), Some(b'Z' | b'z' | b'+' | b'-')) {
                    return None;
                }
                return Some((scan.pos, value));
            }
            [_, _, _, _, b'-', ..] => value.date = Some(scan.date()?),
            _ => return None,
        }

        match scan.peek() {
            Some(b'T' | b't') => scan.pos += 1,
            Some(b' ') if scan.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => scan.pos += 1,
            _ => return Some((scan.pos, value)),
        }
        value.time = Some(scan.time()?);
        value.offset = scan.offset()?;
        Some((scan.pos, value))
    }

    /// The TOML shape of this value, or `None` when the field combination
    /// has no TOML spelling.
    pub fn kind(&self) -> Option<DatetimeKind> {
        match (self.date, self.time, self.offset) {
            (Some(_), Some(_), Some(_)) => Some(DatetimeKind::OffsetDatetime),
            (Some(_), Some(_), None) => Some(DatetimeKind::LocalDatetime),
            (Some(_), None, None) => Some(DatetimeKind::LocalDate),
            (None, Some(_), None) => Some(DatetimeKind::LocalTime),
            _ => None,
        }
    }

    /// Returns `true` when every field is within the range a TOML literal can
    /// express, so that [`Display`](fmt::Display) output reads back equal.
    pub(crate) fn fields_in_range(&self) -> bool {
        if let Some(date) = &self.date {
            if date.year > 9999 || !(1..=12).contains(&date.month) {
                return false;
            }
            if date.day == 0 || date.day > days_in_month(date.year, date.month) {
                return false;
            }
        }
        if let Some(time) = &self.time {
            if time.hour > 23 || time.minute > 59 || time.second > 60 {
                return false;
            }
            if time.nanosecond >= 1_000_000_000 || time.precision > 9 {
                return false;
            }
            // digits past `precision` would be dropped on output
            let unit = 10u32.pow(9 - time.precision as u32);
            if time.nanosecond % unit != 0 {
                return false;
            }
        }
        match self.offset {
            Some(TimeOffset::Custom { minutes }) => minutes.unsigned_abs() < 24 * 60,
            _ => true,
        }
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = &self.date {
            write!(f, "{:04}-{:02}-{:02}", date.year, date.month, date.day)?;
            if self.time.is_some() {
                f.write_str("T")?;
            }
        }
        if let Some(time) = &self.time {
            write!(f, "{:02}:{:02}:{:02}", time.hour, time.minute, time.second)?;
            let precision = time.precision.min(9) as usize;
            if precision > 0 {
                let digits = format!("{:09}", time.nanosecond);
                write!(f, ".{}", &digits[..precision])?;
            }
        }
        match self.offset {
            Some(TimeOffset::Z) => f.write_str("Z"),
            Some(TimeOffset::Custom { minutes }) => {
                let sign = if minutes < 0 { '-' } else { '+' };
                let abs = minutes.unsigned_abs();
                write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
            None => Ok(()),
        }
    }
}

impl FromStr for Datetime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Datetime::munch(s.as_bytes()) {
            Some((len, value)) if len == s.len() => Ok(value),
            _ => Err(Error::from((
                ErrorKind::InvalidDatetime,
                Span::at(0, s.len()),
            ))),
        }
    }
}
