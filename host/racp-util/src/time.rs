//! Calendar time
//!
//! A `CalendarTime` is the *Date Time* characteristic of the Bluetooth assigned numbers. It is the
//! time format used for the base time of a glucose measurement and for the user facing time
//! filter of the Record Access Control Point.

use crate::{TransferFormatError, TransferFormatInto, TransferFormatTryFrom};
use core::cmp::Ordering;

/// A calendar date and time of day
///
/// A value of zero for the year, month, or day means that field is unknown. Unknown fields compare
/// as being *before* every known value of the same field.
///
/// `CalendarTime` has a total order. Two times are compared field by field, starting with the most
/// significant one (the year) and moving to the next field only when the current fields are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CalendarTime {
    /// The size of a `CalendarTime` in the transfer format
    pub const SIZE: usize = 7;

    const MIN_YEAR: u16 = 1582;
    const MAX_YEAR: u16 = 9999;

    /// Create a new `CalendarTime`
    ///
    /// `None` is returned if any field is outside of the range defined for the *Date Time*
    /// characteristic.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let time = CalendarTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };

        time.validate().ok().map(|_| time)
    }

    fn validate(&self) -> Result<(), TransferFormatError> {
        const NAME: &str = stringify!(CalendarTime);

        if self.year != 0 && !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&self.year) {
            Err(TransferFormatError::out_of_range(NAME, "year", self.year))
        } else if self.month > 12 {
            Err(TransferFormatError::out_of_range(NAME, "month", self.month))
        } else if self.day > 31 {
            Err(TransferFormatError::out_of_range(NAME, "day", self.day))
        } else if self.hour > 23 {
            Err(TransferFormatError::out_of_range(NAME, "hour", self.hour))
        } else if self.minute > 59 {
            Err(TransferFormatError::out_of_range(NAME, "minute", self.minute))
        } else if self.second > 59 {
            Err(TransferFormatError::out_of_range(NAME, "second", self.second))
        } else {
            Ok(())
        }
    }

    fn is_leap_year(year: u16) -> bool {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    }

    fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Add a number of minutes to this time
    ///
    /// The calendar is advanced through hours, days, months, and years as needed. `None` is
    /// returned if the year, month, or day is unknown or if the result would go past the last
    /// representable year.
    pub fn add_minutes(self, minutes: u32) -> Option<Self> {
        if self.year == 0 || self.month == 0 || self.day == 0 {
            return None;
        }

        let total_minutes = (self.hour as u32 * 60 + self.minute as u32).checked_add(minutes)?;

        let mut time = self;

        time.minute = (total_minutes % 60) as u8;
        time.hour = (total_minutes / 60 % 24) as u8;

        for _ in 0..total_minutes / (60 * 24) {
            if time.day < Self::days_in_month(time.year, time.month) {
                time.day += 1;
            } else if time.month < 12 {
                time.day = 1;
                time.month += 1;
            } else if time.year < Self::MAX_YEAR {
                time.day = 1;
                time.month = 1;
                time.year += 1;
            } else {
                return None;
            }
        }

        Some(time)
    }
}

/// Three way comparison of two calendar times
///
/// The fields are compared lexicographically as the tuple (year, month, day, hour, minute,
/// second).
pub fn compare(a: &CalendarTime, b: &CalendarTime) -> Ordering {
    a.year
        .cmp(&b.year)
        .then_with(|| a.month.cmp(&b.month))
        .then_with(|| a.day.cmp(&b.day))
        .then_with(|| a.hour.cmp(&b.hour))
        .then_with(|| a.minute.cmp(&b.minute))
        .then_with(|| a.second.cmp(&b.second))
}

impl PartialOrd for CalendarTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalendarTime {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl core::fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl TransferFormatTryFrom for CalendarTime {
    fn try_from(raw: &[u8]) -> Result<Self, TransferFormatError> {
        if raw.len() == Self::SIZE {
            let time = CalendarTime {
                year: <u16>::from_le_bytes([raw[0], raw[1]]),
                month: raw[2],
                day: raw[3],
                hour: raw[4],
                minute: raw[5],
                second: raw[6],
            };

            time.validate().map(|_| time)
        } else {
            Err(TransferFormatError::bad_size(
                stringify!(CalendarTime),
                Self::SIZE,
                raw.len(),
            ))
        }
    }
}

impl TransferFormatInto for CalendarTime {
    fn len_of_into(&self) -> usize {
        Self::SIZE
    }

    fn build_into_ret(&self, into_ret: &mut [u8]) {
        into_ret[..2].copy_from_slice(&self.year.to_le_bytes());

        into_ret[2] = self.month;
        into_ret[3] = self.day;
        into_ret[4] = self.hour;
        into_ret[5] = self.minute;
        into_ret[6] = self.second;
    }
}
