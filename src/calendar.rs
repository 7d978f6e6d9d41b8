//! Proleptic Gregorian calendar arithmetic.

use crate::DateTimeError;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_IN_MONTH_LEAP: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Number of seconds in a day without leap second.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Offset between a Julian Day Number and the Modified Julian Day of the same
/// civil date.
const MJD_OFFSET: i64 = 2_400_001;

/// Modified Julian Day of 1970-01-01.
pub const MJD_EPOCH: i64 = modified_julian_day(1970, 1, 1);

/// Returns whether the year is a leap year for a 64-bit signed year.
///
/// The argument is the proleptic Gregorian year, with the ISO 8601
/// interpretation of year 0 as year 1 BC. Year 0 does not obey the usual rule
/// and is considered a leap year.
///
/// The whole `i64` value range is supported.
pub(crate) const fn is_leap(year: i64) -> bool {
    (year & 0b11) == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Calculates the number of days in a month.
pub(crate) const fn days_in_month(year: i32, month: u8) -> u8 {
    let month_idx = (month - 1) as usize;

    if is_leap(year as i64) {
        DAYS_IN_MONTH_LEAP[month_idx]
    } else {
        DAYS_IN_MONTH[month_idx]
    }
}

/// Returns the Julian Day Number of a proleptic Gregorian date.
///
/// The month is expected within 1–12 and the day within the month; other
/// values are extrapolated linearly by the formula rather than rejected.
/// Divisions round towards `-∞`, so years before -4800 are handled too.
///
/// # Examples
///
/// ```
/// use utc_tai::julian_day_number;
///
/// assert_eq!(julian_day_number(2000, 1, 1), 2_451_545);
/// ```
pub const fn julian_day_number(year: i32, month: u8, day: u8) -> i64 {
    let month = month as i64;
    let a = (14 - month).div_euclid(12);
    let y = year as i64 + 4800 - a;
    let m = month + 12 * a - 3;

    day as i64 + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4) - y.div_euclid(100)
        + y.div_euclid(400)
        - 32045
}

/// Returns the Modified Julian Day of a proleptic Gregorian date.
///
/// # Examples
///
/// ```
/// use utc_tai::modified_julian_day;
///
/// assert_eq!(modified_julian_day(1970, 1, 1), 40_587);
/// assert_eq!(modified_julian_day(1858, 11, 17), 0);
/// ```
pub const fn modified_julian_day(year: i32, month: u8, day: u8) -> i64 {
    julian_day_number(year, month, day) - MJD_OFFSET
}

/// Returns the number of seconds between 1970-01-01 and the start of the
/// provided date, counting 86 400 seconds per day.
///
/// The result is negative for dates before 1970 and cannot overflow for any
/// `i32` year.
///
/// # Examples
///
/// ```
/// use utc_tai::epoch_seconds;
///
/// assert_eq!(epoch_seconds(1970, 1, 1), 0);
/// assert_eq!(epoch_seconds(1958, 1, 1), -378_691_200);
/// assert_eq!(epoch_seconds(1972, 1, 1), 63_072_000);
/// ```
pub const fn epoch_seconds(year: i32, month: u8, day: u8) -> i64 {
    SECONDS_PER_DAY * (modified_julian_day(year, month, day) - MJD_EPOCH)
}

/// Validates date-time fields and returns the number of seconds since
/// 1970-01-01 00:00:00 counting 86 400 seconds per day.
///
/// The second may be 60 when `allow_leap_second` is set, in which case it is
/// counted as second 59 and the caller is responsible for recording the leap
/// second.
#[allow(clippy::too_many_arguments)]
pub(crate) const fn checked_date_time_secs(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    min: u8,
    sec: u8,
    nano: u32,
    allow_leap_second: bool,
) -> Result<i64, DateTimeError> {
    if month < 1 || month > 12 {
        return Err(DateTimeError::InvalidMonth(month));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeError::InvalidDayOfMonth(day));
    }
    if hour > 23 {
        return Err(DateTimeError::InvalidHour(hour));
    }
    if min > 59 {
        return Err(DateTimeError::InvalidMinute(min));
    }
    if sec > 60 || (sec == 60 && !allow_leap_second) {
        return Err(DateTimeError::InvalidSecond(sec));
    }
    if nano >= crate::NANOS_PER_SEC {
        return Err(DateTimeError::InvalidNanosecond(nano));
    }

    let sec = if sec == 60 { 59 } else { sec };

    Ok(epoch_seconds(year, month, day) + hour as i64 * 3600 + min as i64 * 60 + sec as i64)
}
