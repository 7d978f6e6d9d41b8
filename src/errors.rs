//! Error types.

use core::fmt;

use crate::TimeScale;

/// The error type returned by conversions and arithmetic on
/// [`Instant`](crate::Instant)s.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionError {
    /// A second count would exceed the range of an `i64`.
    ArithmeticOverflow,
    /// Gap-unaware arithmetic was requested on a time scale with leap
    /// seconds.
    UnsupportedOperation(TimeScale),
    /// The operands are on different time scales, or the operand is not on
    /// the time scale expected by the operation.
    ScaleMismatch(TimeScale, TimeScale),
    /// The nanosecond value is more than 999 999 999.
    InvalidNanosecond(u32),
    /// A leap second was specified for a second that is not followed by an
    /// inserted leap second, or on a time scale without leap seconds.
    InvalidLeapSecond(i64),
}

impl ConversionError {
    /// Returns `true` if the error was caused by an invalid argument rather
    /// than by the range of the result.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::ScaleMismatch(..) | Self::InvalidNanosecond(_) | Self::InvalidLeapSecond(_)
        )
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArithmeticOverflow => "second count out of representable range".fmt(fmt),
            Self::UnsupportedOperation(scale) => write!(
                fmt,
                "simple arithmetic is not supported on the {} time scale",
                scale
            ),
            Self::ScaleMismatch(expected, found) => write!(
                fmt,
                "expected an instant on the {} time scale, found {}",
                expected, found
            ),
            Self::InvalidNanosecond(nanosec) => {
                write!(fmt, "nanosecond value '{}' is not valid", nanosec)
            }
            Self::InvalidLeapSecond(secs) => write!(
                fmt,
                "second '{}' is not followed by an inserted leap second",
                secs
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConversionError {}

/// The error type returned when date-time components are invalid or correspond
/// to an instant outside the representable range.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// The month is not between 1 and 12.
    InvalidMonth(u8),
    /// The day of the month is less than 1, or more than the maximum value for
    /// this combination of year and month.
    InvalidDayOfMonth(u8),
    /// The hour field value is not between 0 and 23.
    InvalidHour(u8),
    /// The minute field value is not between 0 and 59.
    InvalidMinute(u8),
    /// The second field value is not between 0 and 59, or is 60 outside of an
    /// inserted UTC leap second.
    InvalidSecond(u8),
    /// The nanosecond field value is more than 999 999 999.
    InvalidNanosecond(u32),
    /// This date-time value cannot be represented as an instant.
    OutOfRange,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMonth(month) => write!(fmt, "month numeral '{}' is not valid", month),
            Self::InvalidDayOfMonth(day) => {
                write!(fmt, "day of month '{}' is not valid for this date", day)
            }
            Self::InvalidHour(hour) => write!(fmt, "hour numeral '{}' is not valid", hour),
            Self::InvalidMinute(min) => write!(fmt, "minute numeral '{}' is not valid", min),
            Self::InvalidSecond(sec) => write!(fmt, "second numeral '{}' is not valid", sec),
            Self::InvalidNanosecond(nanosec) => {
                write!(fmt, "nanosecond value '{}' is not valid", nanosec)
            }
            Self::OutOfRange => "instant outside representable range".fmt(fmt),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DateTimeError {}
