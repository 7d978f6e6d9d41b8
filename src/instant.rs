//! The instant value type shared by all conversions.

use core::cmp::Ordering;
use core::ops::{Add, Sub};

use crate::calendar::checked_date_time_secs;
use crate::{ConversionError, DateTimeError, Duration, LeapTable, TimeScale, NANOS_PER_SEC};

/// A point in time on a given [`TimeScale`].
///
/// An instant is represented as a 64-bit signed number of seconds counted
/// from 1970-01-01 00:00:00 on its own scale, a leap second counter and a
/// positive number of nanoseconds. The leap second counter is non-zero only
/// for an inserted UTC leap second: 2016-12-31 23:59:60.5 UTC is stored as the
/// seconds of 2016-12-31 23:59:59 with a leap second count of 1 and
/// 500 000 000 nanoseconds.
///
/// Instants on the same scale are ordered lexicographically by seconds, leap
/// second and nanoseconds. Instants on different scales are never equal and
/// are not ordered.
///
/// # Examples
///
/// ```
/// use utc_tai::{Instant, TimeScale};
///
/// let t0 = Instant::new(TimeScale::Tai, 1_234_567_890, 987_654_321);
/// let t1 = Instant::new(TimeScale::Tai, 1_234_567_891, 0);
/// let t2 = Instant::new(TimeScale::Utc, 1_234_567_891, 0);
///
/// assert!(t0 < t1);
/// assert_eq!(t1.partial_cmp(&t2), None);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawInstant"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant {
    scale: TimeScale,
    /// The number of whole seconds in the future (if positive) or in the past
    /// (if negative) of 1970-01-01 00:00:00 on `scale`.
    secs: i64,
    leap: u32,
    /// The sub-second number of nanoseconds in the future of the point in time
    /// defined by `secs` and `leap`.
    nanos: u32,
}

impl Instant {
    /// Creates an instant without leap second.
    ///
    /// # Panics
    ///
    /// This constructor will panic if the number of nanoseconds is greater than
    /// or equal to 1 second.
    ///
    /// # Example
    ///
    /// ```
    /// use utc_tai::{Instant, TimeScale};
    ///
    /// // An instant set to 2009-02-13 23:31:30.987654321 TAI.
    /// let instant = Instant::new(TimeScale::Tai, 1_234_567_890, 987_654_321);
    /// ```
    pub const fn new(scale: TimeScale, epoch_seconds: i64, nano_of_second: u32) -> Self {
        assert!(
            nano_of_second < NANOS_PER_SEC,
            "invalid number of nanoseconds"
        );

        Self::from_parts(scale, epoch_seconds, 0, nano_of_second)
    }

    /// Creates an instant that may lie within an inserted leap second.
    ///
    /// A non-zero leap second is only accepted on a scale that supports leap
    /// seconds, for the last second of a day followed by at least as many
    /// inserted leap seconds in the [historical table](LeapTable::HISTORICAL).
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, ConversionError, Instant, TimeScale};
    ///
    /// let last_second_of_2016 = epoch_seconds(2017, 1, 1) - 1;
    ///
    /// // 2016-12-31 23:59:60.25 UTC.
    /// let leap = Instant::with_leap_second(TimeScale::Utc, last_second_of_2016, 1, 250_000_000);
    /// assert!(leap.is_ok());
    ///
    /// // 2017-12-31 23:59:60 UTC never existed.
    /// let last_second_of_2017 = epoch_seconds(2018, 1, 1) - 1;
    /// assert_eq!(
    ///     Instant::with_leap_second(TimeScale::Utc, last_second_of_2017, 1, 0),
    ///     Err(ConversionError::InvalidLeapSecond(last_second_of_2017))
    /// );
    /// ```
    pub fn with_leap_second(
        scale: TimeScale,
        epoch_seconds: i64,
        leap_second: u32,
        nano_of_second: u32,
    ) -> Result<Self, ConversionError> {
        if nano_of_second >= NANOS_PER_SEC {
            return Err(ConversionError::InvalidNanosecond(nano_of_second));
        }
        if leap_second != 0
            && (!scale.supports_leap_second()
                || LeapTable::HISTORICAL.leap_seconds_after(epoch_seconds) < leap_second as i64)
        {
            return Err(ConversionError::InvalidLeapSecond(epoch_seconds));
        }

        Ok(Self::from_parts(scale, epoch_seconds, leap_second, nano_of_second))
    }

    /// Creates an instant from date-time fields on the provided scale.
    ///
    /// Second 60 is only accepted on the UTC scale, at the end of a day
    /// followed by an inserted leap second.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{DateTimeError, Instant, TimeScale};
    ///
    /// let t = Instant::from_date_time(TimeScale::Utc, 1972, 6, 30, 23, 59, 60, 0).unwrap();
    /// assert_eq!(t.epoch_seconds(), 78_796_799);
    /// assert_eq!(t.leap_second(), 1);
    ///
    /// assert_eq!(
    ///     Instant::from_date_time(TimeScale::Tai, 1972, 6, 30, 23, 59, 60, 0),
    ///     Err(DateTimeError::InvalidSecond(60))
    /// );
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn from_date_time(
        scale: TimeScale,
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        min: u8,
        sec: u8,
        nano: u32,
    ) -> Result<Self, DateTimeError> {
        let secs = checked_date_time_secs(
            year,
            month,
            day,
            hour,
            min,
            sec,
            nano,
            scale.supports_leap_second(),
        )?;

        let leap = if sec == 60 {
            if LeapTable::HISTORICAL.leap_seconds_after(secs) == 0 {
                return Err(DateTimeError::InvalidSecond(sec));
            }
            1
        } else {
            0
        };

        Ok(Self::from_parts(scale, secs, leap, nano))
    }

    pub(crate) const fn from_parts(scale: TimeScale, secs: i64, leap: u32, nanos: u32) -> Self {
        Self {
            scale,
            secs,
            leap,
            nanos,
        }
    }

    /// Returns the time scale of the instant.
    pub const fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Returns the number of whole seconds since 1970-01-01 00:00:00 on the
    /// instant's scale.
    ///
    /// Seconds are always rounded towards `-∞`. Within an inserted leap
    /// second, this is the second preceding the leap second.
    pub const fn epoch_seconds(&self) -> i64 {
        self.secs
    }

    /// Returns the number of inserted leap seconds elapsed since the end of
    /// [`epoch_seconds`](Self::epoch_seconds).
    pub const fn leap_second(&self) -> u32 {
        self.leap
    }

    /// Returns the sub-second fractional part in nanoseconds.
    pub const fn nano_of_second(&self) -> u32 {
        self.nanos
    }

    /// Adds a duration to an instant on a scale without leap seconds.
    ///
    /// Returns an error if the scale supports leap seconds, since the label
    /// reached by adding a number of seconds across a leap second is then
    /// ill-defined, or if the result overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{ConversionError, Duration, Instant, TimeScale};
    ///
    /// let t = Instant::new(TimeScale::Tai, -100, 900_000_000);
    ///
    /// assert_eq!(
    ///     t.simple_add(Duration::new(400, 300_000_000)),
    ///     Ok(Instant::new(TimeScale::Tai, 301, 200_000_000))
    /// );
    ///
    /// let t = Instant::new(TimeScale::Utc, 0, 0);
    /// assert_eq!(
    ///     t.simple_add(Duration::from_secs(1)),
    ///     Err(ConversionError::UnsupportedOperation(TimeScale::Utc))
    /// );
    /// ```
    pub fn simple_add(self, rhs: Duration) -> Result<Self, ConversionError> {
        if self.scale.supports_leap_second() {
            return Err(ConversionError::UnsupportedOperation(self.scale));
        }
        if rhs == Duration::ZERO {
            return Ok(self);
        }

        let mut secs = self.secs as i128 + rhs.as_secs() as i128;
        let mut nanos = self.nanos + rhs.subsec_nanos();
        if nanos >= NANOS_PER_SEC {
            nanos -= NANOS_PER_SEC;
            secs += 1;
        }

        Self::checked_from_wide(self.scale, secs, nanos)
    }

    /// Subtracts a duration from an instant on a scale without leap seconds.
    ///
    /// Returns an error if the scale supports leap seconds or if the result
    /// overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{Duration, Instant, TimeScale};
    ///
    /// let t = Instant::new(TimeScale::Posix, 100, 100_000_000);
    ///
    /// assert_eq!(
    ///     t.simple_sub(Duration::new(400, 300_000_000)),
    ///     Ok(Instant::new(TimeScale::Posix, -301, 800_000_000))
    /// );
    /// ```
    pub fn simple_sub(self, rhs: Duration) -> Result<Self, ConversionError> {
        if self.scale.supports_leap_second() {
            return Err(ConversionError::UnsupportedOperation(self.scale));
        }
        if rhs == Duration::ZERO {
            return Ok(self);
        }

        let mut secs = self.secs as i128 - rhs.as_secs() as i128;
        let nanos = if self.nanos < rhs.subsec_nanos() {
            secs -= 1;
            (self.nanos + NANOS_PER_SEC) - rhs.subsec_nanos()
        } else {
            self.nanos - rhs.subsec_nanos()
        };

        Self::checked_from_wide(self.scale, secs, nanos)
    }

    fn checked_from_wide(
        scale: TimeScale,
        secs: i128,
        nanos: u32,
    ) -> Result<Self, ConversionError> {
        let secs = i64::try_from(secs).map_err(|_| ConversionError::ArithmeticOverflow)?;

        Ok(Self::from_parts(scale, secs, 0, nanos))
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawInstant {
    scale: TimeScale,
    secs: i64,
    leap: u32,
    nanos: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInstant> for Instant {
    type Error = ConversionError;

    fn try_from(raw: RawInstant) -> Result<Self, Self::Error> {
        Self::with_leap_second(raw.scale, raw.secs, raw.leap, raw.nanos)
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.scale != other.scale {
            return None;
        }

        Some((self.secs, self.leap, self.nanos).cmp(&(other.secs, other.leap, other.nanos)))
    }
}

impl Add<Duration> for Instant {
    type Output = Self;

    /// Adds a duration to an instant.
    ///
    /// # Panics
    ///
    /// This function panics if the scale supports leap seconds or if the
    /// resulting instant cannot be represented. See [`Instant::simple_add`]
    /// for a panic-free version.
    fn add(self, other: Duration) -> Self {
        self.simple_add(other)
            .expect("invalid addition of a duration to an instant")
    }
}

impl Sub<Duration> for Instant {
    type Output = Self;

    /// Subtracts a duration from an instant.
    ///
    /// # Panics
    ///
    /// This function panics if the scale supports leap seconds or if the
    /// resulting instant cannot be represented. See [`Instant::simple_sub`]
    /// for a panic-free version.
    fn sub(self, other: Duration) -> Self {
        self.simple_sub(other)
            .expect("invalid subtraction of a duration from an instant")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch_seconds;

    #[test]
    fn equality() {
        let t0 = Instant::new(TimeScale::Tai, 123, 123_456_789);
        let t1 = Instant::new(TimeScale::Tai, 123, 123_456_789);
        let t2 = Instant::new(TimeScale::Tai, 123, 123_456_790);
        let t3 = Instant::new(TimeScale::Tai, 124, 123_456_789);
        let t4 = Instant::new(TimeScale::Posix, 123, 123_456_789);

        assert_eq!(t0, t1);
        assert_ne!(t0, t2);
        assert_ne!(t0, t3);
        assert_ne!(t0, t4);
    }

    #[test]
    fn ordering() {
        let last_second_of_2016 = epoch_seconds(2017, 1, 1) - 1;
        let t0 = Instant::new(TimeScale::Utc, last_second_of_2016, 999_999_999);
        let t1 = Instant::with_leap_second(TimeScale::Utc, last_second_of_2016, 1, 0).unwrap();
        let t2 = Instant::new(TimeScale::Utc, last_second_of_2016 + 1, 0);

        assert!(t0 < t1);
        assert!(t1 < t2);
        assert!(Instant::new(TimeScale::Tai, 0, 1) < Instant::new(TimeScale::Tai, 1, 0));
    }

    #[test]
    fn no_ordering_across_scales() {
        let t0 = Instant::new(TimeScale::Tai, 0, 0);
        let t1 = Instant::new(TimeScale::Utc, 1, 0);

        assert_eq!(t0.partial_cmp(&t1), None);
        assert_eq!(t1.partial_cmp(&t0), None);
    }

    #[test]
    #[should_panic]
    fn invalid() {
        Instant::new(TimeScale::Tai, 123, 1_000_000_000);
    }

    #[test]
    fn with_leap_second_validation() {
        let last_second_of_1972_h1 = epoch_seconds(1972, 7, 1) - 1;

        assert!(Instant::with_leap_second(TimeScale::Utc, last_second_of_1972_h1, 1, 0).is_ok());
        assert_eq!(
            Instant::with_leap_second(TimeScale::Utc, last_second_of_1972_h1, 2, 0),
            Err(ConversionError::InvalidLeapSecond(last_second_of_1972_h1))
        );
        assert_eq!(
            Instant::with_leap_second(TimeScale::Tai, last_second_of_1972_h1, 1, 0),
            Err(ConversionError::InvalidLeapSecond(last_second_of_1972_h1))
        );
        assert_eq!(
            Instant::with_leap_second(TimeScale::Posix, last_second_of_1972_h1, 1, 0),
            Err(ConversionError::InvalidLeapSecond(last_second_of_1972_h1))
        );
        assert_eq!(
            Instant::with_leap_second(TimeScale::Utc, 0, 0, NANOS_PER_SEC),
            Err(ConversionError::InvalidNanosecond(NANOS_PER_SEC))
        );
        assert_eq!(
            Instant::with_leap_second(TimeScale::Tai, 7, 0, 5),
            Ok(Instant::new(TimeScale::Tai, 7, 5))
        );
    }

    #[test]
    fn from_date_time() {
        assert_eq!(
            Instant::from_date_time(TimeScale::Posix, 2009, 2, 13, 23, 31, 30, 123_456_789),
            Ok(Instant::new(TimeScale::Posix, 1_234_567_890, 123_456_789))
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Utc, 1958, 1, 1, 0, 0, 0, 0),
            Ok(Instant::new(TimeScale::Utc, -378_691_200, 0))
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Utc, 2016, 12, 31, 23, 59, 60, 5),
            Instant::with_leap_second(TimeScale::Utc, epoch_seconds(2017, 1, 1) - 1, 1, 5)
                .map_err(|_| DateTimeError::OutOfRange)
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Utc, 2017, 12, 31, 23, 59, 60, 0),
            Err(DateTimeError::InvalidSecond(60))
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Utc, 2016, 12, 31, 23, 58, 60, 0),
            Err(DateTimeError::InvalidSecond(60))
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Posix, 2016, 12, 31, 23, 59, 60, 0),
            Err(DateTimeError::InvalidSecond(60))
        );
        assert_eq!(
            Instant::from_date_time(TimeScale::Tai, 2016, 2, 30, 0, 0, 0, 0),
            Err(DateTimeError::InvalidDayOfMonth(30))
        );
    }

    #[test]
    fn simple_add_smoke() {
        let t = Instant::new(TimeScale::Tai, -100, 100_000_000);
        let dt = Duration::new(400, 300_000_000);

        assert_eq!(t + dt, Instant::new(TimeScale::Tai, 300, 400_000_000));
    }

    #[test]
    fn simple_add_with_carry() {
        let t = Instant::new(TimeScale::Tai, -100, 900_000_000);
        let dt1 = Duration::new(400, 100_000_000);
        let dt2 = Duration::new(400, 300_000_000);

        assert_eq!(t + dt1, Instant::new(TimeScale::Tai, 301, 0));
        assert_eq!(t + dt2, Instant::new(TimeScale::Tai, 301, 200_000_000));
    }

    #[test]
    fn simple_add_negative_duration() {
        let t = Instant::new(TimeScale::Posix, 10, 0);

        assert_eq!(
            t.simple_add(-Duration::new(0, 1)),
            Ok(Instant::new(TimeScale::Posix, 9, 999_999_999))
        );
    }

    #[test]
    fn simple_add_extreme() {
        let dt = Duration::new(-1, 1);

        // The intermediate second count underflows but the result does not.
        let t = Instant::new(TimeScale::Tai, i64::MIN, NANOS_PER_SEC - 1);
        assert_eq!(t.simple_add(dt), Ok(Instant::new(TimeScale::Tai, i64::MIN, 0)));
    }

    #[test]
    fn simple_add_overflow() {
        let t = Instant::new(TimeScale::Tai, i64::MAX, 500_000_000);

        assert_eq!(
            t.simple_add(Duration::new(0, 500_000_000)),
            Err(ConversionError::ArithmeticOverflow)
        );
        assert_eq!(
            t.simple_add(Duration::MAX),
            Err(ConversionError::ArithmeticOverflow)
        );
    }

    #[test]
    #[should_panic]
    fn add_overflow_panics() {
        let _ = Instant::new(TimeScale::Tai, i64::MAX, 0) + Duration::from_secs(1);
    }

    #[test]
    fn simple_sub_with_carry() {
        let t = Instant::new(TimeScale::Tai, 100, 100_000_000);
        let dt1 = Duration::new(400, 100_000_000);
        let dt2 = Duration::new(400, 300_000_000);

        assert_eq!(t - dt1, Instant::new(TimeScale::Tai, -300, 0));
        assert_eq!(t - dt2, Instant::new(TimeScale::Tai, -301, 800_000_000));
    }

    #[test]
    fn simple_sub_overflow() {
        let t = Instant::new(TimeScale::Tai, i64::MIN, 0);

        assert_eq!(
            t.simple_sub(Duration::new(0, 1)),
            Err(ConversionError::ArithmeticOverflow)
        );
        assert_eq!(
            t.simple_sub(Duration::MIN),
            Ok(Instant::new(TimeScale::Tai, 0, 0))
        );
    }

    #[test]
    fn simple_arithmetic_rejects_leap_scales() {
        let t = Instant::new(TimeScale::Utc, 0, 0);

        assert_eq!(
            t.simple_add(Duration::ZERO),
            Err(ConversionError::UnsupportedOperation(TimeScale::Utc))
        );
        assert_eq!(
            t.simple_sub(Duration::from_secs(1)),
            Err(ConversionError::UnsupportedOperation(TimeScale::Utc))
        );
    }

    #[test]
    fn round_trip_law() {
        let instants = [
            Instant::new(TimeScale::Tai, -378_691_200, 0),
            Instant::new(TimeScale::Tai, 0, 999_999_999),
            Instant::new(TimeScale::Tai, 63_072_010, 123_456_789),
            Instant::new(TimeScale::Tai, -1, 1),
        ];

        for a in instants {
            for b in instants {
                let d = Duration::between(a, b).unwrap();
                assert_eq!(a.simple_add(d), Ok(b));
                assert_eq!(b.simple_sub(d), Ok(a));
                assert_eq!(Duration::between(b, a).unwrap(), -d);
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let t = Instant::with_leap_second(TimeScale::Utc, 78_796_799, 1, 42).unwrap();
        let json = serde_json::to_string(&t).unwrap();

        assert_eq!(serde_json::from_str::<Instant>(&json).unwrap(), t);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_invalid_fields() {
        let payloads = [
            r#"{"scale":"Posix","secs":0,"leap":0,"nanos":4000000000}"#,
            r#"{"scale":"Utc","secs":0,"leap":0,"nanos":1000000000}"#,
            r#"{"scale":"Tai","secs":78796799,"leap":7,"nanos":0}"#,
            r#"{"scale":"Posix","secs":78796799,"leap":1,"nanos":0}"#,
            r#"{"scale":"Utc","secs":78796800,"leap":1,"nanos":0}"#,
            r#"{"scale":"Utc","secs":78796799,"leap":2,"nanos":0}"#,
        ];

        for json in payloads {
            assert!(serde_json::from_str::<Instant>(json).is_err(), "{}", json);
        }
        assert_eq!(
            serde_json::from_str::<Instant>(r#"{"scale":"Utc","secs":78796799,"leap":1,"nanos":5}"#)
                .unwrap(),
            Instant::with_leap_second(TimeScale::Utc, 78_796_799, 1, 5).unwrap()
        );
    }
}
