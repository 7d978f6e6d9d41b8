//! System clocks and interoperability with `std::time` and `chrono`.

#[cfg(feature = "std")]
use std::time::{Instant as MonotonicInstant, SystemTime};

use crate::Instant;
#[cfg(any(feature = "std", feature = "chrono"))]
use crate::ConversionError;
#[cfg(feature = "std")]
use crate::{Converter, Duration};
#[cfg(any(
    feature = "std",
    feature = "chrono",
    all(feature = "tai_clock", any(target_os = "linux", target_os = "android"))
))]
use crate::TimeScale;
#[cfg(feature = "chrono")]
use crate::NANOS_PER_SEC;

impl Instant {
    /// Creates a UTC instant from a `SystemTime`.
    ///
    /// The system clock is assumed to follow POSIX time, so the result never
    /// lies within a leap second. Times before 1970 are supported.
    ///
    /// Returns an error if the time is outside the representable range.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::{Duration, SystemTime};
    /// use utc_tai::{Instant, TimeScale};
    ///
    /// // 2001-09-15 05:05:00.005 UTC.
    /// let system_time = SystemTime::UNIX_EPOCH + Duration::new(1_000_530_300, 5_000_000);
    /// assert_eq!(
    ///     Instant::from_system_time(&system_time),
    ///     Ok(Instant::new(TimeScale::Utc, 1_000_530_300, 5_000_000))
    /// );
    /// ```
    #[cfg(feature = "std")]
    pub fn from_system_time(system_time: &SystemTime) -> Result<Self, ConversionError> {
        let since_epoch = match system_time.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(elapsed) => Duration::try_from(elapsed)?,
            Err(err) => Duration::try_from(err.duration())?
                .checked_neg()
                .ok_or(ConversionError::ArithmeticOverflow)?,
        };

        Ok(Self::from_parts(
            TimeScale::Utc,
            since_epoch.as_secs(),
            0,
            since_epoch.subsec_nanos(),
        ))
    }

    /// Returns the current UTC instant according to the system clock.
    ///
    /// Beware that the behavior of the system clock near a leap second
    /// shouldn't be relied upon, possibly for the whole day preceding it if
    /// the clock is smeared.
    #[cfg(feature = "std")]
    pub fn now_utc() -> Result<Self, ConversionError> {
        Self::from_system_time(&SystemTime::now())
    }

    /// Returns the current TAI instant read from the `CLOCK_TAI` system
    /// clock.
    ///
    /// Returns `None` if the clock cannot be read. Note that unless the
    /// kernel was given the TAI − UTC offset (usually by an NTP or PTP
    /// daemon), `CLOCK_TAI` silently coincides with the UTC system clock.
    #[cfg(all(feature = "tai_clock", any(target_os = "linux", target_os = "android")))]
    pub fn now_tai() -> Option<Self> {
        let now = nix::time::clock_gettime(nix::time::ClockId::CLOCK_TAI).ok()?;
        let nanos = u32::try_from(now.tv_nsec()).ok()?;
        if nanos >= crate::NANOS_PER_SEC {
            return None;
        }

        #[allow(clippy::useless_conversion)]
        let secs = i64::from(now.tv_sec());

        Some(Self::from_parts(TimeScale::Tai, secs, 0, nanos))
    }

    /// Creates a UTC instant from a `chrono::DateTime`.
    ///
    /// A date-time within a leap second, which `chrono` encodes with a
    /// nanosecond count of 1 second or more, yields an instant with a leap
    /// second, provided that the leap second was actually inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use utc_tai::{epoch_seconds, Instant, TimeScale};
    ///
    /// let date_time = DateTime::parse_from_rfc3339("2016-12-31T23:59:60.5Z").unwrap();
    /// let instant = Instant::from_chrono_date_time(&date_time).unwrap();
    ///
    /// assert_eq!(instant.scale(), TimeScale::Utc);
    /// assert_eq!(instant.epoch_seconds(), epoch_seconds(2017, 1, 1) - 1);
    /// assert_eq!(instant.leap_second(), 1);
    /// assert_eq!(instant.nano_of_second(), 500_000_000);
    /// ```
    #[cfg(feature = "chrono")]
    pub fn from_chrono_date_time<Tz: chrono::TimeZone>(
        date_time: &chrono::DateTime<Tz>,
    ) -> Result<Self, ConversionError> {
        let secs = date_time.timestamp();
        let nanos = date_time.timestamp_subsec_nanos();

        if nanos < NANOS_PER_SEC {
            Ok(Self::from_parts(TimeScale::Utc, secs, 0, nanos))
        } else {
            Self::with_leap_second(TimeScale::Utc, secs, 1, nanos - NANOS_PER_SEC)
        }
    }

    /// Returns a `chrono::DateTime` for a UTC or POSIX instant.
    ///
    /// Returns an error for a TAI instant, for an instant with more than one
    /// leap second, or if the date-time is outside the range of `chrono`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use utc_tai::{Instant, TimeScale};
    ///
    /// let instant = Instant::new(TimeScale::Utc, 915_153_825, 678_000_000);
    ///
    /// assert_eq!(
    ///     instant.to_chrono_date_time().unwrap(),
    ///     DateTime::parse_from_rfc3339("1999-01-01T01:23:45.678Z").unwrap()
    /// );
    /// ```
    #[cfg(feature = "chrono")]
    pub fn to_chrono_date_time(&self) -> Result<chrono::DateTime<chrono::Utc>, ConversionError> {
        if self.scale() == TimeScale::Tai {
            return Err(ConversionError::UnsupportedOperation(TimeScale::Tai));
        }
        let nanos = match self.leap_second() {
            0 => self.nano_of_second(),
            1 => self.nano_of_second() + NANOS_PER_SEC,
            _ => return Err(ConversionError::InvalidLeapSecond(self.epoch_seconds())),
        };

        chrono::DateTime::from_timestamp(self.epoch_seconds(), nanos)
            .ok_or(ConversionError::ArithmeticOverflow)
    }
}

/// A monotonic clock that generates TAI instants.
///
/// The clock is anchored once to the UTC system clock, converted with the
/// historical tables, and then follows the monotonic [`std::time::Instant`]
/// clock. Unlike the system clock, it is therefore unaffected by leap seconds
/// and clock adjustments after initialization.
///
/// A `TaiClock` instance can be simultaneously accessed from several threads.
///
/// # Examples
///
/// ```
/// use utc_tai::{TaiClock, TimeScale};
///
/// let clock = TaiClock::init_from_utc().unwrap();
///
/// let t0 = clock.now();
/// let t1 = clock.now();
/// assert_eq!(t0.scale(), TimeScale::Tai);
/// assert!(t0 <= t1);
/// ```
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug, Hash)]
pub struct TaiClock {
    timestamp_ref: Instant,
    wall_clock_ref: MonotonicInstant,
}

#[cfg(feature = "std")]
impl TaiClock {
    /// Initializes the clock so that the current monotonic time corresponds
    /// to the provided instant, which is first converted to TAI.
    pub fn init_at(now: &Instant) -> Result<Self, ConversionError> {
        Ok(Self {
            timestamp_ref: Converter::HISTORICAL.instant_to_tai(now)?,
            wall_clock_ref: MonotonicInstant::now(),
        })
    }

    /// Initializes the clock from the UTC system clock.
    ///
    /// Several interleaved samples of the system and monotonic clocks are
    /// taken and the best correlated pair is retained.
    pub fn init_from_utc() -> Result<Self, ConversionError> {
        let (system_time, wall_clock_ref) = correlated_time_refs();
        let utc = Instant::from_system_time(&system_time)?;

        Ok(Self {
            timestamp_ref: Converter::HISTORICAL.instant_to_tai(&utc)?,
            wall_clock_ref,
        })
    }

    /// Returns the TAI instant corresponding to the current monotonic time.
    ///
    /// The returned instant is never lower than an instant returned by a
    /// previous call to `now`.
    pub fn now(&self) -> Instant {
        let now = MonotonicInstant::now();

        if now >= self.wall_clock_ref {
            self.timestamp_ref + from_std(now.duration_since(self.wall_clock_ref))
        } else {
            self.timestamp_ref - from_std(self.wall_clock_ref.duration_since(now))
        }
    }
}

/// Monotonic clock durations are far below the `i64` seconds range.
#[cfg(feature = "std")]
fn from_std(duration: std::time::Duration) -> Duration {
    Duration::new(duration.as_secs() as i64, duration.subsec_nanos())
}

/// Returns a `SystemTime` and the `std::time::Instant` best correlated to it.
#[cfg(feature = "std")]
fn correlated_time_refs() -> (SystemTime, MonotonicInstant) {
    const SAMPLES: usize = 3;

    let mut best: Option<(SystemTime, MonotonicInstant, std::time::Duration)> = None;
    let mut before = MonotonicInstant::now();

    for _ in 0..SAMPLES {
        let system_time = SystemTime::now();
        let after = MonotonicInstant::now();
        let uncertainty = after.saturating_duration_since(before);

        // A null uncertainty most likely denotes a coarse monotonic clock.
        let better = match best {
            None => true,
            Some((_, _, best_uncertainty)) => {
                !uncertainty.is_zero()
                    && (best_uncertainty.is_zero() || uncertainty < best_uncertainty)
            }
        };
        if better {
            best = Some((system_time, before + uncertainty / 2, uncertainty));
        }
        before = after;
    }

    match best {
        Some((system_time, instant, _)) => (system_time, instant),
        None => (SystemTime::now(), MonotonicInstant::now()),
    }
}

#[cfg(all(
    test,
    any(
        feature = "std",
        feature = "chrono",
        all(feature = "tai_clock", any(target_os = "linux", target_os = "android"))
    )
))]
mod tests {
    use super::*;
    use crate::epoch_seconds;

    #[cfg(feature = "std")]
    const TOLERANCE: Duration = Duration::new(0, 20_000_000);

    #[cfg(feature = "std")]
    #[test]
    fn from_system_time() {
        // 2001-01-01 12:34:56.789 UTC.
        let system_time =
            SystemTime::UNIX_EPOCH + std::time::Duration::new(978_352_496, 789_000_000);

        assert_eq!(
            Instant::from_system_time(&system_time),
            Ok(Instant::new(TimeScale::Utc, 978_352_496, 789_000_000))
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn from_system_time_before_1970() {
        let system_time = SystemTime::UNIX_EPOCH - std::time::Duration::new(1, 250_000_000);

        assert_eq!(
            Instant::from_system_time(&system_time),
            Ok(Instant::new(TimeScale::Utc, -2, 750_000_000))
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn now_utc_smoke() {
        let now = Instant::now_utc().unwrap();

        assert_eq!(now.scale(), TimeScale::Utc);
        assert!(now.epoch_seconds() > epoch_seconds(2022, 1, 1));
        assert!(now.epoch_seconds() < epoch_seconds(2100, 1, 1));
    }

    #[cfg(all(feature = "tai_clock", any(target_os = "linux", target_os = "android")))]
    #[test]
    fn now_tai_smoke() {
        // The TAI clock may be unavailable or unconfigured, so only check that
        // a reading is plausible.
        if let Some(now) = Instant::now_tai() {
            assert_eq!(now.scale(), TimeScale::Tai);
            assert!(now.epoch_seconds() > epoch_seconds(2022, 1, 1));
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn clock_init_at_smoke() {
        let t0 = Instant::new(TimeScale::Tai, -12_345_678, 987_654_321);
        let clock = TaiClock::init_at(&t0).unwrap();

        let elapsed = Duration::between(t0, clock.now()).unwrap();
        assert!(!elapsed.is_negative());
        assert!(elapsed <= TOLERANCE);
    }

    #[cfg(feature = "std")]
    #[test]
    fn clock_init_at_utc_instant() {
        let utc = Instant::new(TimeScale::Utc, epoch_seconds(2020, 1, 1), 0);
        let clock = TaiClock::init_at(&utc).unwrap();
        let tai = Instant::new(TimeScale::Tai, epoch_seconds(2020, 1, 1) + 37, 0);

        let elapsed = Duration::between(tai, clock.now()).unwrap();
        assert!(!elapsed.is_negative());
        assert!(elapsed <= TOLERANCE);
    }

    #[cfg(feature = "std")]
    #[test]
    fn clock_init_from_utc_smoke() {
        let clock = TaiClock::init_from_utc().unwrap();
        let tai_from_clock = clock.now();
        let tai_from_utc = Converter::HISTORICAL
            .instant_to_tai(&Instant::now_utc().unwrap())
            .unwrap();

        let delta = Duration::between(tai_from_clock, tai_from_utc).unwrap();
        let delta = if delta.is_negative() { -delta } else { delta };
        assert!(delta <= TOLERANCE);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn from_chrono_date_time() {
        let date_time = chrono::DateTime::parse_from_rfc3339("2001-01-01T12:34:56.789Z").unwrap();

        assert_eq!(
            Instant::from_chrono_date_time(&date_time),
            Ok(Instant::new(TimeScale::Utc, 978_352_496, 789_000_000))
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn from_chrono_date_time_with_offset() {
        let date_time =
            chrono::DateTime::parse_from_rfc3339("2001-01-01T14:34:56.789+02:00").unwrap();

        assert_eq!(
            Instant::from_chrono_date_time(&date_time),
            Ok(Instant::new(TimeScale::Utc, 978_352_496, 789_000_000))
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn chrono_leap_second() {
        let last_second_of_2016 = epoch_seconds(2017, 1, 1) - 1;
        let instant =
            Instant::with_leap_second(TimeScale::Utc, last_second_of_2016, 1, 500_000_000)
                .unwrap();
        let date_time = chrono::DateTime::parse_from_rfc3339("2016-12-31T23:59:60.5Z").unwrap();

        assert_eq!(Instant::from_chrono_date_time(&date_time), Ok(instant));
        assert_eq!(instant.to_chrono_date_time().unwrap(), date_time);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn chrono_bogus_leap_second() {
        let date_time = chrono::DateTime::parse_from_rfc3339("2017-12-31T23:59:60Z").unwrap();

        assert_eq!(
            Instant::from_chrono_date_time(&date_time),
            Err(ConversionError::InvalidLeapSecond(epoch_seconds(2018, 1, 1) - 1))
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn to_chrono_date_time_errors() {
        assert_eq!(
            Instant::new(TimeScale::Tai, 0, 0).to_chrono_date_time(),
            Err(ConversionError::UnsupportedOperation(TimeScale::Tai))
        );
        assert_eq!(
            Instant::new(TimeScale::Posix, i64::MAX, 0).to_chrono_date_time(),
            Err(ConversionError::ArithmeticOverflow)
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn to_chrono_date_time_posix() {
        let instant = Instant::new(TimeScale::Posix, 915_153_825, 678_000_000);

        assert_eq!(
            instant.to_chrono_date_time().unwrap(),
            chrono::DateTime::parse_from_rfc3339("1999-01-01T01:23:45.678Z").unwrap()
        );
    }
}
