//! Signed durations.

use core::ops::Neg;

use crate::{ConversionError, Instant, NANOS_PER_SEC};

/// A signed span of time with nanosecond precision.
///
/// Like [`Instant`], a duration is represented as a signed number of whole
/// seconds and a positive number of nanoseconds, so that `-1.5s` is stored as
/// `-2s + 500 000 000ns`.
///
/// # Examples
///
/// ```
/// use utc_tai::Duration;
///
/// let dt = -Duration::new(1, 500_000_000);
///
/// assert_eq!(dt.as_secs(), -2);
/// assert_eq!(dt.subsec_nanos(), 500_000_000);
/// assert!(dt.is_negative());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDuration"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration {
    /// Note that the automatic derivation of `PartialOrd` relies on
    /// lexicographical comparison so the `secs` field must appear before
    /// `nanos` in declaration order to be given higher priority.
    secs: i64,
    nanos: u32,
}

impl Duration {
    /// A null duration.
    pub const ZERO: Self = Self { secs: 0, nanos: 0 };

    /// The most negative representable duration.
    pub const MIN: Self = Self {
        secs: i64::MIN,
        nanos: 0,
    };

    /// The largest representable duration.
    pub const MAX: Self = Self {
        secs: i64::MAX,
        nanos: NANOS_PER_SEC - 1,
    };

    /// Creates a duration from a number of seconds, rounded towards `-∞`, and
    /// a positive number of nanoseconds.
    ///
    /// # Panics
    ///
    /// This constructor will panic if the number of nanoseconds is greater than
    /// or equal to 1 second.
    pub const fn new(secs: i64, subsec_nanos: u32) -> Self {
        assert!(
            subsec_nanos < NANOS_PER_SEC,
            "invalid number of nanoseconds"
        );

        Self {
            secs,
            nanos: subsec_nanos,
        }
    }

    /// Creates a duration from a number of seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Returns the number of whole seconds, rounded towards `-∞`.
    pub const fn as_secs(&self) -> i64 {
        self.secs
    }

    /// Returns the sub-second fractional part in nanoseconds.
    ///
    /// Nanoseconds always point towards `+∞`, even for negative durations.
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Returns `true` if the duration is strictly negative.
    pub const fn is_negative(&self) -> bool {
        self.secs < 0
    }

    /// Returns the opposite duration, or `None` if it cannot be represented.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::Duration;
    ///
    /// assert_eq!(
    ///     Duration::new(3, 250_000_000).checked_neg(),
    ///     Some(Duration::new(-4, 750_000_000))
    /// );
    /// assert_eq!(Duration::MIN.checked_neg(), None);
    /// ```
    pub const fn checked_neg(self) -> Option<Self> {
        if self.nanos == 0 {
            match self.secs.checked_neg() {
                Some(secs) => Some(Self { secs, nanos: 0 }),
                None => None,
            }
        } else {
            // -(s + n) = (-s - 1) + (1 - n), and `-s - 1` never overflows.
            Some(Self {
                secs: !self.secs,
                nanos: NANOS_PER_SEC - self.nanos,
            })
        }
    }

    /// Computes the duration from `start` to `end`.
    ///
    /// The duration is negative if `end` lies in the past of `start`. On the
    /// UTC scale the duration is computed between labels, a leap second being
    /// counted as part of the preceding second; elapsed time across leap
    /// seconds is obtained by converting both instants to TAI first.
    ///
    /// Returns an error if the instants are on different time scales or if
    /// the result overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{Duration, Instant, TimeScale};
    ///
    /// let t0 = Instant::new(TimeScale::Tai, 100, 200_000_000);
    /// let t1 = Instant::new(TimeScale::Tai, 101, 100_000_000);
    ///
    /// assert_eq!(Duration::between(t0, t1), Ok(Duration::new(0, 900_000_000)));
    /// assert_eq!(Duration::between(t1, t0), Ok(Duration::new(-1, 100_000_000)));
    /// ```
    pub fn between(start: Instant, end: Instant) -> Result<Self, ConversionError> {
        if start.scale() != end.scale() {
            return Err(ConversionError::ScaleMismatch(start.scale(), end.scale()));
        }

        let mut secs = end
            .epoch_seconds()
            .checked_sub(start.epoch_seconds())
            .ok_or(ConversionError::ArithmeticOverflow)?;

        let nanos = if end.nano_of_second() < start.nano_of_second() {
            secs = secs
                .checked_sub(1)
                .ok_or(ConversionError::ArithmeticOverflow)?;

            (end.nano_of_second() + NANOS_PER_SEC) - start.nano_of_second()
        } else {
            end.nano_of_second() - start.nano_of_second()
        };

        Ok(Self { secs, nanos })
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDuration {
    secs: i64,
    nanos: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDuration> for Duration {
    type Error = ConversionError;

    fn try_from(raw: RawDuration) -> Result<Self, Self::Error> {
        if raw.nanos >= NANOS_PER_SEC {
            return Err(ConversionError::InvalidNanosecond(raw.nanos));
        }

        Ok(Self {
            secs: raw.secs,
            nanos: raw.nanos,
        })
    }
}

impl Neg for Duration {
    type Output = Self;

    /// Negates a duration.
    ///
    /// # Panics
    ///
    /// This function panics if the result cannot be represented, which only
    /// happens for [`Duration::MIN`]. See [`Duration::checked_neg`] for a
    /// panic-free version.
    fn neg(self) -> Self {
        self.checked_neg().expect("overflow when negating duration")
    }
}

impl TryFrom<core::time::Duration> for Duration {
    type Error = ConversionError;

    fn try_from(value: core::time::Duration) -> Result<Self, Self::Error> {
        let secs = i64::try_from(value.as_secs()).map_err(|_| ConversionError::ArithmeticOverflow)?;

        Ok(Self {
            secs,
            nanos: value.subsec_nanos(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeScale;

    #[test]
    fn between_smoke() {
        let t0 = Instant::new(TimeScale::Tai, 100, 100_000_000);
        let t1 = Instant::new(TimeScale::Tai, 123, 223_456_789);

        assert_eq!(Duration::between(t0, t1), Ok(Duration::new(23, 123_456_789)));
    }

    #[test]
    fn between_is_antisymmetric() {
        let t0 = Instant::new(TimeScale::Posix, -7, 900_000_000);
        let t1 = Instant::new(TimeScale::Posix, 12_345, 100_000_000);

        let forward = Duration::between(t0, t1).unwrap();
        let backward = Duration::between(t1, t0).unwrap();

        assert_eq!(-forward, backward);
        assert_eq!(forward, -backward);
        assert_eq!(Duration::between(t0, t0), Ok(Duration::ZERO));
    }

    #[test]
    fn between_scale_mismatch() {
        let t0 = Instant::new(TimeScale::Tai, 0, 0);
        let t1 = Instant::new(TimeScale::Utc, 0, 0);

        assert_eq!(
            Duration::between(t0, t1),
            Err(ConversionError::ScaleMismatch(TimeScale::Tai, TimeScale::Utc))
        );
    }

    #[test]
    fn between_overflow() {
        let t0 = Instant::new(TimeScale::Tai, i64::MIN, 0);
        let t1 = Instant::new(TimeScale::Tai, i64::MAX, 0);

        assert_eq!(
            Duration::between(t0, t1),
            Err(ConversionError::ArithmeticOverflow)
        );
        assert_eq!(
            Duration::between(t1, t0),
            Err(ConversionError::ArithmeticOverflow)
        );
    }

    #[test]
    fn neg_extreme() {
        assert_eq!(-Duration::MAX, Duration::new(i64::MIN, 1));
        assert_eq!(Duration::new(i64::MIN, 1).checked_neg(), Some(Duration::MAX));
        assert_eq!(-Duration::ZERO, Duration::ZERO);
    }

    #[test]
    #[should_panic]
    fn neg_overflow() {
        let _ = -Duration::MIN;
    }

    #[test]
    fn ordering() {
        assert!(Duration::new(-1, 999_999_999) < Duration::ZERO);
        assert!(Duration::new(0, 1) > Duration::ZERO);
    }

    #[test]
    fn from_std_duration() {
        assert_eq!(
            Duration::try_from(core::time::Duration::new(5, 7)),
            Ok(Duration::new(5, 7))
        );
        assert_eq!(
            Duration::try_from(core::time::Duration::MAX),
            Err(ConversionError::ArithmeticOverflow)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let dt = Duration::new(-3, 999_999_999);
        let json = serde_json::to_string(&dt).unwrap();

        assert_eq!(serde_json::from_str::<Duration>(&json).unwrap(), dt);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_invalid_nanos() {
        let json = r#"{"secs":0,"nanos":4000000000}"#;

        assert!(serde_json::from_str::<Duration>(json).is_err());
    }
}
