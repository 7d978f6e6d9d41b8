//! Time scale tags.

use core::fmt;

/// The time scale on which an [`Instant`](crate::Instant) is expressed.
///
/// All scales count seconds from 1970-01-01 00:00:00 on their own clock: for
/// [`Tai`](TimeScale::Tai) this is 1970-01-01 00:00:00 TAI, for
/// [`Utc`](TimeScale::Utc) and [`Posix`](TimeScale::Posix) it is the Unix
/// epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeScale {
    /// International Atomic Time, a uniform scale without leap seconds.
    Tai,
    /// Coordinated Universal Time, including inserted leap seconds.
    Utc,
    /// UTC labels counted as in POSIX time, where every day lasts exactly
    /// 86 400 seconds and leap seconds cannot be represented.
    Posix,
}

impl TimeScale {
    /// Returns `true` if instants on this scale may carry a leap second.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::TimeScale;
    ///
    /// assert!(TimeScale::Utc.supports_leap_second());
    /// assert!(!TimeScale::Tai.supports_leap_second());
    /// assert!(!TimeScale::Posix.supports_leap_second());
    /// ```
    pub const fn supports_leap_second(self) -> bool {
        matches!(self, Self::Utc)
    }

    /// Returns the usual abbreviation of the scale.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tai => "TAI",
            Self::Utc => "UTC",
            Self::Posix => "POSIX",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(fmt)
    }
}
