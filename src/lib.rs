//! Exact, nanosecond-precision conversions between the UTC and TAI time
//! scales, including the pre-1972 era of drifting UTC.
//!
//! # Overview
//!
//! Since 1972, UTC differs from the [TAI] atomic time scale by an integral
//! number of seconds that increases each time a leap second is inserted.
//! Between 1961 and 1972, however, UTC seconds were slightly longer than TAI
//! seconds and the TAI − UTC difference drifted linearly, with occasional
//! fractional steps that either skipped or repeated short ranges of UTC labels.
//!
//! This crate models both eras exactly:
//!
//! - an [`Instant`] is a point in time on a [`TimeScale`] (TAI, UTC or POSIX),
//!   represented as 64-bit signed seconds since 1970-01-01 00:00:00 on that
//!   scale, a leap second counter and a positive number of nanoseconds,
//! - the [`EarlyTable`] holds the piecewise-linear TAI − UTC relation from 1958
//!   to 1972 and the [`LeapTable`] the leap seconds since 1972,
//! - a [`Converter`] maps UTC instants to TAI and back, classifies UTC labels
//!   as valid, ambiguous or invalid ([`Validity`]), and performs nominal
//!   (label) or elapsed arithmetic on UTC instants.
//!
//! All arithmetic on the early table is carried out on integers with
//! 128-bit intermediates, so that conversions are exact to the nanosecond and
//! deterministic. Before 1958, UTC and TAI coincide by convention.
//!
//! [TAI]: https://en.wikipedia.org/wiki/International_Atomic_Time
//!
//!
//! # Design choices and limitations
//!
//! The leap-second table is compiled into the crate and ends with the leap
//! second inserted at the end of 2016. Instants past the end of the table are
//! converted with the last known offset, so an outdated version of this crate
//! will silently ignore leap seconds introduced after its release. Custom
//! tables can be provided with [`Converter::new`].
//!
//! No date-time parsing or formatting facilities are provided. These can be
//! performed using other crates such as [chrono] (see [features
//! flags](#support-for-time-related-crates)).
//!
//! [chrono]: https://crates.io/crates/chrono
//!
//!
//! # Features flags
//!
//! ### Support for `no-std`
//!
//! By default, this crate enables the `std` feature to access the operating
//! system clock and allow conversion from `time::SystemTime`, but specifying
//! `default-features = false` makes it `no-std`-compatible.
//!
//! ### Support for time-related crates
//!
//! Conversion methods to and from UTC date-time stamps from the [chrono] crate
//! are available with the `chrono` feature. This may also be used to parse and
//! format dates.
//!
//! ### TAI system clock
//!
//! On Linux and Android, the `tai_clock` feature provides
//! [`Instant::now_tai`], which reads the `CLOCK_TAI` system clock.
//!
//! ### Serialization
//!
//! `Instant`, `Duration`, the table entries and the error types can be
//! (de)serialized with `serde` by activating the `serde` feature.
//!
//! ### Embedded logging
//!
//! The same types implement `defmt::Format` when the `defmt` feature is
//! activated.
//!
//!
//! # Examples
//!
//! ```
//! use utc_tai::{epoch_seconds, Converter, Duration, Instant, TimeScale, Validity};
//!
//! // 2016-12-31 23:59:60.5 UTC, within the last inserted leap second.
//! let utc = Instant::from_date_time(TimeScale::Utc, 2016, 12, 31, 23, 59, 60, 500_000_000).unwrap();
//!
//! // TAI was 37s ahead of UTC after that leap second.
//! let tai = utc_tai::to_tai_with_leap_second(utc.epoch_seconds(), utc.leap_second(), 500_000_000).unwrap();
//! assert_eq!(tai.epoch_seconds(), epoch_seconds(2017, 1, 1) + 36);
//!
//! // One elapsed second later it is 2017-01-01 00:00:00.5 UTC.
//! let converter = Converter::HISTORICAL;
//! let later = converter.add_elapsed(&utc, Duration::from_secs(1)).unwrap();
//! assert_eq!(later, Instant::new(TimeScale::Utc, epoch_seconds(2017, 1, 1), 500_000_000));
//!
//! // UTC skipped the last 100ms of 1968-01-31.
//! let skipped = Instant::new(TimeScale::Utc, epoch_seconds(1968, 2, 1) - 1, 950_000_000);
//! assert_eq!(utc_tai::check_early_validity(&skipped), Validity::Invalid);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod calendar;
mod clock;
mod converter;
mod duration;
mod early_table;
mod errors;
mod instant;
mod leap_table;
mod scale;

pub use calendar::{
    epoch_seconds, julian_day_number, modified_julian_day, MJD_EPOCH, SECONDS_PER_DAY,
};
#[cfg(feature = "std")]
pub use clock::TaiClock;
pub use converter::{Converter, Validity};
pub use duration::Duration;
pub use early_table::{EarlyEntry, EarlyTable};
pub use errors::{ConversionError, DateTimeError};
pub use instant::Instant;
pub use leap_table::{LeapEntry, LeapTable};
pub use scale::TimeScale;

/// The number of nanoseconds in one second.
pub const NANOS_PER_SEC: u32 = 1_000_000_000;

/// 1958-01-01 00:00:00, in epoch seconds, the origin of TAI.
///
/// UTC and TAI coincide before this instant.
pub const START_TAI: i64 = epoch_seconds(1958, 1, 1);

/// 1972-01-01 00:00:00 UTC, in UTC epoch seconds, the start of the
/// leap-second era.
pub const START_LEAP_SECONDS: i64 = epoch_seconds(1972, 1, 1);

/// 1972-01-01 00:00:00 UTC, in TAI epoch seconds.
pub const TAI_START_LEAP_SECONDS: i64 = START_LEAP_SECONDS + 10;

/// Converts a UTC instant outside any leap second to TAI with the historical
/// tables.
///
/// See [`Converter::to_tai_with_leap_second`].
///
/// # Examples
///
/// ```
/// use utc_tai::{Instant, TimeScale, START_LEAP_SECONDS, TAI_START_LEAP_SECONDS};
///
/// assert_eq!(
///     utc_tai::to_tai(START_LEAP_SECONDS, 0),
///     Ok(Instant::new(TimeScale::Tai, TAI_START_LEAP_SECONDS, 0))
/// );
/// ```
pub fn to_tai(utc_secs: i64, nano_of_second: u32) -> Result<Instant, ConversionError> {
    Converter::HISTORICAL.to_tai(utc_secs, nano_of_second)
}

/// Converts a UTC instant to TAI with the historical tables.
///
/// See [`Converter::to_tai_with_leap_second`].
pub fn to_tai_with_leap_second(
    utc_secs: i64,
    leap_second: u32,
    nano_of_second: u32,
) -> Result<Instant, ConversionError> {
    Converter::HISTORICAL.to_tai_with_leap_second(utc_secs, leap_second, nano_of_second)
}

/// Classifies a UTC instant between 1958 and 1972 with the historical early
/// table.
///
/// See [`Converter::check_early_validity`].
pub fn check_early_validity(instant: &Instant) -> Validity {
    Converter::HISTORICAL.check_early_validity(instant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(START_TAI, -378_691_200);
        assert_eq!(START_LEAP_SECONDS, 63_072_000);
        assert_eq!(TAI_START_LEAP_SECONDS, 63_072_010);
        assert_eq!(MJD_EPOCH, 40_587);
    }

    #[test]
    fn historical_functions() {
        let utc = epoch_seconds(2009, 2, 13);

        assert_eq!(to_tai(utc, 7), Ok(Instant::new(TimeScale::Tai, utc + 34, 7)));
        assert_eq!(
            to_tai_with_leap_second(START_LEAP_SECONDS - 1, 1, 0),
            to_tai(START_LEAP_SECONDS - 1, 0)
        );
        let repeated = Instant::new(TimeScale::Utc, START_LEAP_SECONDS - 1, 950_000_000);
        assert_eq!(check_early_validity(&repeated), Validity::Ambiguous);
    }

    #[test]
    fn tai_continuity_across_eras() {
        // The last nanosecond of 1971 is followed by a 107.758ms overlap.
        let before = to_tai(START_LEAP_SECONDS - 1, 999_999_999).unwrap();
        let after = to_tai(START_LEAP_SECONDS, 0).unwrap();

        assert_eq!(Duration::between(before, after), Ok(Duration::new(0, 107_758_002)));
    }
}
