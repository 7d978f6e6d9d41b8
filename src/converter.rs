//! Conversions between UTC and TAI.

use core::cmp::Ordering;

use crate::{
    ConversionError, Duration, EarlyTable, Instant, LeapTable, TimeScale, NANOS_PER_SEC,
    START_LEAP_SECONDS, START_TAI,
};

/// The classification of a UTC label with respect to the discontinuities of
/// UTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    /// The label designates exactly one instant.
    Valid,
    /// The label was repeated and designates two instants.
    Ambiguous,
    /// The label was skipped and designates no instant.
    Invalid,
}

/// A UTC/TAI converter backed by an early drift table and a leap-second
/// table.
///
/// The [`HISTORICAL`](Converter::HISTORICAL) converter uses the published
/// historical tables and is what the crate-level functions use. Custom
/// tables are mostly useful for testing.
///
/// # Examples
///
/// ```
/// use utc_tai::{epoch_seconds, Converter, Instant, TimeScale};
///
/// let converter = Converter::HISTORICAL;
///
/// // 2000-01-01 00:00:00.25 UTC is 32.25s later on TAI.
/// let utc = epoch_seconds(2000, 1, 1);
/// let tai = converter.to_tai(utc, 250_000_000).unwrap();
/// assert_eq!(tai, Instant::new(TimeScale::Tai, utc + 32, 250_000_000));
///
/// // And back.
/// assert_eq!(
///     converter.from_tai(&tai),
///     Ok(Instant::new(TimeScale::Utc, utc, 250_000_000))
/// );
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Converter<'a> {
    early: EarlyTable<'a>,
    leap: LeapTable<'a>,
}

impl<'a> Converter<'a> {
    /// A converter using the historical tables.
    pub const HISTORICAL: Converter<'static> = Converter {
        early: EarlyTable::HISTORICAL,
        leap: LeapTable::HISTORICAL,
    };

    /// Creates a converter from custom tables.
    ///
    /// The early table is only consulted for UTC instants between
    /// [`START_TAI`] and [`START_LEAP_SECONDS`], and the leap-second table
    /// after [`START_LEAP_SECONDS`].
    pub const fn new(early: EarlyTable<'a>, leap: LeapTable<'a>) -> Self {
        Self { early, leap }
    }

    /// Returns the table used before 1972.
    pub const fn early_table(&self) -> &EarlyTable<'a> {
        &self.early
    }

    /// Returns the table used from 1972.
    pub const fn leap_table(&self) -> &LeapTable<'a> {
        &self.leap
    }

    /// Converts a UTC instant outside any leap second to TAI.
    ///
    /// See [`to_tai_with_leap_second`](Self::to_tai_with_leap_second).
    pub fn to_tai(&self, utc_secs: i64, nano_of_second: u32) -> Result<Instant, ConversionError> {
        self.to_tai_with_leap_second(utc_secs, 0, nano_of_second)
    }

    /// Converts a UTC instant to TAI.
    ///
    /// Before 1958, UTC and TAI coincide by convention. Between 1958 and 1972
    /// the drifting offset of the early table is applied; a UTC label that
    /// falls within a gap is mapped to the first TAI instant following the
    /// gap. From 1972 onward, the leap-second offset is applied and the
    /// `leap_second` argument, which is ignored before 1972, designates an
    /// inserted leap second following `utc_secs`.
    ///
    /// Returns an error if the number of nanoseconds is greater than or equal
    /// to 1 second or if the result overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, Converter, Instant, TimeScale};
    ///
    /// let converter = Converter::HISTORICAL;
    ///
    /// // 2016-12-31 23:59:59 UTC, then 23:59:60 UTC.
    /// let utc = epoch_seconds(2017, 1, 1) - 1;
    /// assert_eq!(
    ///     converter.to_tai_with_leap_second(utc, 0, 0),
    ///     Ok(Instant::new(TimeScale::Tai, utc + 36, 0))
    /// );
    /// assert_eq!(
    ///     converter.to_tai_with_leap_second(utc, 1, 0),
    ///     Ok(Instant::new(TimeScale::Tai, utc + 37, 0))
    /// );
    /// ```
    pub fn to_tai_with_leap_second(
        &self,
        utc_secs: i64,
        leap_second: u32,
        nano_of_second: u32,
    ) -> Result<Instant, ConversionError> {
        if nano_of_second >= NANOS_PER_SEC {
            return Err(ConversionError::InvalidNanosecond(nano_of_second));
        }

        if utc_secs < START_TAI {
            return Ok(Instant::from_parts(TimeScale::Tai, utc_secs, 0, nano_of_second));
        }
        if utc_secs < START_LEAP_SECONDS {
            return self.early_to_tai(utc_secs, nano_of_second);
        }

        let entry = self.leap.entry_from_utc(utc_secs);
        let secs = utc_secs
            .checked_add(entry.delta_secs())
            .and_then(|secs| secs.checked_add(leap_second as i64))
            .ok_or(ConversionError::ArithmeticOverflow)?;

        Ok(Instant::from_parts(TimeScale::Tai, secs, 0, nano_of_second))
    }

    /// Converts an instant on any scale to TAI.
    ///
    /// TAI instants are returned unchanged and POSIX instants are treated as
    /// UTC instants outside any leap second.
    pub fn instant_to_tai(&self, instant: &Instant) -> Result<Instant, ConversionError> {
        match instant.scale() {
            TimeScale::Tai => Ok(*instant),
            TimeScale::Utc => self.to_tai_with_leap_second(
                instant.epoch_seconds(),
                instant.leap_second(),
                instant.nano_of_second(),
            ),
            TimeScale::Posix => self.to_tai(instant.epoch_seconds(), instant.nano_of_second()),
        }
    }

    /// Converts a TAI instant to UTC.
    ///
    /// TAI instants that fall within an inserted leap second are mapped to a
    /// UTC instant with a non-zero leap second. Before 1972, TAI instants
    /// that follow a repeated UTC range are mapped to the second occurrence
    /// of the repeated labels.
    ///
    /// For any UTC instant classified as [`Validity::Valid`], converting to
    /// TAI and back yields the original instant.
    ///
    /// Returns an error if the instant is not on the TAI scale or if the
    /// result overflows.
    pub fn from_tai(&self, tai: &Instant) -> Result<Instant, ConversionError> {
        if tai.scale() != TimeScale::Tai {
            return Err(ConversionError::ScaleMismatch(TimeScale::Tai, tai.scale()));
        }

        let (secs, nanos) = (tai.epoch_seconds(), tai.nano_of_second());
        if secs < START_TAI {
            return Ok(Instant::from_parts(TimeScale::Utc, secs, 0, nanos));
        }
        if secs < self.leap.entries()[0].start_tai_secs() {
            return self.early_from_tai(secs, nanos);
        }

        let entry = self.leap.entry_from_tai(secs);
        let utc_secs = secs
            .checked_sub(entry.delta_secs())
            .ok_or(ConversionError::ArithmeticOverflow)?;

        match entry.end_utc_secs() {
            Some(end) if utc_secs >= end => {
                let last_second = end - 1;
                let leap = u32::try_from(utc_secs - last_second)
                    .map_err(|_| ConversionError::ArithmeticOverflow)?;

                Ok(Instant::from_parts(TimeScale::Utc, last_second, leap, nanos))
            }
            _ => Ok(Instant::from_parts(TimeScale::Utc, utc_secs, 0, nanos)),
        }
    }

    /// Classifies a UTC instant between 1958 and 1972 against the early
    /// table.
    ///
    /// Gaps and overlaps only affect the last second of a period of the early
    /// table, so all other instants are valid.
    pub fn check_early_validity(&self, instant: &Instant) -> Validity {
        let secs = instant.epoch_seconds();
        let entry = self.early.entry_from_utc(secs);
        let gap = entry.utc_gap_nanos();

        if gap == 0 || secs != entry.end_epoch_seconds() - 1 {
            return Validity::Valid;
        }
        if (instant.nano_of_second() as i64) <= NANOS_PER_SEC as i64 - gap.abs() {
            return Validity::Valid;
        }

        if gap < 0 {
            Validity::Ambiguous
        } else {
            Validity::Invalid
        }
    }

    /// Classifies an instant against all discontinuities of UTC.
    ///
    /// TAI instants are always valid. For UTC and POSIX instants, labels
    /// before 1958 are valid, labels between 1958 and 1972 are classified by
    /// [`check_early_validity`](Self::check_early_validity), and later labels
    /// are valid unless they carry a leap second that was not inserted. The
    /// POSIX label of the second preceding an inserted leap second is
    /// ambiguous since POSIX time repeats it.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, Converter, Instant, TimeScale, Validity};
    ///
    /// let converter = Converter::HISTORICAL;
    ///
    /// // UTC skipped 1968-01-31 23:59:59.9 to 1968-02-01 00:00:00.
    /// let skipped = Instant::new(TimeScale::Utc, epoch_seconds(1968, 2, 1) - 1, 950_000_000);
    /// assert_eq!(converter.validity(&skipped), Validity::Invalid);
    /// ```
    pub fn validity(&self, instant: &Instant) -> Validity {
        let secs = instant.epoch_seconds();
        match instant.scale() {
            TimeScale::Tai => Validity::Valid,
            _ if secs < START_TAI => Validity::Valid,
            _ if secs < START_LEAP_SECONDS => self.check_early_validity(instant),
            TimeScale::Utc => {
                if instant.leap_second() as i64 > self.leap.leap_seconds_after(secs) {
                    Validity::Invalid
                } else {
                    Validity::Valid
                }
            }
            TimeScale::Posix => {
                if self.leap.leap_seconds_after(secs) > 0 {
                    Validity::Ambiguous
                } else {
                    Validity::Valid
                }
            }
        }
    }

    /// Adjusts the result of label arithmetic performed on a UTC-based
    /// instant so that it does not fall within a gap of the early table.
    ///
    /// A result within a gap is moved forward to the end of the gap if the
    /// arithmetic moved forward in time (or not at all), and backward to the
    /// last valid nanosecond before the gap otherwise. The result is on the
    /// scale of `original`, and TAI results are never adjusted.
    ///
    /// Returns an error if the number of nanoseconds is greater than or equal
    /// to 1 second.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, Converter, Instant, TimeScale};
    ///
    /// let converter = Converter::HISTORICAL;
    ///
    /// // The last 100ms of 1968-01-31 were skipped.
    /// let gap_start = epoch_seconds(1968, 2, 1) - 1;
    /// let original = Instant::new(TimeScale::Utc, gap_start - 10, 0);
    ///
    /// assert_eq!(
    ///     converter.adjust_utc_around_gaps(&original, gap_start, 950_000_000),
    ///     Ok(Instant::new(TimeScale::Utc, gap_start + 1, 0))
    /// );
    /// ```
    pub fn adjust_utc_around_gaps(
        &self,
        original: &Instant,
        result_secs: i64,
        result_nanos: u32,
    ) -> Result<Instant, ConversionError> {
        if result_nanos >= NANOS_PER_SEC {
            return Err(ConversionError::InvalidNanosecond(result_nanos));
        }

        let scale = original.scale();
        if scale != TimeScale::Tai && (START_TAI..START_LEAP_SECONDS).contains(&result_secs) {
            let entry = self.early.entry_from_utc(result_secs);
            let gap = entry.utc_gap_nanos();

            if gap > 0
                && result_secs + 1 == entry.end_epoch_seconds()
                && result_nanos as i64 > NANOS_PER_SEC as i64 - gap
            {
                let direction = match original.epoch_seconds().cmp(&result_secs) {
                    Ordering::Equal => original.nano_of_second().cmp(&result_nanos),
                    ordering => ordering,
                };

                return Ok(if direction == Ordering::Greater {
                    Instant::from_parts(scale, result_secs, 0, (NANOS_PER_SEC as i64 - gap) as u32)
                } else {
                    Instant::from_parts(scale, result_secs + 1, 0, 0)
                });
            }
        }

        Ok(Instant::from_parts(scale, result_secs, 0, result_nanos))
    }

    /// Adds a duration to the labels of an instant.
    ///
    /// On UTC and POSIX, the duration is added to the label as if every day
    /// lasted 86 400 seconds, a leap second being counted as part of the
    /// preceding second, and the result is then moved out of any gap with
    /// [`adjust_utc_around_gaps`](Self::adjust_utc_around_gaps). On TAI, this
    /// is the same as [`Instant::simple_add`].
    ///
    /// Returns an error if the result overflows.
    pub fn add_nominal(
        &self,
        instant: &Instant,
        rhs: Duration,
    ) -> Result<Instant, ConversionError> {
        if instant.scale() == TimeScale::Tai {
            return instant.simple_add(rhs);
        }

        let raw = Instant::from_parts(
            TimeScale::Posix,
            instant.epoch_seconds(),
            0,
            instant.nano_of_second(),
        )
        .simple_add(rhs)?;

        self.adjust_utc_around_gaps(instant, raw.epoch_seconds(), raw.nano_of_second())
    }

    /// Adds an elapsed duration to an instant.
    ///
    /// The instant is converted to TAI, the duration is added, and the result
    /// is converted back to the original scale, so that leap seconds and the
    /// rate difference of early UTC are accounted for. A POSIX result falling
    /// within a leap second is labelled with the preceding second.
    ///
    /// Returns an error if the result overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, Converter, Duration, Instant, TimeScale};
    ///
    /// let converter = Converter::HISTORICAL;
    ///
    /// // Two seconds after 2016-12-31 23:59:59 UTC is 2017-01-01 00:00:00 UTC.
    /// let new_year = epoch_seconds(2017, 1, 1);
    /// let t = Instant::new(TimeScale::Utc, new_year - 1, 0);
    /// assert_eq!(
    ///     converter.add_elapsed(&t, Duration::from_secs(2)),
    ///     Ok(Instant::new(TimeScale::Utc, new_year, 0))
    /// );
    /// ```
    pub fn add_elapsed(
        &self,
        instant: &Instant,
        rhs: Duration,
    ) -> Result<Instant, ConversionError> {
        let tai = self.instant_to_tai(instant)?.simple_add(rhs)?;

        match instant.scale() {
            TimeScale::Tai => Ok(tai),
            TimeScale::Utc => self.from_tai(&tai),
            TimeScale::Posix => {
                let utc = self.from_tai(&tai)?;

                Ok(Instant::from_parts(
                    TimeScale::Posix,
                    utc.epoch_seconds(),
                    0,
                    utc.nano_of_second(),
                ))
            }
        }
    }

    fn early_to_tai(&self, utc_secs: i64, nano_of_second: u32) -> Result<Instant, ConversionError> {
        let entry = self.early.entry_from_utc(utc_secs);
        let (secs, nanos) = entry
            .tai_parts(utc_secs, nano_of_second)
            .ok_or(ConversionError::ArithmeticOverflow)?;
        let tai = Instant::from_parts(TimeScale::Tai, secs, 0, nanos);

        // Labels within a gap would otherwise overlap the next period.
        match self.early.next_entry(entry) {
            Some(next) if tai >= next.start_tai() => Ok(next.start_tai()),
            _ => Ok(tai),
        }
    }

    fn early_from_tai(
        &self,
        tai_secs: i64,
        nano_of_second: u32,
    ) -> Result<Instant, ConversionError> {
        let first = &self.early.entries()[0];
        let first_tai = first.start_tai();
        if (tai_secs, nano_of_second) < (first_tai.epoch_seconds(), first_tai.nano_of_second()) {
            return Ok(Instant::from_parts(TimeScale::Utc, first.start_epoch_seconds(), 0, 0));
        }

        let entry = self.early.entry_from_tai(tai_secs, nano_of_second);
        let (mut utc_secs, mut utc_nanos) = entry
            .utc_parts(tai_secs, nano_of_second)
            .ok_or(ConversionError::ArithmeticOverflow)?;

        // Past the end of the period, the instant belongs to the second
        // occurrence of a repeated UTC range, labelled by the next relation.
        if utc_secs >= entry.end_epoch_seconds() {
            (utc_secs, utc_nanos) = match self.early.next_entry(entry) {
                Some(next) => next
                    .utc_parts(tai_secs, nano_of_second)
                    .ok_or(ConversionError::ArithmeticOverflow)?,
                None => (
                    tai_secs
                        .checked_sub(self.leap.entries()[0].delta_secs())
                        .ok_or(ConversionError::ArithmeticOverflow)?,
                    nano_of_second,
                ),
            };
        }

        Ok(Instant::from_parts(TimeScale::Utc, utc_secs, 0, utc_nanos))
    }
}
