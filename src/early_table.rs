//! The TAI − UTC relation before 1972.
//!
//! Between 1961 and 1972, UTC seconds were not SI seconds: UTC was steered by
//! a frequency offset so that TAI − UTC drifted linearly, and was occasionally
//! stepped by a fraction of a second. Each [`EarlyEntry`] describes one such
//! period; the steps at period boundaries show up as gaps (UTC labels that
//! were skipped) or overlaps (UTC labels that were repeated) within the last
//! second of a period.

use crate::calendar::{epoch_seconds, MJD_EPOCH, SECONDS_PER_DAY};
use crate::{Instant, TimeScale, NANOS_PER_SEC, START_LEAP_SECONDS, TAI_START_LEAP_SECONDS};

const NANOS_PER_DAY: i128 = SECONDS_PER_DAY as i128 * NANOS_PER_SEC as i128;

/// A period of linearly drifting TAI − UTC offset.
///
/// The period covers the half-open interval of UTC epoch seconds
/// `[start_secs, end_secs)`. Within the period, TAI − UTC in nanoseconds is:
///
/// ```text
/// offset_nanos + ⌊x · drift_nanos_per_day / 86 400 000 000 000⌋
/// ```
///
/// where `x` is the number of UTC nanoseconds elapsed since `reference_secs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawEarlyEntry"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EarlyEntry {
    start_secs: i64,
    end_secs: i64,
    offset_nanos: i64,
    reference_secs: i64,
    drift_nanos_per_day: i64,
    utc_gap_nanos: i64,
    start_tai: Instant,
}

impl EarlyEntry {
    /// Creates an entry.
    ///
    /// `utc_gap_nanos` is the size of the discontinuity at the end of the
    /// period: positive for a gap, negative for an overlap.
    ///
    /// # Panics
    ///
    /// Panics if the interval is empty, if the drift is negative, if the gap
    /// or overlap is not shorter than one second or if the start of the
    /// period cannot be expressed on TAI.
    pub const fn new(
        start_secs: i64,
        end_secs: i64,
        offset_nanos: i64,
        reference_secs: i64,
        drift_nanos_per_day: i64,
        utc_gap_nanos: i64,
    ) -> Self {
        match Self::try_new(
            start_secs,
            end_secs,
            offset_nanos,
            reference_secs,
            drift_nanos_per_day,
            utc_gap_nanos,
        ) {
            Ok(entry) => entry,
            Err(msg) => panic!("{}", msg),
        }
    }

    const fn try_new(
        start_secs: i64,
        end_secs: i64,
        offset_nanos: i64,
        reference_secs: i64,
        drift_nanos_per_day: i64,
        utc_gap_nanos: i64,
    ) -> Result<Self, &'static str> {
        if start_secs >= end_secs {
            return Err("empty UTC interval");
        }
        if drift_nanos_per_day < 0 {
            return Err("negative UTC drift");
        }
        if utc_gap_nanos.unsigned_abs() >= NANOS_PER_SEC as u64 {
            return Err("UTC gap not confined to the last second");
        }

        let start_tai = match utc_to_tai_parts(
            offset_nanos,
            reference_secs,
            drift_nanos_per_day,
            start_secs,
            0,
        ) {
            Some((secs, nanos)) => Instant::from_parts(TimeScale::Tai, secs, 0, nanos),
            None => return Err("start of UTC interval out of range on TAI"),
        };

        Ok(Self {
            start_secs,
            end_secs,
            offset_nanos,
            reference_secs,
            drift_nanos_per_day,
            utc_gap_nanos,
            start_tai,
        })
    }

    /// Returns the first UTC epoch second covered by this entry.
    pub const fn start_epoch_seconds(&self) -> i64 {
        self.start_secs
    }

    /// Returns the UTC epoch second following the last second covered by this
    /// entry.
    pub const fn end_epoch_seconds(&self) -> i64 {
        self.end_secs
    }

    /// Returns TAI − UTC in nanoseconds at `reference_secs`.
    pub const fn offset_nanos(&self) -> i64 {
        self.offset_nanos
    }

    /// Returns the UTC epoch second from which the drift is counted.
    pub const fn reference_epoch_seconds(&self) -> i64 {
        self.reference_secs
    }

    /// Returns the increase of TAI − UTC per UTC day, in nanoseconds.
    pub const fn drift_nanos_per_day(&self) -> i64 {
        self.drift_nanos_per_day
    }

    /// Returns the size of the discontinuity ending the period, in
    /// nanoseconds.
    ///
    /// A positive value means that the last `utc_gap_nanos` of the period
    /// never existed on UTC; a negative value means that the last
    /// `-utc_gap_nanos` of the period occurred twice.
    pub const fn utc_gap_nanos(&self) -> i64 {
        self.utc_gap_nanos
    }

    /// Returns the start of the period on TAI.
    pub const fn start_tai(&self) -> Instant {
        self.start_tai
    }

    /// Returns TAI − UTC in nanoseconds at the provided UTC instant, or `None`
    /// on overflow.
    pub const fn utc_delta_nanos(&self, utc_secs: i64, nano_of_second: u32) -> Option<i64> {
        match linear_delta_nanos(
            self.offset_nanos,
            self.reference_secs,
            self.drift_nanos_per_day,
            utc_secs,
            nano_of_second,
        ) {
            Some(delta) if delta >= i64::MIN as i128 && delta <= i64::MAX as i128 => {
                Some(delta as i64)
            }
            _ => None,
        }
    }

    /// Returns the TAI seconds and nanoseconds of the provided UTC instant
    /// according to this entry's relation, or `None` on overflow.
    ///
    /// The result is not clamped to the start of the next entry.
    pub const fn tai_parts(&self, utc_secs: i64, nano_of_second: u32) -> Option<(i64, u32)> {
        utc_to_tai_parts(
            self.offset_nanos,
            self.reference_secs,
            self.drift_nanos_per_day,
            utc_secs,
            nano_of_second,
        )
    }

    /// Returns the UTC seconds and nanoseconds whose TAI image according to
    /// this entry's relation is the latest not after the provided TAI
    /// instant, or `None` on overflow.
    ///
    /// The result is not restricted to the entry's UTC interval.
    pub fn utc_parts(&self, tai_secs: i64, nano_of_second: u32) -> Option<(i64, u32)> {
        let nanos_per_sec = NANOS_PER_SEC as i128;
        let offset = self.offset_nanos as i128;
        let drift = self.drift_nanos_per_day as i128;

        // Nanoseconds elapsed on TAI since the reference, which equals
        // `x + delta(x)` where `x` is the UTC elapsed time.
        let target = (tai_secs as i128 - self.reference_secs as i128)
            .checked_mul(nanos_per_sec)?
            .checked_add(nano_of_second as i128)?;
        let image = |x: i128| -> Option<i128> {
            x.checked_add(offset)?
                .checked_add(x.checked_mul(drift)?.div_euclid(NANOS_PER_DAY))
        };

        // First guess, then correct the rounding of the drift term.
        let mut x = (target - offset)
            .checked_mul(NANOS_PER_DAY)?
            .div_euclid(NANOS_PER_DAY + drift);
        while image(x.checked_add(1)?)? <= target {
            x += 1;
        }
        while image(x)? > target {
            x -= 1;
        }

        let utc_nanos = (self.reference_secs as i128)
            .checked_mul(nanos_per_sec)?
            .checked_add(x)?;

        split_nanos(utc_nanos)
    }
}

/// The serialized fields of an [`EarlyEntry`]; the TAI start is recomputed.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawEarlyEntry {
    start_secs: i64,
    end_secs: i64,
    offset_nanos: i64,
    reference_secs: i64,
    drift_nanos_per_day: i64,
    utc_gap_nanos: i64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawEarlyEntry> for EarlyEntry {
    type Error = &'static str;

    fn try_from(raw: RawEarlyEntry) -> Result<Self, Self::Error> {
        Self::try_new(
            raw.start_secs,
            raw.end_secs,
            raw.offset_nanos,
            raw.reference_secs,
            raw.drift_nanos_per_day,
            raw.utc_gap_nanos,
        )
    }
}

/// An ordered, contiguous sequence of [`EarlyEntry`]s.
///
/// Look-ups outside the covered range return the first or the last entry.
///
/// # Examples
///
/// ```
/// use utc_tai::{epoch_seconds, EarlyTable};
///
/// let table = EarlyTable::HISTORICAL;
///
/// // UTC was stepped forward by 100ms at the start of 1968-02-01.
/// let entry = table.entry_from_utc(epoch_seconds(1968, 1, 31));
/// assert_eq!(entry.end_epoch_seconds(), epoch_seconds(1968, 2, 1));
/// assert_eq!(entry.utc_gap_nanos(), 100_000_000);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct EarlyTable<'a> {
    entries: &'a [EarlyEntry],
}

impl<'a> EarlyTable<'a> {
    /// The UTC drift relations published by the USNO for 1961–1972, the
    /// first of which is extended back to 1958-01-01.
    pub const HISTORICAL: EarlyTable<'static> = EarlyTable {
        entries: &HISTORICAL_ENTRIES,
    };

    /// Creates a table from contiguous entries.
    ///
    /// Returns `None` if the slice is empty or if the entries are not
    /// contiguous.
    pub const fn new(entries: &'a [EarlyEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let mut i = 1;
        while i < entries.len() {
            if entries[i - 1].end_secs != entries[i].start_secs {
                return None;
            }
            i += 1;
        }

        Some(Self { entries })
    }

    /// Returns all entries in chronological order.
    pub const fn entries(&self) -> &'a [EarlyEntry] {
        self.entries
    }

    /// Returns the entry covering the provided UTC epoch second.
    pub fn entry_from_utc(&self, utc_secs: i64) -> &'a EarlyEntry {
        &self.entries[self.index_from_utc(utc_secs)]
    }

    /// Returns the last entry starting on TAI at or before the provided TAI
    /// instant.
    pub fn entry_from_tai(&self, tai_secs: i64, nano_of_second: u32) -> &'a EarlyEntry {
        let idx = self
            .entries
            .partition_point(|e| {
                (e.start_tai.epoch_seconds(), e.start_tai.nano_of_second())
                    <= (tai_secs, nano_of_second)
            })
            .saturating_sub(1);

        &self.entries[idx]
    }

    /// Returns the entry following the provided one, if any.
    pub fn next_entry(&self, entry: &EarlyEntry) -> Option<&'a EarlyEntry> {
        self.entries.get(self.index_from_utc(entry.start_secs) + 1)
    }

    fn index_from_utc(&self, utc_secs: i64) -> usize {
        self.entries
            .partition_point(|e| e.start_secs <= utc_secs)
            .saturating_sub(1)
    }
}

/// Returns TAI − UTC in nanoseconds, unbounded.
const fn linear_delta_nanos(
    offset_nanos: i64,
    reference_secs: i64,
    drift_nanos_per_day: i64,
    utc_secs: i64,
    nano_of_second: u32,
) -> Option<i128> {
    let elapsed = (utc_secs as i128 - reference_secs as i128) * NANOS_PER_SEC as i128
        + nano_of_second as i128;

    match elapsed.checked_mul(drift_nanos_per_day as i128) {
        Some(drift) => Some(offset_nanos as i128 + drift.div_euclid(NANOS_PER_DAY)),
        None => None,
    }
}

const fn utc_to_tai_parts(
    offset_nanos: i64,
    reference_secs: i64,
    drift_nanos_per_day: i64,
    utc_secs: i64,
    nano_of_second: u32,
) -> Option<(i64, u32)> {
    match linear_delta_nanos(
        offset_nanos,
        reference_secs,
        drift_nanos_per_day,
        utc_secs,
        nano_of_second,
    ) {
        Some(delta) => {
            split_nanos(utc_secs as i128 * NANOS_PER_SEC as i128 + nano_of_second as i128 + delta)
        }
        None => None,
    }
}

/// Splits a nanosecond count into seconds rounded towards `-∞` and a positive
/// number of nanoseconds.
const fn split_nanos(nanos: i128) -> Option<(i64, u32)> {
    let secs = nanos.div_euclid(NANOS_PER_SEC as i128);
    if secs < i64::MIN as i128 || secs > i64::MAX as i128 {
        return None;
    }

    Some((secs as i64, nanos.rem_euclid(NANOS_PER_SEC as i128) as u32))
}

/// Start date, TAI − UTC at the reference date in nanoseconds, reference date
/// as MJD and drift in nanoseconds per day of each period.
const HISTORICAL_DATA: [(i32, u8, u8, i64, i64, i64); 13] = [
    (1958, 1, 1, 1_422_818_000, 37_300, 1_296_000),
    (1961, 8, 1, 1_372_818_000, 37_300, 1_296_000),
    (1962, 1, 1, 1_845_858_000, 37_665, 1_123_200),
    (1963, 11, 1, 1_945_858_000, 37_665, 1_123_200),
    (1964, 1, 1, 3_240_130_000, 38_761, 1_296_000),
    (1964, 4, 1, 3_340_130_000, 38_761, 1_296_000),
    (1964, 9, 1, 3_440_130_000, 38_761, 1_296_000),
    (1965, 1, 1, 3_540_130_000, 38_761, 1_296_000),
    (1965, 3, 1, 3_640_130_000, 38_761, 1_296_000),
    (1965, 7, 1, 3_740_130_000, 38_761, 1_296_000),
    (1965, 9, 1, 3_840_130_000, 38_761, 1_296_000),
    (1966, 1, 1, 4_313_170_000, 39_126, 2_592_000),
    (1968, 2, 1, 4_213_170_000, 39_126, 2_592_000),
];

const HISTORICAL_ENTRIES: [EarlyEntry; 13] = build_historical_entries();

const fn build_historical_entries() -> [EarlyEntry; 13] {
    const fn delta_at(i: usize, utc_secs: i64) -> i128 {
        let (_, _, _, offset_nanos, reference_mjd, drift) = HISTORICAL_DATA[i];
        match linear_delta_nanos(
            offset_nanos,
            (reference_mjd - MJD_EPOCH) * SECONDS_PER_DAY,
            drift,
            utc_secs,
            0,
        ) {
            Some(delta) => delta,
            None => panic!("historical TAI - UTC out of range"),
        }
    }

    let mut entries = [EarlyEntry::new(0, 1, 0, 0, 0, 0); 13];
    let mut i = 0;
    while i < HISTORICAL_DATA.len() {
        let (year, month, day, offset_nanos, reference_mjd, drift) = HISTORICAL_DATA[i];
        let start = epoch_seconds(year, month, day);

        let (end, next_delta) = if i + 1 < HISTORICAL_DATA.len() {
            let (year, month, day, _, _, _) = HISTORICAL_DATA[i + 1];
            let end = epoch_seconds(year, month, day);
            (end, delta_at(i + 1, end))
        } else {
            let leap_delta = (TAI_START_LEAP_SECONDS - START_LEAP_SECONDS) as i128;
            (START_LEAP_SECONDS, leap_delta * NANOS_PER_SEC as i128)
        };
        let gap = delta_at(i, end) - next_delta;

        entries[i] = EarlyEntry::new(
            start,
            end,
            offset_nanos,
            (reference_mjd - MJD_EPOCH) * SECONDS_PER_DAY,
            drift,
            gap as i64,
        );
        i += 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::START_TAI;

    #[test]
    fn historical_table_is_contiguous() {
        let table = EarlyTable::new(EarlyTable::HISTORICAL.entries()).unwrap();
        let entries = table.entries();

        assert_eq!(entries.len(), 13);
        assert_eq!(entries[0].start_epoch_seconds(), START_TAI);
        assert_eq!(entries[12].end_epoch_seconds(), START_LEAP_SECONDS);
    }

    #[test]
    fn historical_gaps() {
        let gaps: [i64; 13] = [
            50_000_000,
            0,
            -100_000_000,
            0,
            -100_000_000,
            -100_000_000,
            -100_000_000,
            -100_000_000,
            -100_000_000,
            -100_000_000,
            0,
            100_000_000,
            -107_758_000,
        ];

        for (entry, gap) in EarlyTable::HISTORICAL.entries().iter().zip(gaps) {
            assert_eq!(entry.utc_gap_nanos(), gap);
        }
    }

    #[test]
    fn historical_deltas() {
        let table = EarlyTable::HISTORICAL;

        let new_year_1961 = epoch_seconds(1961, 1, 1);
        assert_eq!(
            table.entry_from_utc(new_year_1961).utc_delta_nanos(new_year_1961, 0),
            Some(1_422_818_000)
        );

        // The first relation extended back to 1958 is almost continuous with
        // the identity used before.
        assert_eq!(
            table.entries()[0].start_tai(),
            Instant::new(TimeScale::Tai, START_TAI, 2_402_000)
        );

        // 15ns of drift per UTC second with the 1961 relation.
        assert_eq!(
            table
                .entry_from_utc(new_year_1961)
                .utc_delta_nanos(new_year_1961 + 1, 500_000_000),
            Some(1_422_818_022)
        );

        let end = START_LEAP_SECONDS;
        assert_eq!(
            table.entry_from_utc(end - 1).utc_delta_nanos(end, 0),
            Some(9_892_242_000)
        );
    }

    #[test]
    fn lookup_from_utc() {
        let table = EarlyTable::HISTORICAL;
        let boundary = epoch_seconds(1965, 7, 1);

        assert_eq!(table.entry_from_utc(boundary - 1).end_epoch_seconds(), boundary);
        assert_eq!(table.entry_from_utc(boundary).start_epoch_seconds(), boundary);
        assert_eq!(table.entry_from_utc(i64::MIN).start_epoch_seconds(), START_TAI);
        assert_eq!(table.entry_from_utc(i64::MAX).end_epoch_seconds(), START_LEAP_SECONDS);
    }

    #[test]
    fn lookup_from_tai() {
        let table = EarlyTable::HISTORICAL;

        for entry in table.entries() {
            let start = entry.start_tai();
            assert_eq!(
                table.entry_from_tai(start.epoch_seconds(), start.nano_of_second()),
                entry
            );
        }
        assert_eq!(table.entry_from_tai(i64::MIN, 0), &table.entries()[0]);
    }

    #[test]
    fn next_entry() {
        let table = EarlyTable::HISTORICAL;
        let entries = table.entries();

        assert_eq!(table.next_entry(&entries[0]), Some(&entries[1]));
        assert_eq!(table.next_entry(&entries[12]), None);
    }

    #[test]
    fn inverse_relation() {
        let entry = EarlyTable::HISTORICAL.entries()[11];
        let utc_secs = epoch_seconds(1967, 3, 14) + 1234;

        for nanos in [0, 1, 29, 30, 31, 499_999_999, 999_999_999] {
            let (tai_secs, tai_nanos) = entry.tai_parts(utc_secs, nanos).unwrap();
            assert_eq!(entry.utc_parts(tai_secs, tai_nanos), Some((utc_secs, nanos)));
        }
    }

    #[test]
    fn synthetic_entry() {
        let entry = EarlyEntry::new(1000, 2000, 0, 1000, 0, 500_000_000);
        let table = EarlyTable::new(core::slice::from_ref(&entry)).unwrap();

        assert_eq!(table.entry_from_utc(1999), &entry);
        assert_eq!(entry.utc_delta_nanos(1999, 0), Some(0));
        assert_eq!(entry.start_tai(), Instant::new(TimeScale::Tai, 1000, 0));
    }

    #[test]
    fn invalid_tables() {
        let a = EarlyEntry::new(0, 10, 0, 0, 0, 0);
        let b = EarlyEntry::new(11, 20, 0, 0, 0, 0);

        assert!(EarlyTable::new(&[]).is_none());
        assert!(EarlyTable::new(&[a, b]).is_none());
    }

    #[test]
    #[should_panic]
    fn gap_longer_than_a_second() {
        EarlyEntry::new(0, 10, 0, 0, 0, 1_000_000_000);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        for entry in EarlyTable::HISTORICAL.entries() {
            let json = serde_json::to_string(entry).unwrap();

            assert_eq!(&serde_json::from_str::<EarlyEntry>(&json).unwrap(), entry);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_invalid_entries() {
        let payloads = [
            // Gap of one second.
            r#"{"start_secs":0,"end_secs":10,"offset_nanos":0,"reference_secs":0,
                "drift_nanos_per_day":0,"utc_gap_nanos":1000000000}"#,
            // Empty interval.
            r#"{"start_secs":10,"end_secs":10,"offset_nanos":0,"reference_secs":0,
                "drift_nanos_per_day":0,"utc_gap_nanos":0}"#,
            // Negative drift.
            r#"{"start_secs":0,"end_secs":10,"offset_nanos":0,"reference_secs":0,
                "drift_nanos_per_day":-1,"utc_gap_nanos":0}"#,
            // Start out of range on TAI.
            r#"{"start_secs":9223372036854775806,"end_secs":9223372036854775807,
                "offset_nanos":2000000000,"reference_secs":0,"drift_nanos_per_day":0,
                "utc_gap_nanos":0}"#,
        ];

        for json in payloads {
            assert!(serde_json::from_str::<EarlyEntry>(json).is_err(), "{}", json);
        }
    }
}
