//! The TAI − UTC offsets of the leap-second era.

use crate::calendar::epoch_seconds;

/// A period of constant TAI − UTC offset.
///
/// The period covers the half-open interval of UTC epoch seconds
/// `[start_utc_secs, end_utc_secs)`. The last entry of a table is unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLeapEntry"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LeapEntry {
    start_utc_secs: i64,
    /// `i64::MAX` for an unbounded entry.
    end_utc_secs: i64,
    delta_secs: i64,
}

impl LeapEntry {
    /// Creates an entry valid from `start_utc_secs` (inclusive) to
    /// `end_utc_secs` (exclusive), or forever if `end_utc_secs` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if the interval is empty or if the start expressed on TAI
    /// overflows.
    pub const fn new(start_utc_secs: i64, end_utc_secs: Option<i64>, delta_secs: i64) -> Self {
        let end_utc_secs = match end_utc_secs {
            Some(end) => end,
            None => i64::MAX,
        };

        match Self::try_new(start_utc_secs, end_utc_secs, delta_secs) {
            Ok(entry) => entry,
            Err(msg) => panic!("{}", msg),
        }
    }

    /// `end_utc_secs` is `i64::MAX` for an unbounded entry.
    const fn try_new(
        start_utc_secs: i64,
        end_utc_secs: i64,
        delta_secs: i64,
    ) -> Result<Self, &'static str> {
        if start_utc_secs >= end_utc_secs {
            return Err("empty leap-second interval");
        }
        if start_utc_secs.checked_add(delta_secs).is_none() {
            return Err("leap-second entry start overflows on TAI");
        }

        Ok(Self {
            start_utc_secs,
            end_utc_secs,
            delta_secs,
        })
    }

    /// Returns the first UTC epoch second covered by this entry.
    pub const fn start_utc_secs(&self) -> i64 {
        self.start_utc_secs
    }

    /// Returns the UTC epoch second following the last second covered by this
    /// entry, or `None` if the entry is unbounded.
    pub const fn end_utc_secs(&self) -> Option<i64> {
        if self.end_utc_secs == i64::MAX {
            None
        } else {
            Some(self.end_utc_secs)
        }
    }

    /// Returns TAI − UTC in seconds.
    pub const fn delta_secs(&self) -> i64 {
        self.delta_secs
    }

    /// Returns the start of the entry as TAI epoch seconds.
    pub const fn start_tai_secs(&self) -> i64 {
        // Checked at construction.
        self.start_utc_secs + self.delta_secs
    }

    const fn contains_utc(&self, utc_secs: i64) -> bool {
        utc_secs >= self.start_utc_secs && utc_secs < self.end_utc_secs
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLeapEntry {
    start_utc_secs: i64,
    end_utc_secs: i64,
    delta_secs: i64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLeapEntry> for LeapEntry {
    type Error = &'static str;

    fn try_from(raw: RawLeapEntry) -> Result<Self, Self::Error> {
        Self::try_new(raw.start_utc_secs, raw.end_utc_secs, raw.delta_secs)
    }
}

/// An ordered, contiguous sequence of [`LeapEntry`]s.
///
/// Look-ups outside the covered range return the first or the last entry.
///
/// # Examples
///
/// ```
/// use utc_tai::{epoch_seconds, LeapTable};
///
/// let table = LeapTable::HISTORICAL;
///
/// // TAI - UTC was 32s during the year 2000.
/// let entry = table.entry_from_utc(epoch_seconds(2000, 6, 1));
/// assert_eq!(entry.delta_secs(), 32);
/// assert_eq!(entry.end_utc_secs(), Some(epoch_seconds(2006, 1, 1)));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct LeapTable<'a> {
    entries: &'a [LeapEntry],
}

impl<'a> LeapTable<'a> {
    /// The leap-second table as published by the IERS, from 1972-01-01
    /// (TAI − UTC = 10s) to the leap second inserted at the end of
    /// 2016-12-31 (TAI − UTC = 37s).
    pub const HISTORICAL: LeapTable<'static> = LeapTable {
        entries: &HISTORICAL_ENTRIES,
    };

    /// Creates a table from contiguous entries.
    ///
    /// Returns `None` if the slice is empty or if the entries are not
    /// contiguous. Since an entry never starts at `i64::MAX`, only the last
    /// entry can be unbounded.
    pub const fn new(entries: &'a [LeapEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let mut i = 1;
        while i < entries.len() {
            if entries[i - 1].end_utc_secs != entries[i].start_utc_secs {
                return None;
            }
            i += 1;
        }

        Some(Self { entries })
    }

    /// Returns all entries in chronological order.
    pub const fn entries(&self) -> &'a [LeapEntry] {
        self.entries
    }

    /// Returns the entry covering the provided UTC epoch second.
    pub fn entry_from_utc(&self, utc_secs: i64) -> &'a LeapEntry {
        &self.entries[self.index_from_utc(utc_secs)]
    }

    /// Returns the last entry starting at or before the provided TAI epoch
    /// second.
    pub fn entry_from_tai(&self, tai_secs: i64) -> &'a LeapEntry {
        let idx = self
            .entries
            .partition_point(|e| e.start_tai_secs() <= tai_secs)
            .saturating_sub(1);

        &self.entries[idx]
    }

    /// Returns the entry following the provided one, if any.
    pub fn next_entry(&self, entry: &LeapEntry) -> Option<&'a LeapEntry> {
        self.entries.get(self.index_from_utc(entry.start_utc_secs) + 1)
    }

    /// Returns the number of leap seconds inserted right after the provided
    /// UTC epoch second, which is non-zero only for the last second of a day
    /// ending with a leap second.
    ///
    /// # Examples
    ///
    /// ```
    /// use utc_tai::{epoch_seconds, LeapTable};
    ///
    /// let table = LeapTable::HISTORICAL;
    ///
    /// // 2016-12-31 23:59:59 UTC was followed by 23:59:60.
    /// assert_eq!(table.leap_seconds_after(epoch_seconds(2017, 1, 1) - 1), 1);
    /// assert_eq!(table.leap_seconds_after(epoch_seconds(2017, 1, 1)), 0);
    /// ```
    pub fn leap_seconds_after(&self, utc_secs: i64) -> i64 {
        let idx = self.index_from_utc(utc_secs);
        let entry = &self.entries[idx];
        if !entry.contains_utc(utc_secs) || utc_secs.checked_add(1) != Some(entry.end_utc_secs) {
            return 0;
        }

        match self.entries.get(idx + 1) {
            Some(next) if next.delta_secs > entry.delta_secs => next.delta_secs - entry.delta_secs,
            _ => 0,
        }
    }

    fn index_from_utc(&self, utc_secs: i64) -> usize {
        self.entries
            .partition_point(|e| e.start_utc_secs <= utc_secs)
            .saturating_sub(1)
    }
}

/// Start date and TAI − UTC offset of each period since 1972.
const HISTORICAL_DATA: [(i32, u8, u8, i64); 28] = [
    (1972, 1, 1, 10),
    (1972, 7, 1, 11),
    (1973, 1, 1, 12),
    (1974, 1, 1, 13),
    (1975, 1, 1, 14),
    (1976, 1, 1, 15),
    (1977, 1, 1, 16),
    (1978, 1, 1, 17),
    (1979, 1, 1, 18),
    (1980, 1, 1, 19),
    (1981, 7, 1, 20),
    (1982, 7, 1, 21),
    (1983, 7, 1, 22),
    (1985, 7, 1, 23),
    (1988, 1, 1, 24),
    (1990, 1, 1, 25),
    (1991, 1, 1, 26),
    (1992, 7, 1, 27),
    (1993, 7, 1, 28),
    (1994, 7, 1, 29),
    (1996, 1, 1, 30),
    (1997, 7, 1, 31),
    (1999, 1, 1, 32),
    (2006, 1, 1, 33),
    (2009, 1, 1, 34),
    (2012, 7, 1, 35),
    (2015, 7, 1, 36),
    (2017, 1, 1, 37),
];

const HISTORICAL_ENTRIES: [LeapEntry; 28] = build_historical_entries();

const fn build_historical_entries() -> [LeapEntry; 28] {
    let mut entries = [LeapEntry::new(0, None, 0); 28];
    let mut i = 0;
    while i < HISTORICAL_DATA.len() {
        let (year, month, day, delta_secs) = HISTORICAL_DATA[i];
        let end = if i + 1 < HISTORICAL_DATA.len() {
            let (year, month, day, _) = HISTORICAL_DATA[i + 1];
            Some(epoch_seconds(year, month, day))
        } else {
            None
        };
        entries[i] = LeapEntry::new(epoch_seconds(year, month, day), end, delta_secs);
        i += 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{START_LEAP_SECONDS, TAI_START_LEAP_SECONDS};

    #[test]
    fn historical_table_is_contiguous() {
        let table = LeapTable::new(LeapTable::HISTORICAL.entries()).unwrap();

        assert_eq!(table.entries().len(), 28);
        assert_eq!(table.entries()[0].start_utc_secs(), START_LEAP_SECONDS);
        assert_eq!(table.entries()[0].start_tai_secs(), TAI_START_LEAP_SECONDS);
        assert_eq!(table.entries()[27].end_utc_secs(), None);
    }

    #[test]
    fn deltas_never_decrease() {
        for pair in LeapTable::HISTORICAL.entries().windows(2) {
            assert!(pair[1].delta_secs() >= pair[0].delta_secs());
        }
    }

    #[test]
    fn lookup_from_utc() {
        let table = LeapTable::HISTORICAL;

        assert_eq!(table.entry_from_utc(START_LEAP_SECONDS).delta_secs(), 10);
        assert_eq!(table.entry_from_utc(epoch_seconds(1972, 7, 1) - 1).delta_secs(), 10);
        assert_eq!(table.entry_from_utc(epoch_seconds(1972, 7, 1)).delta_secs(), 11);
        assert_eq!(table.entry_from_utc(epoch_seconds(2009, 2, 13)).delta_secs(), 34);
        assert_eq!(table.entry_from_utc(epoch_seconds(2024, 1, 1)).delta_secs(), 37);
        assert_eq!(table.entry_from_utc(i64::MAX).delta_secs(), 37);
    }

    #[test]
    fn lookup_before_first_entry_is_clamped() {
        let table = LeapTable::HISTORICAL;

        assert_eq!(table.entry_from_utc(i64::MIN).delta_secs(), 10);
        assert_eq!(table.entry_from_tai(i64::MIN).delta_secs(), 10);
    }

    #[test]
    fn lookup_from_tai() {
        let table = LeapTable::HISTORICAL;
        let new_year_2017 = epoch_seconds(2017, 1, 1);

        // 2016-12-31 23:59:60 UTC is 2017-01-01 00:00:36 TAI.
        assert_eq!(table.entry_from_tai(new_year_2017 + 36).delta_secs(), 36);
        assert_eq!(table.entry_from_tai(new_year_2017 + 37).delta_secs(), 37);
    }

    #[test]
    fn next_entry() {
        let table = LeapTable::HISTORICAL;
        let first = table.entry_from_utc(START_LEAP_SECONDS);

        assert_eq!(table.next_entry(first).map(|e| e.delta_secs()), Some(11));

        let last = table.entry_from_utc(i64::MAX);
        assert_eq!(table.next_entry(last), None);
    }

    #[test]
    fn leap_seconds_after() {
        let table = LeapTable::HISTORICAL;

        assert_eq!(table.leap_seconds_after(epoch_seconds(1972, 7, 1) - 1), 1);
        assert_eq!(table.leap_seconds_after(epoch_seconds(1972, 7, 1) - 2), 0);
        assert_eq!(table.leap_seconds_after(epoch_seconds(1984, 1, 1) - 1), 0);
        assert_eq!(table.leap_seconds_after(START_LEAP_SECONDS - 1), 0);
        assert_eq!(table.leap_seconds_after(i64::MAX), 0);
    }

    #[test]
    fn invalid_tables() {
        let a = LeapEntry::new(0, Some(10), 1);
        let b = LeapEntry::new(11, None, 2);
        let c = LeapEntry::new(10, None, 2);

        assert!(LeapTable::new(&[]).is_none());
        assert!(LeapTable::new(&[a, b]).is_none());
        assert!(LeapTable::new(&[c, a]).is_none());
        assert!(LeapTable::new(&[a, c]).is_some());
    }

    #[test]
    fn unbounded_entry_must_be_last() {
        let unbounded = LeapEntry::new(0, None, 1);
        let bounded = LeapEntry::new(10, Some(20), 2);

        assert!(LeapTable::new(&[unbounded, bounded]).is_none());
        assert!(LeapTable::new(&[bounded, unbounded]).is_none());
        assert!(LeapTable::new(&[unbounded]).is_some());
    }

    #[test]
    #[should_panic]
    fn empty_entry() {
        LeapEntry::new(10, Some(10), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        for entry in LeapTable::HISTORICAL.entries() {
            let json = serde_json::to_string(entry).unwrap();

            assert_eq!(&serde_json::from_str::<LeapEntry>(&json).unwrap(), entry);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_invalid_entries() {
        let payloads = [
            r#"{"start_utc_secs":10,"end_utc_secs":10,"delta_secs":0}"#,
            r#"{"start_utc_secs":20,"end_utc_secs":10,"delta_secs":0}"#,
            r#"{"start_utc_secs":9223372036854775806,"end_utc_secs":9223372036854775807,
                "delta_secs":2}"#,
        ];

        for json in payloads {
            assert!(serde_json::from_str::<LeapEntry>(json).is_err(), "{}", json);
        }
    }
}
