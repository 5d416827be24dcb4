//! Draws and the historical draw feed.

use arrayvec::ArrayVec;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ingest::{self, DataFormatError};

/// Numbers per draw and per prediction.
pub const DRAW_SIZE: usize = 15;
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 25;

/// Why a list of numbers cannot form a [`NumberSet`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NumberSetError {
    #[display("number {number} is outside {MIN_NUMBER}..={MAX_NUMBER}")]
    OutOfRange { number: u8 },
    #[display("number {number} appears more than once")]
    Duplicate { number: u8 },
    #[display("more than {DRAW_SIZE} numbers")]
    TooMany,
    #[display("expected {DRAW_SIZE} numbers, found {found}")]
    Incomplete { found: usize },
}

/// Up to 15 distinct numbers in `1..=25`, kept in insertion order.
///
/// Membership is tracked in a bit mask, so [`Self::contains`] and
/// [`Self::intersection_count`] are constant time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct NumberSet {
    numbers: ArrayVec<u8, DRAW_SIZE>,
    mask: u32,
}

impl NumberSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `numbers`, rejecting duplicates and out-of-range values.
    pub fn from_numbers(numbers: &[u8]) -> Result<Self, NumberSetError> {
        let mut set = Self::new();
        for &number in numbers {
            if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
                return Err(NumberSetError::OutOfRange { number });
            }
            if set.contains(number) {
                return Err(NumberSetError::Duplicate { number });
            }
            if set.is_full() {
                return Err(NumberSetError::TooMany);
            }
            set.push_unchecked(number);
        }
        Ok(set)
    }

    /// Inserts `number` if it is in range, not yet present and the set is not full.
    ///
    /// Returns `true` if the number was inserted.
    pub fn insert(&mut self, number: u8) -> bool {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) || self.contains(number) || self.is_full() {
            return false;
        }
        self.push_unchecked(number);
        true
    }

    fn push_unchecked(&mut self, number: u8) {
        self.numbers.push(number);
        self.mask |= 1 << number;
    }

    #[must_use]
    pub fn contains(&self, number: u8) -> bool {
        number < 32 && self.mask & (1 << number) != 0
    }

    /// Number of values present in both sets.
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> usize {
        (self.mask & other.mask).count_ones() as usize
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.numbers.is_full()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.numbers
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.numbers.iter().copied()
    }

    /// Returns the numbers in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<u8> {
        (MIN_NUMBER..=MAX_NUMBER).filter(|&n| self.contains(n)).collect()
    }
}

impl TryFrom<Vec<u8>> for NumberSet {
    type Error = NumberSetError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_numbers(&numbers)
    }
}

impl From<NumberSet> for Vec<u8> {
    fn from(set: NumberSet) -> Self {
        set.numbers.to_vec()
    }
}

/// One contest's result: exactly 15 distinct numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DrawRecord")]
pub struct Draw {
    contest_index: u32,
    date: NaiveDate,
    numbers: NumberSet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawRecord {
    contest_index: u32,
    date: NaiveDate,
    numbers: NumberSet,
}

impl TryFrom<DrawRecord> for Draw {
    type Error = NumberSetError;

    fn try_from(record: DrawRecord) -> Result<Self, Self::Error> {
        Self::new(record.contest_index, record.date, record.numbers)
    }
}

impl Draw {
    pub fn new(
        contest_index: u32,
        date: NaiveDate,
        numbers: NumberSet,
    ) -> Result<Self, NumberSetError> {
        if !numbers.is_full() {
            return Err(NumberSetError::Incomplete { found: numbers.len() });
        }
        Ok(Self {
            contest_index,
            date,
            numbers,
        })
    }

    #[must_use]
    pub fn contest_index(&self) -> u32 {
        self.contest_index
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn numbers(&self) -> &NumberSet {
        &self.numbers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("draw index {index} out of range for feed of length {len}")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

/// The historical dataset: an immutable, indexable sequence of draws.
///
/// Wrapping around for repeated passes is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct DrawFeed {
    draws: Vec<Draw>,
}

impl DrawFeed {
    #[must_use]
    pub fn new(draws: Vec<Draw>) -> Self {
        Self { draws }
    }

    /// Parses a CSV export (header line first). See [`ingest::parse_csv`].
    pub fn from_csv_str(text: &str) -> Result<Self, DataFormatError> {
        Ok(Self::new(ingest::parse_csv(text)?))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Draw, IndexError> {
        self.draws.get(index).ok_or(IndexError {
            index,
            len: self.draws.len(),
        })
    }

    #[must_use]
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a feed of `len` draws whose numbers rotate through the domain.
    pub(crate) fn sample_feed(len: usize) -> DrawFeed {
        let start = NaiveDate::from_ymd_opt(2003, 9, 29).unwrap();
        let draws = (0..len)
            .map(|i| {
                let numbers = (0..DRAW_SIZE)
                    .map(|j| u8::try_from((i * 3 + j) % 25 + 1).unwrap())
                    .collect::<Vec<_>>();
                Draw::new(
                    u32::try_from(i + 1).unwrap(),
                    start + chrono::Days::new(u64::try_from(i).unwrap() * 3),
                    NumberSet::from_numbers(&numbers).unwrap(),
                )
                .unwrap()
            })
            .collect();
        DrawFeed::new(draws)
    }

    #[test]
    fn test_number_set_rejects_duplicates_and_range() {
        assert_eq!(
            NumberSet::from_numbers(&[1, 2, 2]),
            Err(NumberSetError::Duplicate { number: 2 })
        );
        assert_eq!(
            NumberSet::from_numbers(&[0]),
            Err(NumberSetError::OutOfRange { number: 0 })
        );
        assert_eq!(
            NumberSet::from_numbers(&[26]),
            Err(NumberSetError::OutOfRange { number: 26 })
        );
        let sixteen = (1..=16).collect::<Vec<u8>>();
        assert_eq!(NumberSet::from_numbers(&sixteen), Err(NumberSetError::TooMany));
    }

    #[test]
    fn test_insert_and_intersection() {
        let mut a = NumberSet::new();
        assert!(a.insert(5));
        assert!(!a.insert(5));
        assert!(!a.insert(0));
        assert!(a.insert(25));
        let b = NumberSet::from_numbers(&[25, 3, 5]).unwrap();
        assert_eq!(a.intersection_count(&b), 2);
        assert_eq!(b.sorted(), vec![3, 5, 25]);
        assert_eq!(b.as_slice(), &[25, 3, 5]);
    }

    #[test]
    fn test_draw_requires_fifteen_numbers() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let err = Draw::new(1, date, NumberSet::from_numbers(&[1, 2]).unwrap()).unwrap_err();
        assert_eq!(err, NumberSetError::Incomplete { found: 2 });
    }

    #[test]
    fn test_draw_json_shape() {
        let feed = sample_feed(1);
        let draw = feed.get(0).unwrap();
        let json = serde_json::to_value(draw).unwrap();
        assert_eq!(json["contestIndex"], 1);
        assert_eq!(json["date"], "2003-09-29");
        assert_eq!(json["numbers"].as_array().unwrap().len(), DRAW_SIZE);
        let back: Draw = serde_json::from_value(json).unwrap();
        assert_eq!(&back, draw);
    }

    #[test]
    fn test_draw_json_rejects_short_numbers() {
        let json = r#"{"contestIndex":1,"date":"2020-01-01","numbers":[1,2,3]}"#;
        assert!(serde_json::from_str::<Draw>(json).is_err());
    }

    #[test]
    fn test_feed_index_error() {
        let feed = sample_feed(3);
        assert_eq!(feed.get(3).unwrap_err(), IndexError { index: 3, len: 3 });
        assert!(DrawFeed::default().get(0).is_err());
    }
}
