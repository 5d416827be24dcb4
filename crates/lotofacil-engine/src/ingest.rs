//! CSV ingest for draw history.
//!
//! Each data row is `contestIndex,dd/mm/yyyy,ball_1,...,ball_15`. The first
//! line is a header and is discarded; blank lines are skipped.

use chrono::NaiveDate;

use crate::draw::{DRAW_SIZE, Draw, NumberSet, NumberSetError};

const DATE_FORMAT: &str = "%d/%m/%Y";
const COLUMN_COUNT: usize = DRAW_SIZE + 2;

/// What is wrong with one CSV row.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DrawFormatError {
    #[display("expected {COLUMN_COUNT} columns, found {found}")]
    ColumnCount { found: usize },
    #[display("invalid contest index {value:?}")]
    ContestIndex { value: String },
    #[display("invalid date {value:?} (expected dd/mm/yyyy)")]
    Date { value: String },
    #[display("invalid ball {position} value {value:?}")]
    Ball { position: usize, value: String },
    #[display("{_0}")]
    Numbers(NumberSetError),
}

/// A malformed draw row, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("line {line}: {kind}")]
pub struct DataFormatError {
    pub line: usize,
    #[error(source)]
    pub kind: DrawFormatError,
}

/// Parses a whole CSV export into draws, in file order.
///
/// # Examples
///
/// ```
/// use lotofacil_engine::ingest::parse_csv;
///
/// let csv = "Concurso,Data,B1,B2,B3,B4,B5,B6,B7,B8,B9,B10,B11,B12,B13,B14,B15\n\
///            1,29/09/2003,18,20,25,23,10,11,24,14,6,2,13,9,5,16,3\n";
/// let draws = parse_csv(csv).unwrap();
/// assert_eq!(draws.len(), 1);
/// assert_eq!(draws[0].contest_index(), 1);
/// ```
pub fn parse_csv(text: &str) -> Result<Vec<Draw>, DataFormatError> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_row(line).map_err(|kind| DataFormatError { line: i + 1, kind }))
        .collect()
}

/// Parses one data row.
pub fn parse_row(line: &str) -> Result<Draw, DrawFormatError> {
    let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
    if fields.len() != COLUMN_COUNT {
        return Err(DrawFormatError::ColumnCount { found: fields.len() });
    }

    let contest_index = fields[0]
        .parse::<u32>()
        .map_err(|_| DrawFormatError::ContestIndex {
            value: fields[0].to_owned(),
        })?;
    let date = NaiveDate::parse_from_str(fields[1], DATE_FORMAT).map_err(|_| DrawFormatError::Date {
        value: fields[1].to_owned(),
    })?;

    let mut balls = Vec::with_capacity(DRAW_SIZE);
    for (position, field) in fields[2..].iter().enumerate() {
        let ball = field.parse::<u8>().map_err(|_| DrawFormatError::Ball {
            position: position + 1,
            value: (*field).to_owned(),
        })?;
        balls.push(ball);
    }
    let numbers = NumberSet::from_numbers(&balls).map_err(DrawFormatError::Numbers)?;
    Draw::new(contest_index, date, numbers).map_err(DrawFormatError::Numbers)
}
