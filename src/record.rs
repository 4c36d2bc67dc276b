//! Record model.
//!
//! A record is a line of the form `<number>.<text>`. The number is everything before the first `.`,
//! the text is everything after it, further dots included.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::num::ParseIntError;
use std::str::FromStr;

/// Record line parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line has no `.` separator.
    MissingSeparator,
    /// The part before the separator is not an integer.
    InvalidNumber(ParseIntError),
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            ParseError::MissingSeparator => None,
            ParseError::InvalidNumber(err) => Some(err),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            ParseError::MissingSeparator => write!(f, "record separator '.' not found"),
            ParseError::InvalidNumber(err) => write!(f, "record number format error: {}", err),
        }
    }
}

/// A `<number>.<text>` record.
///
/// Records are ordered by text first (byte-wise) and by number on ties. The same order
/// is used to sort chunks and to merge them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    number: i64,
    text: String,
}

impl Record {
    /// Creates a record. `text` must not contain a line terminator.
    pub fn new(number: i64, text: impl Into<String>) -> Self {
        Record {
            number,
            text: text.into(),
        }
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parses a single line (without its terminator).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (number, text) = line.split_once('.').ok_or(ParseError::MissingSeparator)?;
        let number = number.parse::<i64>().map_err(ParseError::InvalidNumber)?;

        return Ok(Record::new(number, text));
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Record::parse(s)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.number, self.text)
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        // `str` ordering is a byte-wise comparison, independent of locale
        self.text
            .as_bytes()
            .cmp(other.text.as_bytes())
            .then(self.number.cmp(&other.number))
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use rstest::*;

    use super::{ParseError, Record};

    #[rstest]
    #[case("5.apple", Record::new(5, "apple"))]
    #[case("-12.apple", Record::new(-12, "apple"))]
    #[case("7.", Record::new(7, ""))]
    #[case("1.Something.with.dots", Record::new(1, "Something.with.dots"))]
    #[case("42. leading space", Record::new(42, " leading space"))]
    fn test_parse(#[case] line: &str, #[case] expected: Record) {
        assert_eq!(Record::parse(line), Ok(expected));
    }

    #[rstest]
    #[case("apple")]
    #[case("")]
    fn test_parse_missing_separator(#[case] line: &str) {
        assert_eq!(Record::parse(line), Err(ParseError::MissingSeparator));
    }

    #[rstest]
    #[case(".apple")]
    #[case("x5.apple")]
    #[case("1 .apple")]
    #[case("99999999999999999999.apple")]
    fn test_parse_invalid_number(#[case] line: &str) {
        assert!(matches!(Record::parse(line), Err(ParseError::InvalidNumber(_))));
    }

    #[rstest]
    #[case(Record::new(0, "a"))]
    #[case(Record::new(i64::MIN, "Banana is yellow"))]
    #[case(Record::new(i64::MAX, "1.2.3"))]
    #[case(Record::new(-1, ""))]
    fn test_round_trip(#[case] record: Record) {
        let line = record.to_string();
        assert_eq!(line.parse::<Record>().unwrap(), record);
    }

    #[rstest]
    #[case(Record::new(5, "apple"), Record::new(2, "apple"), Ordering::Greater)]
    #[case(Record::new(5, "apple"), Record::new(5, "banana"), Ordering::Less)]
    #[case(Record::new(1, "apple"), Record::new(1, "apple"), Ordering::Equal)]
    #[case(Record::new(1, "Zebra"), Record::new(1, "apple"), Ordering::Less)]
    #[case(Record::new(1, "apple"), Record::new(0, "apples"), Ordering::Less)]
    #[case(Record::new(-3, "x"), Record::new(2, "x"), Ordering::Less)]
    fn test_order(#[case] left: Record, #[case] right: Record, #[case] expected: Ordering) {
        assert_eq!(left.cmp(&right), expected);
        assert_eq!(right.cmp(&left), expected.reverse());
    }

    #[test]
    fn test_order_is_byte_wise() {
        // 'é' encodes to 0xC3 0xA9, above every ASCII byte
        let mut records = vec![Record::new(1, "é"), Record::new(1, "z"), Record::new(1, "E")];
        records.sort();

        assert_eq!(records, vec![Record::new(1, "E"), Record::new(1, "z"), Record::new(1, "é")]);
    }
}
