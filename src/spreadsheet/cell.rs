use crate::spreadsheet::reference::index_to_reference;
use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

/// Epoch used by a workbook for numeric date values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum DateSystem {
    /// Serial 1 is 1900-01-01, with the Lotus 1-2-3 leap year bug
    #[default]
    Epoch1900,
    /// Serial 0 is 1904-01-01
    Epoch1904,
}

/// How a numeric cell is meant to be displayed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum NumberFormat {
    #[default]
    Plain,
    /// Date, time or date-time format
    Date(DateSystem),
}

impl NumberFormat {
    /// Classifies built-in number format ids.
    pub(crate) fn parse_builtin_id(id: &str, system: DateSystem) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "18" | "19" | "20" | "21" | "22" | "45" | "46" | "47" => {
                Some(Self::Date(system))
            }
            _ => None,
        }
    }

    /// Classifies a custom format code by scanning for date and time tokens.
    ///
    /// A run of letters is a date token only when every letter is one of
    /// `y m d h s`, so keywords such as `General` stay plain. Quoted literals
    /// and escaped characters are ignored. Bracketed sections are ignored too,
    /// except elapsed time tokens such as `[h]` or `[mm]`.
    pub(crate) fn parse_custom(format: &str, system: DateSystem) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut bracket = None::<String>;
        let mut word = String::new();
        let mut is_date = false;
        for character in format.chars() {
            if !is_escaped && !is_literal && bracket.is_none() && character.is_ascii_alphabetic() {
                word.push(character);
                continue;
            }
            is_date |= is_date_token(&word, "ymdhs");
            word.clear();

            match character {
                _ if is_escaped => is_escaped = false,

                '"' if is_literal => is_literal = false,
                _ if is_literal => (),

                ']' if bracket.is_some() => {
                    is_date |= bracket.take().is_some_and(|token| is_date_token(&token, "hms"));
                }
                _ if bracket.is_some() => {
                    if let Some(token) = bracket.as_mut() {
                        token.push(character);
                    }
                }

                '_' | '\\' => is_escaped = true,
                '"' => is_literal = true,
                '[' => bracket = Some(String::new()),
                _ => (),
            }
        }
        is_date |= is_date_token(&word, "ymdhs");

        if is_date {
            Self::Date(system)
        } else {
            Self::Plain
        }
    }
}

/// True for a non-empty token made only of the given letters, in any case
fn is_date_token(token: &str, letters: &str) -> bool {
    !token.is_empty() && token.chars().all(|character| letters.contains(character.to_ascii_lowercase()))
}

/// Raw value of one cell as stored by the workbook.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CellValue {
    Blank,
    Boolean(bool),
    Text(String),
    Number { value: f64, format: NumberFormat },
    /// ISO 8601 date-time stored directly in the cell
    DateTime(NaiveDateTime),
    /// Formula with its cached numeric result, if the result is a number
    Formula { cached: Option<f64> },
    /// Error literal such as `#DIV/0!`
    Error(String),
}

/// A single cell with its 0-based position.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) value: CellValue,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize, value: CellValue) -> Self {
        Cell { row, col, value }
    }

    pub(crate) fn blank(row: usize, col: usize) -> Self {
        Cell::new(row, col, CellValue::Blank)
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }
}

/// Converts a numeric date serial to a UTC instant.
/// Returns `None` for values chrono cannot represent.
pub(crate) fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = match system {
        // Serial 60 is the fictitious 1900-02-29
        DateSystem::Epoch1900 if serial < 60.0 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        DateSystem::Epoch1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateSystem::Epoch1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    };
    let milliseconds = (serial * 86_400_000f64).round();
    if milliseconds.abs() > i64::MAX as f64 {
        return None;
    }
    let offset = Duration::try_milliseconds(milliseconds as i64)?;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(offset)
        .map(|datetime| datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builtin_formats() {
        let system = DateSystem::Epoch1900;
        assert_eq!(NumberFormat::parse_builtin_id("14", system), Some(NumberFormat::Date(system)));
        assert_eq!(NumberFormat::parse_builtin_id("22", system), Some(NumberFormat::Date(system)));
        assert_eq!(NumberFormat::parse_builtin_id("46", system), Some(NumberFormat::Date(system)));
        assert_eq!(NumberFormat::parse_builtin_id("2", system), None);
    }

    #[test]
    fn custom_formats() {
        let system = DateSystem::Epoch1904;
        assert_eq!(NumberFormat::parse_custom("yyyy-mm-dd", system), NumberFormat::Date(system));
        assert_eq!(NumberFormat::parse_custom("hh:mm:ss", system), NumberFormat::Date(system));
        assert_eq!(NumberFormat::parse_custom("[$-409]d-mmm-yy", system), NumberFormat::Date(system));
        assert_eq!(NumberFormat::parse_custom("0.00", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("#,##0 \"days\"", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("[Red]0.00", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("0\\d", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("General", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("Standard", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("0.00E+00", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("[>=100][Blue]0", system), NumberFormat::Plain);
        assert_eq!(NumberFormat::parse_custom("[h]:mm", system), NumberFormat::Date(system));
        assert_eq!(NumberFormat::parse_custom("[ss]", system), NumberFormat::Date(system));
        assert_eq!(NumberFormat::parse_custom("h:mm AM/PM", system), NumberFormat::Date(system));
    }

    #[test]
    fn serial_1900() {
        let system = DateSystem::Epoch1900;
        assert_eq!(serial_to_datetime(45292.0, system), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(serial_to_datetime(45292.5, system), Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        assert_eq!(serial_to_datetime(1.0, system), Some(Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(serial_to_datetime(61.0, system), Some(Utc.with_ymd_and_hms(1900, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn serial_1904() {
        let system = DateSystem::Epoch1904;
        assert_eq!(serial_to_datetime(0.0, system), Some(Utc.with_ymd_and_hms(1904, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(serial_to_datetime(43830.0, system), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn serial_out_of_range() {
        assert_eq!(serial_to_datetime(f64::NAN, DateSystem::Epoch1900), None);
        assert_eq!(serial_to_datetime(1e300, DateSystem::Epoch1900), None);
    }

    #[test]
    fn cell_reference() {
        assert_eq!(Cell::blank(4, 27).reference(), "AB5");
    }
}
