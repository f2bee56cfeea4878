//! Maps raw cells to typed values.

use crate::paginate::schema::FieldType;
use crate::paginate::schema::Value;
use crate::spreadsheet::cell::serial_to_datetime;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::cell::NumberFormat;

/// Coerces a raw cell to its field type and value. Never fails: blank, error
/// and unrecognized cells are an empty string, and a number or formula that
/// has no representable value is a typed null.
pub(crate) fn coerce(value: &CellValue) -> (FieldType, Option<Value>) {
    match value {
        CellValue::Boolean(value) => (FieldType::Boolean, Some(Value::Boolean(*value))),
        CellValue::Text(text) => (FieldType::Text, Some(Value::Text(text.to_owned()))),
        CellValue::Number { value, format: NumberFormat::Date(system) } => (
            FieldType::DateTime,
            serial_to_datetime(*value, *system).map(Value::DateTime),
        ),
        CellValue::Number { value, format: NumberFormat::Plain } => (FieldType::Double, Some(Value::Double(*value))),
        CellValue::DateTime(datetime) => (FieldType::DateTime, Some(Value::DateTime(datetime.and_utc()))),
        CellValue::Formula { cached } => (FieldType::Double, cached.map(Value::Double)),
        CellValue::Error(_) | CellValue::Blank => (FieldType::Text, Some(Value::Text(String::new()))),
    }
}

/// Returns the header name a cell provides: its text when that text is not empty.
pub(crate) fn header_name(value: &CellValue) -> Option<String> {
    match coerce(value) {
        (FieldType::Text, Some(Value::Text(text))) if !text.is_empty() => Some(text),
        _ => None,
    }
}
