//! Writes typed values into DuckDB vectors.

use crate::paginate::schema::Value;
use duckdb::core::FlatVector;
use duckdb::core::Inserter;
use libduckdb_sys::duckdb_timestamp;

/// Writes one slot of a typed row, `None` becomes NULL.
pub(super) fn write_to_vector(vector: &mut FlatVector, row: usize, value: Option<&Value>) {
    match value {
        None => vector.set_null(row),
        Some(Value::Text(text)) => vector.insert(row, text.as_str()),
        Some(Value::Boolean(value)) => write_primitive(vector, row, *value),
        Some(Value::Double(value)) => write_primitive(vector, row, *value),
        Some(Value::DateTime(value)) => write_timestamp(vector, row, value.timestamp_micros()),
    }
}

/// Writes a primitive value directly to a vector using pointer arithmetic.
fn write_primitive<T>(vector: &mut FlatVector, index: usize, value: T) {
    let pointer: *mut T = unsafe { vector.as_mut_ptr() };
    unsafe {
        std::ptr::write(pointer.add(index), value);
    }
}

/// Writes a timestamp value (microseconds since epoch) to a DuckDB timestamp vector.
fn write_timestamp(vector: &mut FlatVector, index: usize, value: i64) {
    let pointer: *mut duckdb_timestamp = unsafe { vector.as_mut_ptr() };
    unsafe {
        let pointer = pointer.add(index);
        (*pointer).micros = value;
    }
}
