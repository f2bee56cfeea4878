use tracing::warn;

/// Kind of a non-fatal problem met while reading a page
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    /// The decoder failed on a row, reading stopped there
    Decode,
    /// A cell did not match its column type and was read as null
    TypeMismatch,
}

impl ErrorCode {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Decode => "DECODE_ERROR",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedError {
    pub(crate) code: ErrorCode,
    /// Physical row index (0-based), when the problem belongs to one row
    pub(crate) row: Option<usize>,
    pub(crate) message: String,
}

/// Collects the errors of one extraction call without interrupting it.
#[derive(Debug, Default)]
pub(crate) struct ErrorCollector {
    errors: Vec<RecordedError>,
}

impl ErrorCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, code: ErrorCode, row: Option<usize>, message: String) {
        warn!(code = code.as_str(), row = ?row.map(|row| row + 1), "{message}");
        self.errors.push(RecordedError { code, row, message });
    }

    pub(crate) fn errors(&self) -> &[RecordedError] {
        &self.errors
    }

    /// First recorded error with `code`
    pub(crate) fn first(&self, code: ErrorCode) -> Option<&RecordedError> {
        self.errors.iter().find(|error| error.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut errors = ErrorCollector::new();
        assert!(errors.errors().is_empty());
        assert_eq!(errors.first(ErrorCode::Decode), None);
        errors.record(ErrorCode::TypeMismatch, Some(4), "B5 is not a number".to_owned());
        errors.record(ErrorCode::Decode, None, "broken row".to_owned());
        assert_eq!(errors.first(ErrorCode::Decode).map(|error| error.message.as_str()), Some("broken row"));
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.errors()[0].row, Some(4));
        assert_eq!(errors.errors()[1].code, ErrorCode::Decode);
        assert_eq!(errors.errors()[1].message, "broken row");
    }
}
