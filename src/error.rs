// ⚠️ Error taxonomy for the ingestion pipeline
// Every variant aborts the whole invocation; nothing is retried here.

use crate::normalize::AmountError;
use thiserror::Error;

/// Coarse error class, for callers that only care which family failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural mismatch (missing column, ragged row)
    Schema,
    /// Value-level parse failure
    Format,
    /// Byte-to-text decode failure
    Encoding,
    /// Bad arguments or unreadable input stream
    Input,
    /// Abandoned by the caller between chunks
    Cancelled,
}

/// All errors produced by the pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A required source column is absent from the header row.
    #[error("Missing required column '{column}' (header has: {})", .available.join(", "))]
    Schema {
        column: String,
        available: Vec<String>,
    },

    /// A data row has a different number of fields than the header.
    #[error("Row on line {line} has {found} fields, header has {expected}")]
    RowShape {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// An amount could not be parsed after locale normalization.
    #[error("Invalid number in column '{column}' on line {line}: '{value}' ({reason})")]
    Format {
        line: u64,
        column: String,
        value: String,
        #[source]
        reason: AmountError,
    },

    /// The byte stream is not valid under the declared encoding.
    #[error("Input is not valid {encoding}: malformed bytes at offset {offset} (line {line})")]
    Encoding {
        encoding: String,
        offset: usize,
        line: u64,
    },

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Ingestion cancelled after {rows_read} rows")]
    Cancelled { rows_read: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Schema { .. } | IngestError::RowShape { .. } => ErrorKind::Schema,
            IngestError::Format { .. } => ErrorKind::Format,
            IngestError::Encoding { .. } | IngestError::UnknownEncoding(_) => ErrorKind::Encoding,
            IngestError::Cancelled { .. } => ErrorKind::Cancelled,
            IngestError::InvalidDelimiter(_)
            | IngestError::InvalidChunkSize
            | IngestError::Csv(_)
            | IngestError::Io(_) => ErrorKind::Input,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_header() {
        let err = IngestError::Schema {
            column: "Beløb".to_string(),
            available: vec!["Dato".to_string(), "Tekst".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required column 'Beløb' (header has: Dato, Tekst)"
        );
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_format_error_names_line_and_value() {
        let err = IngestError::Format {
            line: 7,
            column: "Amount".to_string(),
            value: "abc".to_string(),
            reason: AmountError::NotANumber,
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("'abc'"));
        assert!(msg.contains("(not a number)"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("not a number"));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_encoding_kinds() {
        let err = IngestError::Encoding {
            encoding: "UTF-8".to_string(),
            offset: 12,
            line: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(
            IngestError::UnknownEncoding("klingon".to_string()).kind(),
            ErrorKind::Encoding
        );
    }

    #[test]
    fn test_row_shape_is_schema_class() {
        let err = IngestError::RowShape { line: 3, expected: 4, found: 2 };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.to_string(), "Row on line 3 has 2 fields, header has 4");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err: IngestError = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.to_string().contains("truncated"));
    }
}
