// 🏗️ Chunked delimited-text reader
// Reads rows in fixed-size batches and concatenates them into one raw table

use crate::error::{IngestError, Result};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::io::Read;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// RawRow - One data row exactly as it appeared in the source
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line where the row starts (header is line 1)
    pub line: u64,
    pub record: StringRecord,
}

/// RawRecordBatch - Output of a single parse chunk
///
/// Rows keep their source column names through `headers`, so a row can be
/// read as a column name → value mapping via [`RawRecordBatch::value`].
#[derive(Debug, Clone)]
pub struct RawRecordBatch {
    /// 0-based position of this chunk in the input
    pub index: usize,
    pub headers: StringRecord,
    pub rows: Vec<RawRow>,
}

impl RawRecordBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, by source column name
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.record.get(idx)
    }
}

/// RawTable - All batches appended in order, every source column retained
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: StringRecord,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: StringRecord) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a batch; its rows land after everything appended so far
    pub fn append(&mut self, batch: RawRecordBatch) {
        self.rows.extend(batch.rows);
    }

    pub fn headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_string()).collect()
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a source column; first match wins on duplicate names
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| IngestError::Schema {
                column: column.to_string(),
                available: self.headers(),
            })
    }
}

// ============================================================================
// CHUNKED READER
// ============================================================================

/// Iterator over [`RawRecordBatch`]es of at most `chunk_size` rows.
///
/// The csv reader owns record framing, so quoted fields spanning several
/// physical lines never straddle two batches.
pub struct ChunkedReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    headers: StringRecord,
    chunk_size: usize,
    next_index: usize,
    finished: bool,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(input: R, delimiter: u8, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkSize);
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let headers = reader.headers().map_err(map_csv_error)?.clone();

        Ok(ChunkedReader {
            records: reader.into_records(),
            headers,
            chunk_size,
            next_index: 0,
            finished: false,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

impl<R: Read> Iterator for ChunkedReader<R> {
    type Item = Result<RawRecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut rows = Vec::with_capacity(self.chunk_size);
        while rows.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    rows.push(RawRow { line, record });
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(map_csv_error(e)));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if rows.is_empty() {
            return None;
        }

        let batch = RawRecordBatch {
            index: self.next_index,
            headers: self.headers.clone(),
            rows,
        };
        self.next_index += 1;
        debug!(chunk = batch.index, rows = batch.len(), "parsed chunk");
        Some(Ok(batch))
    }
}

fn map_csv_error(err: csv::Error) -> IngestError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return IngestError::RowShape {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
            expected: *expected_len as usize,
            found: *len as usize,
        };
    }
    IngestError::Csv(err)
}

// ============================================================================
// TESTS
// ============================================================================
