// 🔁 Ingestion-normalization pipeline
// decode → chunked parse → concatenate → project/rename → amounts → sign filter → text cleanup
//
// Runs to completion or fails as a whole; no partial ledger ever escapes.

use crate::config::PipelineConfig;
use crate::decode::decode;
use crate::error::{IngestError, Result};
use crate::ledger::{FilteredLedger, Ledger, LedgerEntry};
use crate::normalize::{parse_amount, strip_tokens};
use crate::parser::{ChunkedReader, RawTable};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Canonical column names after projection
pub const DATE_COLUMN: &str = "Date";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const TEXT_COLUMN: &str = "Text";

/// Runs one statement through every step with a fixed [`PipelineConfig`]
pub struct Pipeline {
    config: PipelineConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            cancel: None,
        }
    }

    /// Abandon the run at the next chunk boundary once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full pipeline: outgoing rows only
    pub fn run<R: Read>(&self, input: R) -> Result<FilteredLedger> {
        let ledger = self.ledger(input)?;
        let read = ledger.len();

        let filtered = ledger.filter_outgoing();
        let dropped = read - filtered.len();
        if dropped > 0 {
            warn!(dropped, "dropped non-negative rows (deposits and zero amounts)");
        }
        info!(rows_read = read, rows_kept = filtered.len(), "ingestion complete");

        Ok(filtered)
    }

    /// Every row, projected and cleaned, without the sign filter
    pub fn ledger<R: Read>(&self, mut input: R) -> Result<Ledger> {
        self.config.validate()?;

        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let text = decode(&bytes, &self.config.encoding)?;

        let table = self.read_table(&text)?;
        self.project(&table)
    }

    /// Steps 1-2: chunked parse, then concatenate in order
    fn read_table(&self, text: &str) -> Result<RawTable> {
        let reader = ChunkedReader::new(
            text.as_bytes(),
            self.config.delimiter_byte()?,
            self.config.chunk_size,
        )?;
        let mut table = RawTable::new(reader.headers().clone());

        for batch in reader {
            self.check_cancelled(table.len())?;
            table.append(batch?);
        }
        debug!(rows = table.len(), columns = table.headers().len(), "concatenated chunks");

        Ok(table)
    }

    /// Steps 3, 4 and 6: project/rename, parse amounts, strip noise
    fn project(&self, table: &RawTable) -> Result<Ledger> {
        let columns = &self.config.columns;
        let date_idx = table.column_index(&columns.date)?;
        let amount_idx = table.column_index(&columns.amount)?;
        let text_idx = table.column_index(&columns.text)?;

        let mut entries = Vec::with_capacity(table.len());
        for row in table.rows() {
            let date = row.record.get(date_idx).unwrap_or_default();
            let raw_amount = row.record.get(amount_idx).unwrap_or_default();
            let text = row.record.get(text_idx).unwrap_or_default();

            let amount = parse_amount(raw_amount).map_err(|reason| IngestError::Format {
                line: row.line,
                column: AMOUNT_COLUMN.to_string(),
                value: raw_amount.to_string(),
                reason,
            })?;

            entries.push(LedgerEntry::new(
                date.to_string(),
                amount,
                strip_tokens(text, &self.config.noise_tokens),
                row.line,
            ));
        }

        Ok(Ledger::new(entries))
    }

    fn check_cancelled(&self, rows_read: usize) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(IngestError::Cancelled { rows_read }),
            _ => Ok(()),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Run the pipeline with the default chunk size, columns and noise tokens.
///
/// `delimiter` and `text_encoding` must match the input; no sniffing is done.
pub fn normalize<R: Read>(raw: R, delimiter: char, text_encoding: &str) -> Result<FilteredLedger> {
    let config = PipelineConfig::default()
        .with_delimiter(delimiter)
        .with_encoding(text_encoding);
    Pipeline::new(config).run(raw)
}

// ============================================================================
// TESTS
// ============================================================================
