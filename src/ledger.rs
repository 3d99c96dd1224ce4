// 📒 Ledger types
// Projected rows (Date / Amount / Text) and the outgoing-only view

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One cleaned statement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Source date string, format untouched
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Text")]
    pub text: String,

    /// Line in the source file (provenance, not an output column)
    #[serde(skip)]
    pub source_line: u64,
}

impl LedgerEntry {
    pub fn new(date: String, amount: f64, text: String, source_line: u64) -> Self {
        LedgerEntry {
            date,
            amount,
            text,
            source_line,
        }
    }

    pub fn is_outgoing(&self) -> bool {
        self.amount < 0.0
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Every projected row, in input order, before the sign filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Ledger { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Keep only rows with a strictly negative amount.
    ///
    /// Zero and positive rows (deposits, incoming transfers) are dropped
    /// without trace; use the Ledger itself if they are needed.
    pub fn filter_outgoing(self) -> FilteredLedger {
        FilteredLedger {
            entries: self.entries.into_iter().filter(|e| e.is_outgoing()).collect(),
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        write_entries_csv(&self.entries, writer, delimiter)
    }
}

// ============================================================================
// FILTERED LEDGER
// ============================================================================

/// Outgoing transactions only: every entry has `amount < 0`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilteredLedger {
    entries: Vec<LedgerEntry>,
}

impl FilteredLedger {
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} outgoing transactions, total {:.2}",
            self.entries.len(),
            self.total_amount()
        )
    }

    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        write_entries_csv(&self.entries, writer, delimiter)
    }
}

impl IntoIterator for FilteredLedger {
    type Item = LedgerEntry;
    type IntoIter = std::vec::IntoIter<LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn write_entries_csv<W: Write>(entries: &[LedgerEntry], writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_writer(writer);

    if entries.is_empty() {
        wtr.write_record(["Date", "Amount", "Text"])
            .context("Failed to write CSV header")?;
    }
    for entry in entries {
        wtr.serialize(entry).context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
