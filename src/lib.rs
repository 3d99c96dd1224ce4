// Ledger Ingest - Core Library
// Bank statement CSV → cleaned, typed, outgoing-only ledger

pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod ledger;
pub mod normalize;
pub mod parser;
pub mod pipeline;

// Re-export commonly used types
pub use config::{ColumnMapping, PipelineConfig, StatementFormat};
pub use db::{
    ImportBatch, StoredEntry,
    setup_database, insert_entries, get_all_entries, get_entries_by_import, verify_count,
};
pub use decode::decode;
pub use error::{ErrorKind, IngestError, Result};
pub use ledger::{FilteredLedger, Ledger, LedgerEntry};
pub use normalize::{clean_text, parse_amount, AmountError};
pub use parser::{ChunkedReader, RawRecordBatch, RawRow, RawTable};
pub use pipeline::{normalize, Pipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
