use crate::ledger::LedgerEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A ledger entry as stored, with its import provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub date: String,
    pub amount: f64,
    pub text: String,
    pub source_file: String,
    pub source_line: u64,
    pub import_id: String,
    pub imported_at: DateTime<Utc>,
}

/// One import run: every entry written by it shares the same id
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub import_id: String,
    pub imported_at: DateTime<Utc>,
    pub source_file: String,
}

impl ImportBatch {
    pub fn new(source_file: &str) -> Self {
        ImportBatch {
            import_id: uuid::Uuid::new_v4().to_string(),
            imported_at: Utc::now(),
            source_file: source_file.to_string(),
        }
    }
}

/// Hash used to skip rows already imported from an earlier run.
/// Same statement line imported twice → same hash.
pub fn compute_idempotency_hash(entry: &LedgerEntry, source_file: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}|{}",
        entry.date, entry.amount, entry.text, source_file, entry.source_line
    ));
    format!("{:x}", hasher.finalize())
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases answer "memory"
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            text TEXT NOT NULL,
            source_file TEXT NOT NULL,
            source_line INTEGER NOT NULL,
            import_id TEXT NOT NULL,
            imported_at TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_import ON ledger_entries(import_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_date ON ledger_entries(date)",
        [],
    )?;

    Ok(())
}

/// Insert entries in one transaction; returns how many were new
pub fn insert_entries(
    conn: &mut Connection,
    entries: &[LedgerEntry],
    batch: &ImportBatch,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;

    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO ledger_entries (
                idempotency_hash, date, amount, text,
                source_file, source_line, import_id, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for entry in entries {
            let hash = compute_idempotency_hash(entry, &batch.source_file);
            inserted += stmt
                .execute(params![
                    hash,
                    entry.date,
                    entry.amount,
                    entry.text,
                    batch.source_file,
                    entry.source_line as i64,
                    batch.import_id,
                    batch.imported_at.to_rfc3339(),
                ])
                .with_context(|| format!("Failed to insert entry from line {}", entry.source_line))?;
        }
    }

    tx.commit()?;
    tracing::info!(
        inserted,
        skipped = entries.len() - inserted,
        import_id = %batch.import_id,
        "stored ledger entries"
    );
    Ok(inserted)
}

pub fn get_all_entries(conn: &Connection) -> Result<Vec<StoredEntry>> {
    query_entries(conn, "SELECT date, amount, text, source_file, source_line, import_id, imported_at
         FROM ledger_entries ORDER BY id", params![])
}

pub fn get_entries_by_import(conn: &Connection, import_id: &str) -> Result<Vec<StoredEntry>> {
    query_entries(conn, "SELECT date, amount, text, source_file, source_line, import_id, imported_at
         FROM ledger_entries WHERE import_id = ?1 ORDER BY id", params![import_id])
}

fn query_entries<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<StoredEntry>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (date, amount, text, source_file, source_line, import_id, imported_at) = row?;
        let imported_at = DateTime::parse_from_rfc3339(&imported_at)
            .with_context(|| format!("Bad imported_at timestamp: {}", imported_at))?
            .with_timezone(&Utc);
        entries.push(StoredEntry {
            date,
            amount,
            text,
            source_file,
            source_line: source_line as u64,
            import_id,
            imported_at,
        });
    }

    Ok(entries)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))?;
    Ok(count)
}
