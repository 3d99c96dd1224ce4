// ⚙️ Pipeline configuration
// Statement format presets + tunables (delimiter, encoding, chunk size)

use crate::error::{IngestError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_ENCODING: &str = "windows-1252";

// ============================================================================
// STATEMENT FORMATS
// ============================================================================

/// StatementFormat - Which bank export the input comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementFormat {
    DanskeBank,
}

impl StatementFormat {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            StatementFormat::DanskeBank => "Danske Bank",
        }
    }

    /// Short code, as accepted on the command line
    pub fn code(&self) -> &str {
        match self {
            StatementFormat::DanskeBank => "danskebank",
        }
    }

    /// Default pipeline settings for this export format
    pub fn config(&self) -> PipelineConfig {
        match self {
            StatementFormat::DanskeBank => PipelineConfig::default(),
        }
    }
}

impl FromStr for StatementFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "danskebank" | "danske" => Ok(StatementFormat::DanskeBank),
            other => Err(format!("Unknown statement format: {}", other)),
        }
    }
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

/// Source column names that get projected onto Date / Amount / Text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub text: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            date: "Dato".to_string(),
            amount: "Beløb".to_string(),
            text: "Tekst".to_string(),
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub delimiter: char,

    /// Encoding label (WHATWG names and aliases such as "cp1252" or "latin1")
    pub encoding: String,

    /// Rows per parse chunk; memory bound only, never changes the output
    pub chunk_size: usize,

    pub columns: ColumnMapping,

    /// Literal substrings stripped from Text, applied in this order
    pub noise_tokens: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            delimiter: DEFAULT_DELIMITER,
            encoding: DEFAULT_ENCODING.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            columns: ColumnMapping::default(),
            // Longest first: "))))" must not be half-eaten by ")))"
            noise_tokens: vec!["))))".to_string(), ")))".to_string()],
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = encoding.to_string();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Load a JSON config file; missing fields fall back to defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Check the settings the CSV reader can't express
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(IngestError::InvalidDelimiter(self.delimiter));
        }
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkSize);
        }
        Ok(())
    }

    /// Delimiter as the single byte the csv reader wants
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(IngestError::InvalidDelimiter(self.delimiter))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_matches_danske_bank_export() {
        let config = PipelineConfig::default();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.encoding, "windows-1252");
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.columns.amount, "Beløb");
        assert_eq!(config.noise_tokens, vec!["))))", ")))"]);
        assert_eq!(StatementFormat::DanskeBank.config(), config);
    }

    #[test]
    fn test_statement_format_from_str() {
        assert_eq!("danskebank".parse::<StatementFormat>(), Ok(StatementFormat::DanskeBank));
        assert_eq!("Danske Bank".parse::<StatementFormat>(), Ok(StatementFormat::DanskeBank));
        assert!("nordea".parse::<StatementFormat>().is_err());
        assert_eq!(StatementFormat::DanskeBank.code(), "danskebank");
        assert_eq!(StatementFormat::DanskeBank.name(), "Danske Bank");
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_delimiter(',')
            .with_encoding("utf-8")
            .with_chunk_size(10);
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert_eq!(config.encoding, "utf-8");
        assert_eq!(config.chunk_size, 10);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let config = PipelineConfig::new().with_delimiter('§');
        assert!(matches!(config.validate(), Err(IngestError::InvalidDelimiter('§'))));

        let config = PipelineConfig::new().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(IngestError::InvalidChunkSize)));

        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chunk_size": 50, "columns": {{"amount": "Belob"}}}}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.columns.amount, "Belob");
        // Unspecified fields keep their defaults
        assert_eq!(config.columns.date, "Dato");
        assert_eq!(config.delimiter, ';');
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = PipelineConfig::from_json_file(Path::new("/nonexistent/ingest.json"));
        assert!(result.is_err());
    }
}
