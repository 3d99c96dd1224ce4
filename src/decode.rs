// 🔤 Byte stream → text
// Strict decoding: malformed input is an EncodingError, never replaced

use crate::error::{IngestError, Result};
use encoding_rs::{DecoderResult, Encoding, WINDOWS_1252};
use tracing::debug;

/// Resolve an encoding label ("cp1252", "latin1", "utf-8", ...)
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| IngestError::UnknownEncoding(label.to_string()))
}

/// Bytes with no character assigned in the cp1252 code page
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Decode the whole input under `label`.
///
/// A BOM is stripped only when it matches the declared encoding. Any
/// malformed sequence fails the call with its byte offset and line.
/// For windows-1252 the five unassigned bytes count as malformed too,
/// rather than passing through as C1 control characters.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = lookup_encoding(label)?;

    if encoding == WINDOWS_1252 {
        if let Some(offset) = bytes.iter().position(|b| CP1252_UNDEFINED.contains(b)) {
            return Err(IngestError::Encoding {
                encoding: encoding.name().to_string(),
                offset,
                line: line_at(bytes, offset),
            });
        }
    }

    let mut decoder = encoding.new_decoder_with_bom_removal();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .ok_or_else(|| IngestError::Encoding {
            encoding: encoding.name().to_string(),
            offset: 0,
            line: 1,
        })?;
    let mut text = String::with_capacity(capacity);

    let (result, read) = decoder.decode_to_string_without_replacement(bytes, &mut text, true);
    match result {
        DecoderResult::InputEmpty => {
            debug!(encoding = encoding.name(), bytes = bytes.len(), "decoded input");
            Ok(text)
        }
        DecoderResult::Malformed(bad, consumed_after) => {
            let offset = read.saturating_sub(bad as usize + consumed_after as usize);
            Err(IngestError::Encoding {
                encoding: encoding.name().to_string(),
                offset,
                line: line_at(bytes, offset),
            })
        }
        // Capacity came from the decoder's own worst case
        DecoderResult::OutputFull => Err(IngestError::Encoding {
            encoding: encoding.name().to_string(),
            offset: read,
            line: line_at(bytes, read),
        }),
    }
}

fn line_at(bytes: &[u8], offset: usize) -> u64 {
    let end = offset.min(bytes.len());
    bytes[..end].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cp1252_danish_letters() {
        // "Beløb;Ærø" in windows-1252
        let bytes = b"Bel\xf8b;\xc6r\xf8";
        assert_eq!(decode(bytes, "cp1252").unwrap(), "Beløb;Ærø");
        assert_eq!(decode(bytes, "windows-1252").unwrap(), "Beløb;Ærø");
    }

    #[test]
    fn test_latin1_alias_resolves() {
        assert_eq!(lookup_encoding("latin1").unwrap().name(), "windows-1252");
        assert_eq!(lookup_encoding(" UTF-8 ").unwrap().name(), "UTF-8");
    }

    #[test]
    fn test_unknown_label() {
        let err = decode(b"abc", "ebcdic-klingon").unwrap_err();
        assert!(matches!(err, IngestError::UnknownEncoding(_)));
    }

    #[test]
    fn test_malformed_utf8_reports_position() {
        // cp1252 bytes fed to a UTF-8 decoder: 0xF8 is never valid UTF-8
        let bytes = b"Dato;Tekst\n01.02.2020;Bel\xf8b\n";
        let err = decode(bytes, "utf-8").unwrap_err();
        match err {
            IngestError::Encoding { offset, line, .. } => {
                assert_eq!(offset, 25);
                assert_eq!(line, 2);
            }
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_cp1252_unassigned_bytes_rejected() {
        for &byte in &CP1252_UNDEFINED {
            let bytes = [b'A', b'\n', b'x', byte, b'B'];
            match decode(&bytes, "cp1252").unwrap_err() {
                IngestError::Encoding { encoding, offset, line } => {
                    assert_eq!(encoding, "windows-1252");
                    assert_eq!(offset, 3);
                    assert_eq!(line, 2);
                }
                other => panic!("expected encoding error, got {other:?}"),
            }
        }
        // Neighbouring assigned bytes still decode ("‚" and "Œ")
        assert_eq!(decode(b"\x82\x8c", "cp1252").unwrap(), "\u{201a}\u{152}");
    }

    #[test]
    fn test_matching_bom_is_stripped() {
        let bytes = b"\xef\xbb\xbfDato";
        assert_eq!(decode(bytes, "utf-8").unwrap(), "Dato");
    }
}
