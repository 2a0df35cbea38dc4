use encoding_rs::WINDOWS_1252;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures while turning a ledger file into state.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("line {line} has {found} columns, expected {expected}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("value '{token}' on line {line} is not a valid number")]
    InvalidNumber { token: String, line: usize },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One data row, split and trimmed. `line` is 1-based with the header as line 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl LedgerRow {
    /// Fails with `MalformedRow` unless the row has exactly `expected` fields.
    pub fn expect_columns(&self, expected: usize) -> Result<(), ImportError> {
        if self.fields.len() != expected {
            return Err(ImportError::MalformedRow {
                line: self.line,
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }
}

/// A header plus data rows split out of raw ledger text.
#[derive(Debug, Clone)]
pub struct Ledger<'a> {
    pub separator: char,
    rows: Vec<&'a str>,
}

impl<'a> Ledger<'a> {
    /// Splits `text` into non-blank lines.
    ///
    /// Returns `None` when there is no header plus at least one data row.
    /// The separator is `;` when the header contains one, `,` otherwise.
    pub fn split(text: &'a str) -> Option<Self> {
        let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());
        let header = lines.next()?;
        let rows: Vec<&str> = lines.collect();
        if rows.is_empty() {
            return None;
        }

        let separator = if header.contains(';') { ';' } else { ',' };
        Some(Self { separator, rows })
    }

    pub fn rows(&self) -> impl Iterator<Item = LedgerRow> + '_ {
        self.rows.iter().enumerate().map(|(idx, raw)| LedgerRow {
            line: idx + 2,
            fields: raw
                .replace('\r', "")
                .split(self.separator)
                .map(|field| field.trim().to_string())
                .collect(),
        })
    }
}

/// Reads a whole ledger file into memory.
///
/// A UTF-8 BOM is dropped. Bytes that are not UTF-8 are decoded as
/// Windows-1252, the usual encoding of spreadsheet exports in Brazil.
pub fn read_ledger_file<P: AsRef<Path>>(path: P) -> Result<String, ImportError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_text_lossy(&bytes))
}

fn decode_text_lossy(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    tracing::debug!("ledger is not valid UTF-8, decoding as Windows-1252");
    let (decoded, _, _) = WINDOWS_1252.decode(bytes);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_detects_semicolon_from_header() {
        let ledger = Ledger::split("Desc;Valor\nSalário;5000\n").unwrap();
        assert_eq!(ledger.separator, ';');
        assert_eq!(ledger.rows().count(), 1);
    }

    #[test]
    fn test_split_defaults_to_comma() {
        let ledger = Ledger::split("Desc,Valor\nSalário;5000").unwrap();
        assert_eq!(ledger.separator, ',');
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        assert_eq!(rows[0].fields, vec!["Salário;5000".to_string()]);
    }

    #[test]
    fn test_split_needs_header_and_row() {
        assert!(Ledger::split("").is_none());
        assert!(Ledger::split("Desc;Valor").is_none());
        assert!(Ledger::split("Desc;Valor\n   \n\r\n").is_none());
    }

    #[test]
    fn test_rows_skip_blank_lines_and_strip_cr() {
        let ledger = Ledger::split("Desc;Valor\r\n\r\nA ; 1 \r\n  \nB;2\r\n").unwrap();
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].fields, vec!["A".to_string(), "1".to_string()]);
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].fields, vec!["B".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_expect_columns() {
        let row = LedgerRow {
            line: 4,
            fields: vec!["a".into(), "b".into(), "c".into()],
        };
        assert!(row.expect_columns(3).is_ok());
        match row.expect_columns(2) {
            Err(ImportError::MalformedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!((line, expected, found), (4, 2, 3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_decode_strips_bom_and_falls_back_to_windows_1252() {
        let mut utf8 = vec![0xEF, 0xBB, 0xBF];
        utf8.extend_from_slice("Descrição;Valor".as_bytes());
        assert_eq!(decode_text_lossy(&utf8), "Descrição;Valor");

        // "Salário" in Windows-1252
        let latin = [0x53, 0x61, 0x6C, 0xE1, 0x72, 0x69, 0x6F];
        assert_eq!(decode_text_lossy(&latin), "Salário");
    }

    #[test]
    fn test_read_missing_file_is_read_error() {
        let err = read_ledger_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }
}
