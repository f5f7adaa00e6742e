//! CSV tables with a header row.
//!
//! Tabular data sources (dictionaries, patch tables) and the reports written
//! about them all go through [`Table`]. Rows may be ragged; missing cells read
//! as empty strings.

use crate::errors::EngineError;
use crate::output::atomic_write;
use encoding_rs::Encoding;
use std::io;
use std::path::Path;

/// Added to a 0-based data-row index to get the line a spreadsheet shows
/// for it (one for 1-based numbering, one for the header row).
pub const HEADER_ADJUST: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, EngineError> {
        let reader = reader_builder()
            .from_path(path)
            .map_err(|e| EngineError::table(path, e))?;
        Self::from_csv(reader, path)
    }

    /// Parse CSV that was already decoded; `path` only names the source in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, EngineError> {
        Self::from_csv(reader_builder().from_reader(text.as_bytes()), path)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        path: &Path,
    ) -> Result<Self, EngineError> {
        let headers = reader
            .headers()
            .map_err(|e| EngineError::table(path, e))?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h.to_string()
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| EngineError::table(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        log::debug!("read {} row(s) from {}", rows.len(), path.display());
        Ok(Self { headers, rows })
    }

    /// Write atomically as UTF-8, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        self.write_encoded(path, encoding_rs::UTF_8)
    }

    /// Write atomically in `encoding`. Characters it cannot represent are
    /// written as HTML numeric character references.
    pub fn write_encoded(
        &self,
        path: &Path,
        encoding: &'static Encoding,
    ) -> Result<(), EngineError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| EngineError::table(path, e))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| EngineError::table(path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EngineError::io(path, e.into_error()))?;
        if encoding == encoding_rs::UTF_8 {
            return atomic_write(path, &bytes);
        }

        let text = String::from_utf8(bytes)
            .map_err(|e| EngineError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
        let (encoded, actual, _) = encoding.encode(&text);
        if actual != encoding {
            log::warn!(
                "{} written as {} instead of {}",
                path.display(),
                actual.name(),
                encoding.name()
            );
        }
        atomic_write(path, &encoded)
    }

    /// Cell `col` of row `row`, or `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// A copy holding only the rows whose index satisfies `keep`.
    pub fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, r)| r.clone())
                .collect(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

/// Spreadsheet line for a 0-based data-row index.
pub fn line_of(index: usize) -> usize {
    index + HEADER_ADJUST
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "\u{feff}Key,Value\nfoo,bar\nlonely\n\"a,b\",c\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.headers, vec!["Key", "Value"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(1, 0), "lonely");
        assert_eq!(table.cell(1, 1), "");
        assert_eq!(table.cell(2, 0), "a,b");
    }

    #[test]
    fn test_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut table = Table::new(vec!["Offset".into(), "Value".into(), "Bytes".into()]);
        table.push(vec!["0x10".into(), "0xAA, 0xBB".into(), "2".into()]);
        table.write(&path).unwrap();

        assert_eq!(Table::read(&path).unwrap(), table);
    }

    #[test]
    fn test_parse_decoded_text() {
        let table = Table::parse("Key,Value\nテスト,test\n", Path::new("d.csv")).unwrap();
        assert_eq!(table.headers, vec!["Key", "Value"]);
        assert_eq!(table.cell(0, 0), "テスト");
    }

    #[test]
    fn test_write_encoded_shift_jis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut table = Table::new(vec!["Key".into(), "Value".into()]);
        table.push(vec!["テスト".into(), "test".into()]);
        table.write_encoded(&path, encoding_rs::SHIFT_JIS).unwrap();

        let (expected, _, _) = encoding_rs::SHIFT_JIS.encode("Key,Value\nテスト,test\n");
        assert_eq!(fs::read(&path).unwrap(), expected.into_owned());
    }

    #[test]
    fn test_retain_rows() {
        let mut table = Table::new(vec!["A".into()]);
        for v in ["x", "y", "z"] {
            table.push(vec![v.into()]);
        }
        let kept = table.retain_rows(|i| i != 1);
        assert_eq!(kept.rows, vec![vec!["x".to_string()], vec!["z".to_string()]]);
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of(0), 2);
    }
}
