//! Loading dictionaries from `key=value` text files and CSV tables.

use super::report::DUPLICATE_REPORT_NAME;
use super::{DictionaryBuilder, DictionaryEntry, DuplicateReport, TranslationMap};
use crate::encoding;
use crate::errors::EngineError;
use crate::progress::Reporter;
use crate::table::{line_of, Table};
use crate::wrap::split_lines;
use encoding_rs::Encoding;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a dictionary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionarySource {
    /// Line-delimited `key=value` text. Never rewritten.
    Text(PathBuf),
    /// Two-column CSV with a header row. Rewritten without duplicated rows
    /// when duplicates are found.
    Table(PathBuf),
}

impl DictionarySource {
    /// Pick the source kind from the file extension (`.txt` or `.csv`).
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => Ok(DictionarySource::Text(path)),
            Some("csv") => Ok(DictionarySource::Table(path)),
            _ => Err(EngineError::UnsupportedSource(path)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DictionarySource::Text(p) | DictionarySource::Table(p) => p,
        }
    }

    fn display_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// Entries of a `key=value` text, numbered by 1-based line.
///
/// `\r\n`, `\n` and a bare `\r` all end a line. Lines are trimmed and split
/// at the first `=`; key and value are trimmed again. Lines without `=` are
/// not entries.
pub fn parse_text_entries(text: &str) -> Vec<(usize, DictionaryEntry)> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, (line, _))| {
            let (key, value) = line.trim().split_once('=')?;
            Some((i + 1, DictionaryEntry::new(key.trim(), value.trim())))
        })
        .collect()
}

/// Entries of a two-column table, numbered by spreadsheet line.
pub fn parse_table_entries(table: &Table) -> Vec<(usize, DictionaryEntry)> {
    (0..table.len())
        .filter_map(|i| {
            let key = table.cell(i, 0).trim();
            if key.is_empty() {
                return None;
            }
            Some((line_of(i), DictionaryEntry::new(key, table.cell(i, 1).trim())))
        })
        .collect()
}

/// Loads a [`TranslationMap`], refusing dictionaries with repeated keys.
#[derive(Debug, Clone, Default)]
pub struct DictionaryLoader {
    encoding: Option<String>,
    report_dir: Option<PathBuf>,
}

impl DictionaryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoding label for text and CSV dictionaries; detected when unset.
    /// A stripped CSV dictionary is written back in the same encoding.
    pub fn encoding(mut self, label: Option<impl Into<String>>) -> Self {
        self.encoding = label.map(Into::into);
        self
    }

    /// Directory for `Duplicate.csv`; defaults to the dictionary's directory.
    pub fn report_dir(mut self, dir: Option<impl Into<PathBuf>>) -> Self {
        self.report_dir = dir.map(Into::into);
        self
    }

    pub fn load(
        &self,
        source: &DictionarySource,
        reporter: &dyn Reporter,
    ) -> Result<TranslationMap, EngineError> {
        let path = source.path();
        let (entries, table) = match source {
            DictionarySource::Text(_) => {
                let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
                let enc = encoding::resolve(self.encoding.as_deref(), &bytes)?;
                let text = encoding::decode_strict(&bytes, enc, path)?;
                (parse_text_entries(&text), None)
            }
            DictionarySource::Table(_) => {
                let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
                let enc = encoding::resolve(self.encoding.as_deref(), &bytes)?;
                let table = Table::parse(&encoding::decode_strict(&bytes, enc, path)?, path)?;
                (parse_table_entries(&table), Some((table, enc)))
            }
        };

        let mut builder = DictionaryBuilder::new();
        for (line, entry) in entries {
            builder.insert(line, entry);
        }
        let (map, duplicates) = builder.finish();

        if duplicates.is_empty() {
            log::info!("loaded {} dictionary entries from {}", map.len(), path.display());
            return Ok(map);
        }

        let table = table.as_ref().map(|(table, enc)| (table, *enc));
        Err(self.reject(source, table, &duplicates, reporter)?)
    }

    /// Write the report, strip a tabular source, notify, and build the error
    /// the load fails with.
    fn reject(
        &self,
        source: &DictionarySource,
        table: Option<(&Table, &'static Encoding)>,
        duplicates: &DuplicateReport,
        reporter: &dyn Reporter,
    ) -> Result<EngineError, EngineError> {
        let path = source.path();
        let report_path = self.report_path(path);
        duplicates.to_table().write(&report_path)?;

        if let Some((table, enc)) = table {
            let lines = duplicates.lines();
            table
                .retain_rows(|i| !lines.contains(&line_of(i)))
                .write_encoded(path, enc)?;
        }

        let groups = duplicates.group_count();
        let name = source.display_name();
        let report_name = report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DUPLICATE_REPORT_NAME.to_string());
        let advice = match source {
            DictionarySource::Table(_) => format!(
                "The duplicated rows were removed from {name}.\n\
                 Check {report_name} and restore the rows you want to keep."
            ),
            DictionarySource::Text(_) => format!(
                "Text dictionaries are never modified automatically.\n\
                 Check {report_name} and fix {name} by hand."
            ),
        };
        log::warn!("{groups} duplicated key(s) in {}", path.display());
        reporter.notify(
            &format!("Duplicate keys in dictionary {name}"),
            &format!("Saved {groups} duplicated key group(s) to {report_name}.\n(Dictionary: {name})\n\n{advice}"),
        );

        Ok(EngineError::DuplicateDetected {
            source_file: path.to_path_buf(),
            groups,
            report: report_path,
        })
    }

    fn report_path(&self, source: &Path) -> PathBuf {
        let dir = match &self.report_dir {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        dir.join(DUPLICATE_REPORT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingReporter;

    #[test]
    fn test_parse_text_entries() {
        let text = "  foo = bar \nno separator\n\nkey=a=b\r\n=empty key\n";
        let entries = parse_text_entries(text);
        assert_eq!(
            entries,
            vec![
                (1, DictionaryEntry::new("foo", "bar")),
                (4, DictionaryEntry::new("key", "a=b")),
                (5, DictionaryEntry::new("", "empty key")),
            ]
        );
    }

    #[test]
    fn test_parse_text_entries_cr_only() {
        let entries = parse_text_entries("a=1\rb=2\r\rc=3\r");
        assert_eq!(
            entries,
            vec![
                (1, DictionaryEntry::new("a", "1")),
                (2, DictionaryEntry::new("b", "2")),
                (4, DictionaryEntry::new("c", "3")),
            ]
        );
    }

    #[test]
    fn test_parse_text_entries_mixed_endings() {
        let entries = parse_text_entries("a=1\r\nb=2\rc=3\nd=4");
        let lines: Vec<usize> = entries.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert_eq!(entries[3].1, DictionaryEntry::new("d", "4"));
    }

    #[test]
    fn test_source_from_path() {
        assert!(matches!(
            DictionarySource::from_path("d.TXT"),
            Ok(DictionarySource::Text(_))
        ));
        assert!(matches!(
            DictionarySource::from_path("d.csv"),
            Ok(DictionarySource::Table(_))
        ));
        assert!(matches!(
            DictionarySource::from_path("d.xlsx"),
            Err(EngineError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_load_text_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.txt");
        fs::write(&path, "foo=bar\nhello=xin chào\n").unwrap();

        let map = DictionaryLoader::new()
            .load(&DictionarySource::Text(path), &RecordingReporter::new())
            .unwrap();
        assert_eq!(map.get("hello"), Some("xin chào"));
        assert!(!dir.path().join(DUPLICATE_REPORT_NAME).exists());
    }

    #[test]
    fn test_text_duplicates_leave_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.txt");
        let original = "foo=one\nbar=x\nfoo=two\n";
        fs::write(&path, original).unwrap();

        let recorder = RecordingReporter::new();
        let err = DictionaryLoader::new()
            .load(&DictionarySource::Text(path.clone()), &recorder)
            .unwrap_err();

        match err {
            EngineError::DuplicateDetected { groups, report, .. } => {
                assert_eq!(groups, 1);
                let table = Table::read(&report).unwrap();
                assert_eq!(table.cell(0, 0), "1");
                assert_eq!(table.cell(0, 2), "one");
                assert_eq!(table.cell(1, 0), "3");
                assert_eq!(table.cell(1, 2), "two");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        let notes = recorder.notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].0.contains("dictionary.txt"));
        assert!(notes[0].1.contains("never modified"));
    }

    #[test]
    fn test_table_duplicates_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.csv");
        fs::write(&path, "Source,Target\nfoo,one\nbar,x\nfoo,two\nbaz,y\n").unwrap();
        let reports = dir.path().join("reports");
        fs::create_dir(&reports).unwrap();

        let recorder = RecordingReporter::new();
        let err = DictionaryLoader::new()
            .report_dir(Some(&reports))
            .load(&DictionarySource::Table(path.clone()), &recorder)
            .unwrap_err();
        assert!(err.is_duplicate());

        let remaining = Table::read(&path).unwrap();
        assert_eq!(remaining.headers, vec!["Source", "Target"]);
        let keys: Vec<&str> = remaining.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(keys, vec!["bar", "baz"]);

        let report = Table::read(&reports.join(DUPLICATE_REPORT_NAME)).unwrap();
        let lines: Vec<&str> = report.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(lines, vec!["2", "4"]);
        assert!(recorder.notifications()[0].1.contains("removed"));
    }

    #[test]
    fn test_text_dictionary_with_bad_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.txt");
        fs::write(&path, b"foo=\xFF\xFE\xFD bar\n").unwrap();

        let err = DictionaryLoader::new()
            .encoding(Some("utf-8"))
            .load(&DictionarySource::Text(path), &RecordingReporter::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::EncodingFailure { .. }));
    }

    fn shift_jis(text: &str) -> Vec<u8> {
        encoding_rs::SHIFT_JIS.encode(text).0.into_owned()
    }

    #[test]
    fn test_load_table_dictionary_in_configured_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.csv");
        fs::write(&path, shift_jis("Source,Target\nテスト,test\n猫,cat\n")).unwrap();

        let map = DictionaryLoader::new()
            .encoding(Some("shift_jis"))
            .load(&DictionarySource::Table(path), &RecordingReporter::new())
            .unwrap();
        assert_eq!(map.get("テスト"), Some("test"));
        assert_eq!(map.get("猫"), Some("cat"));
    }

    #[test]
    fn test_stripped_table_keeps_its_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.csv");
        fs::write(&path, shift_jis("Source,Target\n猫,cat\n犬,dog\n猫,kitty\n")).unwrap();

        let err = DictionaryLoader::new()
            .encoding(Some("shift_jis"))
            .load(&DictionarySource::Table(path.clone()), &RecordingReporter::new())
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(fs::read(&path).unwrap(), shift_jis("Source,Target\n犬,dog\n"));
    }

    #[test]
    fn test_table_dictionary_with_bad_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.csv");
        fs::write(&path, shift_jis("Source,Target\nテスト,test\n")).unwrap();

        let err = DictionaryLoader::new()
            .encoding(Some("utf-8"))
            .load(&DictionarySource::Table(path), &RecordingReporter::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::EncodingFailure { .. }));
    }
}
