//! Patch table validation.
//!
//! Two passes over the parsed rows:
//! 1. rows sharing `(offset, write_length)` are rejected as a group;
//! 2. the remaining rows, in table order, are checked against the ranges
//!    accepted so far, against their declared length, and (when the target
//!    size is known) against the end of the target.

use super::report::CONFLICT_REPORT_NAME;
use super::{ByteRange, Conflict, ConflictReport, PatchOperation, PatchRow};
use crate::errors::EngineError;
use crate::hex;
use crate::progress::Reporter;
use crate::table::Table;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Minimum columns of a patch table: offset, value, write length.
pub const REQUIRED_COLUMNS: usize = 3;

/// Parse an integer literal in any base: decimal, `0x`, `0o` or `0b`, with
/// an optional `+` and `_` between digits. Negative offsets are invalid.
///
/// ```
/// use text_replacer::patch::parse_offset;
///
/// assert_eq!(parse_offset("0x1F"), Some(31));
/// assert_eq!(parse_offset("1_000"), Some(1000));
/// assert_eq!(parse_offset("0b101"), Some(5));
/// assert_eq!(parse_offset("-4"), None);
/// ```
pub fn parse_offset(text: &str) -> Option<u64> {
    let t = text.trim();
    let t = t.strip_prefix('+').unwrap_or(t);
    let (digits, radix) = match t.get(..2) {
        Some("0x" | "0X") => (&t[2..], 16),
        Some("0o" | "0O") => (&t[2..], 8),
        Some("0b" | "0B") => (&t[2..], 2),
        _ => (t, 10),
    };
    // After a base prefix a single leading underscore is allowed ("0x_ff")
    let digits = if radix != 10 {
        digits.strip_prefix('_').unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty()
        || digits.starts_with(['_', '+', '-'])
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }
    u64::from_str_radix(&digits.replace('_', ""), radix).ok()
}

/// A positive decimal byte count.
pub fn parse_write_length(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// Parse every well-formed row; returns the rows and the indices of rows
/// skipped for an empty or unparsable cell.
pub fn parse_rows(table: &Table) -> (Vec<PatchRow>, Vec<usize>) {
    let mut rows = Vec::with_capacity(table.len());
    let mut skipped = Vec::new();

    for (i, cells) in table.rows.iter().enumerate() {
        let offset_text = table.cell(i, 0);
        let value_text = table.cell(i, 1);
        let length_text = table.cell(i, 2);
        if offset_text.trim().is_empty() || value_text.is_empty() || length_text.trim().is_empty()
        {
            skipped.push(i);
            continue;
        }

        match (parse_offset(offset_text), parse_write_length(length_text)) {
            (Some(offset), Some(write_length)) => rows.push(PatchRow {
                row_index: i,
                offset,
                value_text: value_text.to_string(),
                write_length,
                cells: cells.clone(),
            }),
            _ => {
                log::warn!(
                    "skipping patch row {}: offset {:?} / length {:?} not valid",
                    crate::table::line_of(i),
                    offset_text,
                    length_text
                );
                skipped.push(i);
            }
        }
    }

    (rows, skipped)
}

/// Outcome of validating a patch table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Accepted writes, in table order.
    pub operations: Vec<PatchOperation>,
    /// Row indices of the accepted writes, parallel to `operations`.
    pub accepted: Vec<usize>,
    pub report: ConflictReport,
    /// Rows skipped before validation for empty or malformed cells.
    pub skipped: Vec<usize>,
}

/// Run both validation passes over parsed rows.
///
/// `target_len`, when known, rejects rows whose write would end past the target.
pub fn validate_rows(rows: &[PatchRow], target_len: Option<u64>) -> Validation {
    // Pass 1: group by (offset, length), keeping first-appearance order
    let mut group_order: Vec<(u64, usize)> = Vec::new();
    let mut groups: HashMap<(u64, usize), Vec<&PatchRow>> = HashMap::new();
    for row in rows {
        let key = (row.offset, row.write_length);
        groups
            .entry(key)
            .or_insert_with(|| {
                group_order.push(key);
                Vec::new()
            })
            .push(row);
    }

    let mut duplicate_groups = Vec::new();
    let mut grouped: HashSet<usize> = HashSet::new();
    for key in &group_order {
        let members = &groups[key];
        if members.len() >= 2 {
            grouped.extend(members.iter().map(|r| r.row_index));
            duplicate_groups.push(Conflict::DuplicateOffset {
                rows: members.iter().map(|r| (*r).clone()).collect(),
            });
        }
    }

    // Pass 2: overlap, length and bounds checks in table order
    let mut written: Vec<(ByteRange, &PatchRow)> = Vec::new();
    let mut overlaps = Vec::new();
    let mut too_long = Vec::new();
    let mut out_of_range = Vec::new();
    let mut validation = Validation::default();

    for row in rows.iter().filter(|r| !grouped.contains(&r.row_index)) {
        let range = row.range();
        if let Some((_, causing)) = written.iter().find(|(r, _)| r.intersects(&range)) {
            overlaps.push(Conflict::Overlap {
                causing: (*causing).clone(),
                caused: row.clone(),
            });
            continue;
        }

        let mut bytes = hex::decode(&row.value_text);
        if bytes.len() > row.write_length {
            too_long.push(Conflict::ValueTooLong {
                row: row.clone(),
                decoded_len: bytes.len(),
            });
            continue;
        }

        if let Some(target_len) = target_len {
            let fits = row
                .offset
                .checked_add(row.write_length as u64)
                .is_some_and(|end| end <= target_len);
            if !fits {
                out_of_range.push(Conflict::OutOfRange {
                    row: row.clone(),
                    target_len,
                });
                continue;
            }
        }

        bytes.resize(row.write_length, 0);
        validation.operations.push(PatchOperation {
            offset: row.offset,
            bytes,
        });
        validation.accepted.push(row.row_index);
        written.push((range, row));
    }

    validation.report = ConflictReport::from_parts(duplicate_groups, overlaps, too_long, out_of_range);
    validation
}

/// File-backed validation with report and source rewrite.
#[derive(Debug, Clone, Default)]
pub struct PatchValidator {
    report_dir: Option<PathBuf>,
    target_len: Option<u64>,
}

impl PatchValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory for `Overlap.csv`; defaults to the patch table's directory.
    pub fn report_dir(mut self, dir: Option<impl Into<PathBuf>>) -> Self {
        self.report_dir = dir.map(Into::into);
        self
    }

    /// Size of the file the operations will be applied to.
    pub fn target_len(mut self, len: Option<u64>) -> Self {
        self.target_len = len;
        self
    }

    /// Validate the table at `path`.
    ///
    /// When anything is rejected, writes the conflict report, rewrites the
    /// table with only the accepted rows and notifies the reporter.
    pub fn validate_file(
        &self,
        path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<Validation, EngineError> {
        let table = Table::read(path)?;
        if table.headers.len() < REQUIRED_COLUMNS {
            reporter.notify(
                "Missing column",
                "The patch table must have three columns: Offset, Value, Bytes.",
            );
            return Err(EngineError::MissingColumn {
                path: path.to_path_buf(),
                found: table.headers.len(),
            });
        }

        let (rows, skipped) = parse_rows(&table);
        let mut validation = validate_rows(&rows, self.target_len);
        validation.skipped = skipped;

        log::info!(
            "{} of {} patch row(s) accepted from {}",
            validation.operations.len(),
            table.len(),
            path.display()
        );

        if !validation.report.is_empty() {
            self.persist_conflicts(path, &table, &validation, reporter)?;
        }
        Ok(validation)
    }

    fn persist_conflicts(
        &self,
        path: &Path,
        table: &Table,
        validation: &Validation,
        reporter: &dyn Reporter,
    ) -> Result<(), EngineError> {
        let report_path = self.report_path(path);
        validation
            .report
            .to_table(&table.headers)
            .write(&report_path)?;

        let accepted: BTreeSet<usize> = validation.accepted.iter().copied().collect();
        table.retain_rows(|i| accepted.contains(&i)).write(path)?;

        let groups = validation.report.duplicate_groups();
        let others = validation.report.other_conflicts();
        let table_name = file_name(path);
        let report_name = file_name(&report_path);
        log::warn!("{groups} duplicate-offset group(s) and {others} other conflict(s) in {table_name}");
        reporter.notify(
            "Patch data errors",
            &format!(
                "Found {groups} group(s) of rows with duplicate offsets and {others} other conflict(s).\n\
                 These rows were saved to {report_name} and removed from {table_name}.\n\
                 Please review {report_name}."
            ),
        );
        Ok(())
    }

    fn report_path(&self, source: &Path) -> PathBuf {
        let dir = match &self.report_dir {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        dir.join(CONFLICT_REPORT_NAME)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
