//! Binary patching driven by offset/value/length tables.
//!
//! A patch table is validated into disjoint, length-exact
//! [`PatchOperation`]s. Rows that collide with others, carry a value longer
//! than their declared length, or reach past the target are rejected one by
//! one and collected in a [`ConflictReport`]; the rest still apply.

pub mod patcher;
pub mod report;
pub mod validator;

pub use patcher::apply;
pub use report::{ConflictReport, CONFLICT_REPORT_NAME};
pub use validator::{
    parse_offset, parse_rows, parse_write_length, validate_rows, PatchValidator, Validation,
};

use crate::table::line_of;

/// One parsed row of a patch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRow {
    /// 0-based data-row index in the source table.
    pub row_index: usize,
    pub offset: u64,
    pub value_text: String,
    pub write_length: usize,
    /// The raw cells, kept so reports and rewrites preserve every column.
    pub cells: Vec<String>,
}

impl PatchRow {
    /// Spreadsheet line of this row.
    pub fn line(&self) -> usize {
        line_of(self.row_index)
    }

    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.offset, self.write_length)
    }
}

/// Inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Range covering `len` bytes from `start`; `len` must be positive.
    pub fn new(start: u64, len: usize) -> Self {
        let last = (len as u64).saturating_sub(1);
        Self {
            start,
            end: start.saturating_add(last),
        }
    }

    pub fn intersects(&self, other: &ByteRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

/// A validated write: `bytes` go at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOperation {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

/// Why rows were rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Two or more rows share offset and length; none of them is applied.
    DuplicateOffset { rows: Vec<PatchRow> },
    /// `caused` overlaps the already accepted `causing` row.
    Overlap { causing: PatchRow, caused: PatchRow },
    /// The decoded value does not fit in the declared length.
    ValueTooLong { row: PatchRow, decoded_len: usize },
    /// The write would reach past the end of the target.
    OutOfRange { row: PatchRow, target_len: u64 },
}

impl Conflict {
    /// Rows this conflict keeps out of the operation list.
    pub fn rejected_rows(&self) -> Vec<&PatchRow> {
        match self {
            Conflict::DuplicateOffset { rows } => rows.iter().collect(),
            Conflict::Overlap { caused, .. } => vec![caused],
            Conflict::ValueTooLong { row, .. } | Conflict::OutOfRange { row, .. } => vec![row],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_intersection_is_inclusive() {
        let a = ByteRange::new(0, 4);
        assert_eq!(a, ByteRange { start: 0, end: 3 });
        assert!(a.intersects(&ByteRange::new(2, 4)));
        assert!(a.intersects(&ByteRange::new(3, 1)));
        assert!(!a.intersects(&ByteRange::new(4, 1)));
        assert!(ByteRange::new(10, 1).intersects(&ByteRange::new(0, 11)));
    }

    #[test]
    fn test_row_line() {
        let row = PatchRow {
            row_index: 3,
            offset: 0,
            value_text: String::new(),
            write_length: 1,
            cells: Vec::new(),
        };
        assert_eq!(row.line(), 5);
    }
}
