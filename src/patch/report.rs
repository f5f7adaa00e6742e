use super::{Conflict, PatchRow};
use crate::table::Table;
use std::collections::BTreeSet;

/// File name of the conflict report inside the report directory.
pub const CONFLICT_REPORT_NAME: &str = "Overlap.csv";

/// Extra columns appended to the source header.
const KIND_COLUMN: &str = "Kind";
const ROW_COLUMN: &str = "Row";
const SEPARATOR: &str = "---";

/// Rejected rows of one validation run, in report order: duplicate-offset
/// groups, then overlaps, then over-long values, then out-of-range writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub(crate) fn from_parts(
        duplicate_groups: Vec<Conflict>,
        overlaps: Vec<Conflict>,
        too_long: Vec<Conflict>,
        out_of_range: Vec<Conflict>,
    ) -> Self {
        let mut conflicts = duplicate_groups;
        conflicts.extend(overlaps);
        conflicts.extend(too_long);
        conflicts.extend(out_of_range);
        Self { conflicts }
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn duplicate_groups(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|c| matches!(c, Conflict::DuplicateOffset { .. }))
            .count()
    }

    /// Overlap pairs plus single-row rejections.
    pub fn other_conflicts(&self) -> usize {
        self.conflicts.len() - self.duplicate_groups()
    }

    /// Row indices kept out of the operation list.
    pub fn rejected_rows(&self) -> BTreeSet<usize> {
        self.conflicts
            .iter()
            .flat_map(Conflict::rejected_rows)
            .map(|r| r.row_index)
            .collect()
    }

    /// Tabular form: the source columns plus `Kind` and `Row`, with a
    /// separator row between conflicts.
    pub fn to_table(&self, source_headers: &[String]) -> Table {
        let mut headers = source_headers.to_vec();
        headers.push(KIND_COLUMN.to_string());
        headers.push(ROW_COLUMN.to_string());
        let width = source_headers.len();

        let mut table = Table::new(headers);
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                let mut sep = vec![String::new(); width];
                sep.push(SEPARATOR.to_string());
                sep.push(String::new());
                table.push(sep);
            }
            for (row, kind) in tagged_rows(conflict) {
                let mut cells = row.cells.clone();
                cells.resize(width, String::new());
                cells.push(kind.to_string());
                cells.push(row.line().to_string());
                table.push(cells);
            }
        }
        table
    }
}

fn tagged_rows(conflict: &Conflict) -> Vec<(&PatchRow, &'static str)> {
    match conflict {
        Conflict::DuplicateOffset { rows } => {
            rows.iter().map(|r| (r, "duplicate-offset")).collect()
        }
        Conflict::Overlap { causing, caused } => {
            vec![(causing, "overlap-causing"), (caused, "overlap-caused")]
        }
        Conflict::ValueTooLong { row, .. } => vec![(row, "value-too-long")],
        Conflict::OutOfRange { row, .. } => vec![(row, "out-of-range")],
    }
}
