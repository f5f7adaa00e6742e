use crate::table::Table;
use std::collections::{BTreeSet, HashMap};

/// File name of the duplicate report inside the report directory.
pub const DUPLICATE_REPORT_NAME: &str = "Duplicate.csv";

/// Separator written in the `Line` column between key groups.
pub const GROUP_SEPARATOR: &str = "---";

/// One occurrence of a key that appears more than once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DuplicateRecord {
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Every occurrence of every duplicated key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    records: Vec<DuplicateRecord>,
}

impl DuplicateReport {
    pub fn new(records: Vec<DuplicateRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in detection order.
    pub fn records(&self) -> &[DuplicateRecord] {
        &self.records
    }

    /// Records grouped by key. Groups are ordered by their first line and
    /// records by line; identical records collapse.
    pub fn groups(&self) -> Vec<Vec<&DuplicateRecord>> {
        let mut sorted: Vec<&DuplicateRecord> = self.records.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut order: Vec<&str> = Vec::new();
        let mut by_key: HashMap<&str, Vec<&DuplicateRecord>> = HashMap::new();
        for record in sorted {
            let key = record.key.as_str();
            by_key
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record);
        }

        order
            .into_iter()
            .filter_map(|key| by_key.remove(key))
            .collect()
    }

    /// Number of distinct duplicated keys.
    pub fn group_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.key.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Every line number that takes part in a duplicate.
    pub fn lines(&self) -> BTreeSet<usize> {
        self.records.iter().map(|r| r.line).collect()
    }

    /// Tabular form: `Line, Duplicate key, Value`, with a separator row
    /// between groups.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            "Line".to_string(),
            "Duplicate key".to_string(),
            "Value".to_string(),
        ]);
        for (i, group) in self.groups().into_iter().enumerate() {
            if i > 0 {
                table.push(vec![GROUP_SEPARATOR.to_string(), String::new(), String::new()]);
            }
            for record in group {
                table.push(vec![
                    record.line.to_string(),
                    record.key.clone(),
                    record.value.clone(),
                ]);
            }
        }
        table
    }
}
