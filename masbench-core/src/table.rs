//! In-memory results table for one run, keyed by level name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::TableError;
use crate::record::{Column, MetricRecord};

/// Ordered per-level records of one run plus a level-name index.
///
/// Built once (from a log or a results file) and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTable {
    records: Vec<MetricRecord>,
    index: HashMap<String, usize>,
}

impl RunTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.upsert(record);
        }
        table
    }

    /// Adds a record, or replaces the record of the same level in place.
    ///
    /// Returns `true` when an earlier record was replaced.
    pub fn upsert(&mut self, record: MetricRecord) -> bool {
        if let Some(&slot) = self.index.get(&record.level_name) {
            self.records[slot] = record;
            true
        } else {
            self.index
                .insert(record.level_name.clone(), self.records.len());
            self.records.push(record);
            false
        }
    }

    /// Loads a persisted results file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read, or if it has no
    /// `LevelName` column.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file).map_err(|err| match err {
            ReadTableError::Csv(source) => TableError::Csv {
                path: path.to_path_buf(),
                source,
            },
            ReadTableError::MissingLevelColumn => TableError::MissingLevelColumn {
                path: path.to_path_buf(),
            },
        })?;
        log::debug!("loaded {} levels from {}", table.len(), path.display());
        Ok(table)
    }

    /// Reads CSV text with a header row.
    ///
    /// Columns are matched by header name, so extra or reordered columns are
    /// fine. Known columns that are absent read as empty cells.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed CSV or a missing `LevelName` header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReadTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let positions: Vec<(Column, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| Column::from_name(name.trim()).map(|col| (col, idx)))
            .collect();
        if !positions
            .iter()
            .any(|(column, _)| *column == Column::LevelName)
        {
            return Err(ReadTableError::MissingLevelColumn);
        }

        let mut table = Self::new();
        for row in csv_reader.records() {
            let row = row?;
            let mut record = MetricRecord::default();
            for &(column, idx) in &positions {
                if let Some(cell) = row.get(idx) {
                    record.set(column, cell);
                }
            }
            if record.level_name.is_empty() {
                continue;
            }
            let name = record.level_name.clone();
            if table.upsert(record) {
                log::warn!("duplicate row for level {name}; keeping the last one");
            }
        }
        Ok(table)
    }

    /// Writes the header and one row per level, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(Column::header())?;
        for record in &self.records {
            csv_writer.write_record(record.to_row())?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }

    pub fn level_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.level_name.as_str())
    }

    #[must_use]
    pub fn get(&self, level: &str) -> Option<&MetricRecord> {
        self.index.get(level).map(|&slot| &self.records[slot])
    }

    #[must_use]
    pub fn contains(&self, level: &str) -> bool {
        self.index.contains_key(level)
    }

    /// Text of a cell looked up by column name; absent levels, unknown
    /// columns and empty cells all read as `""`.
    #[must_use]
    pub fn text(&self, level: &str, column_name: &str) -> &str {
        self.get(level)
            .and_then(|record| record.field(column_name))
            .unwrap_or("")
    }

    /// Numeric cell value; absent or unparseable reads as `0.0`.
    #[must_use]
    pub fn number(&self, level: &str, column: Column) -> f64 {
        self.get(level).map_or(0.0, |record| record.number(column))
    }

    #[must_use]
    pub fn is_solved(&self, level: &str) -> bool {
        self.get(level).is_some_and(MetricRecord::is_solved)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Failure while reading CSV text into a table.
#[derive(Debug, thiserror::Error)]
pub enum ReadTableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("missing LevelName column")]
    MissingLevelColumn,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
LevelName,Solved,Actions,Time,Generated,Explored,MemoryAlloc,MaxAlloc
SAD1,Yes,30,2.5,100,80,12.5,20.0
SAD2,No,,,5000,4000,,
";

    #[test]
    fn loads_rows_in_order_with_lookup() {
        let table = RunTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.level_names().collect::<Vec<_>>(), ["SAD1", "SAD2"]);
        assert!(table.is_solved("SAD1"));
        assert!(!table.is_solved("SAD2"));
        assert!(!table.is_solved("SAD3"));
        assert!((table.number("SAD1", Column::Time) - 2.5).abs() < f64::EPSILON);
        assert!(table.number("SAD2", Column::Time).abs() < f64::EPSILON);
        assert_eq!(table.text("SAD2", "Generated"), "5000");
    }

    #[test]
    fn columns_are_resolved_by_name() {
        let csv = "Note,Time,LevelName,Solved,Extra\nx,1.25,MAbahaman,Yes,y\n";
        let table = RunTable::from_reader(csv.as_bytes()).unwrap();
        let record = table.get("MAbahaman").unwrap();
        assert_eq!(record.time, "1.25");
        assert!(record.is_solved());
        assert_eq!(record.actions, "");
        assert!(table.number("MAbahaman", Column::Actions).abs() < f64::EPSILON);
        assert_eq!(table.text("MAbahaman", "Note"), "");
    }

    #[test]
    fn missing_level_column_is_rejected() {
        let csv = "Solved,Time\nYes,1.0\n";
        assert!(matches!(
            RunTable::from_reader(csv.as_bytes()),
            Err(ReadTableError::MissingLevelColumn)
        ));
    }

    #[test]
    fn duplicate_levels_keep_first_position_and_last_values() {
        let csv = "LevelName,Actions\nA,1\nB,2\nA,3\n";
        let table = RunTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.level_names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(table.text("A", "Actions"), "3");
    }

    #[test]
    fn csv_round_trip_keeps_text() {
        let table = RunTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), SAMPLE);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RunTable::load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, TableError::Open { .. }));
    }
}
