//! Server/client log parsing.
//!
//! The server prints a "running client on level file" line before each level
//! and a handful of tagged result lines afterwards; the client reports search
//! statistics on its own tagged lines. There is no end-of-level marker, so a
//! level's record is closed by the next level start or by the end of the log.

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ParseError;
use crate::record::{Column, MetricRecord, level_name_from_path, strip_grouping};
use crate::table::RunTable;

const LEVEL_PATTERN: &str = r"\[server\]\[info\] Running client on level file: (\S+)";
const SOLVED_PATTERN: &str = r"\[server\]\[info\] Level solved: (Yes|No)";
const ACTIONS_PATTERN: &str = r"\[server\]\[info\] Actions used: (\d[\d,]*)";
const TIME_PATTERN: &str = r"\[server\]\[info\] Time to solve: (\d[\d,]*(?:\.\d+)?|\.\d+) seconds";
const EXPLORED_PATTERN: &str = r"\[client\]\[message\].*?\bExplored: (\d[\d,]*)";
const GENERATED_PATTERN: &str = r"\[client\]\[message\].*?\bGenerated: (\d[\d,]*)";
// `\b` keeps "MaxAlloc:" from matching as "Alloc:".
const ALLOC_PATTERN: &str = r"\[client\]\[message\].*?\bAlloc: ([0-9.]+) MB";
const MAX_ALLOC_PATTERN: &str = r"\[client\]\[message\].*?\bMaxAlloc: ([0-9.]+) MB";

/// Compiled line patterns, one per extracted field.
#[derive(Debug, Clone)]
struct LogPatterns {
    level: Regex,
    fields: Vec<(Column, Regex)>,
}

impl LogPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            level: Regex::new(LEVEL_PATTERN)?,
            fields: vec![
                (Column::Solved, Regex::new(SOLVED_PATTERN)?),
                (Column::Actions, Regex::new(ACTIONS_PATTERN)?),
                (Column::Time, Regex::new(TIME_PATTERN)?),
                (Column::Explored, Regex::new(EXPLORED_PATTERN)?),
                (Column::Generated, Regex::new(GENERATED_PATTERN)?),
                (Column::MemoryAlloc, Regex::new(ALLOC_PATTERN)?),
                (Column::MaxAlloc, Regex::new(MAX_ALLOC_PATTERN)?),
            ],
        })
    }
}

/// Parser state between lines.
#[derive(Debug, Clone, Default)]
enum ParserState {
    #[default]
    Idle,
    Building(MetricRecord),
}

/// Turns log lines into one [`MetricRecord`] per level.
#[derive(Debug, Clone)]
pub struct LogParser {
    patterns: LogPatterns,
}

impl LogParser {
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            patterns: LogPatterns::compile()?,
        })
    }

    /// Parses an in-memory sequence of lines. Unmatched lines are ignored.
    pub fn parse_lines<I, S>(&self, lines: I) -> RunTable
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = RunTable::new();
        let state = lines
            .into_iter()
            .fold(ParserState::Idle, |state, line| {
                self.step(state, line.as_ref(), &mut table)
            });
        flush(state, &mut table);
        log::debug!("parsed {} level records", table.len());
        table
    }

    /// Parses a buffered log stream to completion.
    ///
    /// Invalid UTF-8 is replaced rather than rejected so that binary noise in
    /// a captured log does not abort the parse.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> std::io::Result<RunTable> {
        let mut table = RunTable::new();
        let mut state = ParserState::Idle;
        for chunk in reader.split(b'\n') {
            let chunk = chunk?;
            let line = String::from_utf8_lossy(&chunk);
            state = self.step(state, line.trim_end_matches('\r'), &mut table);
        }
        flush(state, &mut table);
        log::debug!("parsed {} level records", table.len());
        Ok(table)
    }

    /// Opens and parses a log file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<RunTable, ParseError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader(BufReader::new(file))
            .map_err(|source| ParseError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    fn step(&self, state: ParserState, line: &str, table: &mut RunTable) -> ParserState {
        let state = match self.patterns.level.captures(line) {
            Some(caps) => {
                flush(state, table);
                let level_name = level_name_from_path(&caps[1]);
                log::debug!("level start: {level_name}");
                ParserState::Building(MetricRecord::new(level_name))
            }
            None => state,
        };

        match state {
            ParserState::Idle => ParserState::Idle,
            ParserState::Building(mut record) => {
                for (column, pattern) in &self.patterns.fields {
                    if let Some(caps) = pattern.captures(line) {
                        record.set(*column, strip_grouping(&caps[1]));
                    }
                }
                ParserState::Building(record)
            }
        }
    }
}

fn flush(state: ParserState, table: &mut RunTable) {
    if let ParserState::Building(record) = state {
        let name = record.level_name.clone();
        if table.upsert(record) {
            log::warn!("level {name} appeared more than once; keeping the latest attempt");
        }
    }
}

/// Parses `log_path` and writes the results table to `csv_path`.
///
/// Nothing is written unless the whole log was read successfully. Returns
/// the number of level records written.
///
/// # Errors
///
/// Returns an error if the log cannot be read or the CSV cannot be written.
pub fn parse_log_to_csv(
    log_path: impl AsRef<Path>,
    csv_path: impl AsRef<Path>,
) -> Result<usize, ParseError> {
    let table = LogParser::new()?.parse_file(log_path)?;
    let csv_path = csv_path.as_ref();
    let file = File::create(csv_path).map_err(|source| ParseError::Create {
        path: csv_path.to_path_buf(),
        source,
    })?;
    table.write_csv(file).map_err(|source| ParseError::Write {
        path: csv_path.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {} level records to {}",
        table.len(),
        csv_path.display()
    );
    Ok(table.len())
}
