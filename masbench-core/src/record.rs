use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    COL_ACTIONS, COL_EXPLORED, COL_GENERATED, COL_LEVEL_NAME, COL_MAX_ALLOC, COL_MEMORY_ALLOC,
    COL_SOLVED, COL_TIME, SOLVED_NO, SOLVED_YES,
};

/// A column of the persisted results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    LevelName,
    Solved,
    Actions,
    Time,
    Generated,
    Explored,
    MemoryAlloc,
    MaxAlloc,
}

impl Column {
    /// Fixed column order of the results file.
    pub const ALL: [Self; 8] = [
        Self::LevelName,
        Self::Solved,
        Self::Actions,
        Self::Time,
        Self::Generated,
        Self::Explored,
        Self::MemoryAlloc,
        Self::MaxAlloc,
    ];

    /// Numeric metrics compared between runs, all lower-is-better.
    pub const COMPARED: [Self; 5] = [
        Self::Generated,
        Self::Explored,
        Self::MemoryAlloc,
        Self::Time,
        Self::Actions,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LevelName => COL_LEVEL_NAME,
            Self::Solved => COL_SOLVED,
            Self::Actions => COL_ACTIONS,
            Self::Time => COL_TIME,
            Self::Generated => COL_GENERATED,
            Self::Explored => COL_EXPLORED,
            Self::MemoryAlloc => COL_MEMORY_ALLOC,
            Self::MaxAlloc => COL_MAX_ALLOC,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }

    #[must_use]
    pub fn header() -> [&'static str; 8] {
        Self::ALL.map(Self::name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome reported by the server for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Solved {
    Yes,
    No,
}

impl Solved {
    /// Parses the literal `Yes`/`No` cell; anything else is unknown.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            SOLVED_YES => Some(Self::Yes),
            SOLVED_NO => Some(Self::No),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => SOLVED_YES,
            Self::No => SOLVED_NO,
        }
    }
}

impl fmt::Display for Solved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements for one level of one run.
///
/// Cells are kept as text, the way they appear in the log and the results
/// file. Typed access goes through [`MetricRecord::number`] and
/// [`MetricRecord::solved`], which never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub level_name: String,
    pub solved: String,
    pub actions: String,
    pub time: String,
    pub generated: String,
    pub explored: String,
    pub memory_alloc: String,
    pub max_alloc: String,
}

impl MetricRecord {
    #[must_use]
    pub fn new(level_name: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::LevelName => &self.level_name,
            Column::Solved => &self.solved,
            Column::Actions => &self.actions,
            Column::Time => &self.time,
            Column::Generated => &self.generated,
            Column::Explored => &self.explored,
            Column::MemoryAlloc => &self.memory_alloc,
            Column::MaxAlloc => &self.max_alloc,
        }
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        let slot = match column {
            Column::LevelName => &mut self.level_name,
            Column::Solved => &mut self.solved,
            Column::Actions => &mut self.actions,
            Column::Time => &mut self.time,
            Column::Generated => &mut self.generated,
            Column::Explored => &mut self.explored,
            Column::MemoryAlloc => &mut self.memory_alloc,
            Column::MaxAlloc => &mut self.max_alloc,
        };
        *slot = value.into();
    }

    /// Looks a cell up by column name. Unknown names yield `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        Column::from_name(name).map(|column| self.get(column))
    }

    /// Cells in results-file order.
    #[must_use]
    pub fn to_row(&self) -> [&str; 8] {
        Column::ALL.map(|column| self.get(column))
    }

    #[must_use]
    pub fn solved(&self) -> Option<Solved> {
        Solved::parse(&self.solved)
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.solved() == Some(Solved::Yes)
    }

    /// Numeric value of a cell; empty or unparseable cells read as `0.0`.
    #[must_use]
    pub fn number(&self, column: Column) -> f64 {
        parse_number(self.get(column))
    }
}

/// Lenient float parse used for every numeric cell.
#[must_use]
pub fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Drops grouping separators from a captured number (`1,234` -> `1234`).
#[must_use]
pub fn strip_grouping(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',').collect()
}

/// Level name for a level file path: base name without its extension.
///
/// Both `/` and `\` count as directory separators since server logs may come
/// from either platform.
#[must_use]
pub fn level_name_from_path(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.rfind('.') {
        Some(dot) => base[..dot].to_string(),
        None => base.to_string(),
    }
}
