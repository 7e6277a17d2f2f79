//! Pairwise comparison of two runs.
//!
//! The report is primary-centric: it covers exactly the levels of the first
//! run, in that run's order. Levels only the baseline attempted do not
//! appear; swap the arguments to see them.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{COMPARISON_TITLE, TIMESTAMP_FORMAT};
use crate::record::{Column, Solved};
use crate::table::RunTable;

/// Direction of a change between the baseline and the primary run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Improvement,
    Regression,
    Unchanged,
}

impl ChangeStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::Regression => "regression",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One numeric metric of one level, primary (`value1`) against baseline (`value2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub value1: f64,
    pub value2: f64,
    pub diff: f64,
    /// Difference relative to the baseline, in percent; `0` when the baseline is `0`.
    pub diff_pct: f64,
    pub status: ChangeStatus,
    pub is_improvement: bool,
}

impl MetricComparison {
    /// Compares a lower-is-better metric.
    #[must_use]
    pub fn lower_is_better(value1: f64, value2: f64) -> Self {
        let diff = value1 - value2;
        let diff_pct = if value2 == 0.0 {
            0.0
        } else {
            (diff / value2) * 100.0
        };
        let status = if diff == 0.0 {
            ChangeStatus::Unchanged
        } else if diff < 0.0 {
            ChangeStatus::Improvement
        } else {
            ChangeStatus::Regression
        };
        Self {
            value1,
            value2,
            diff,
            diff_pct,
            status,
            is_improvement: status == ChangeStatus::Improvement,
        }
    }

    fn force(&mut self, status: ChangeStatus) {
        self.status = status;
        self.is_improvement = status == ChangeStatus::Improvement;
    }
}

/// Solved cells of both runs for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedComparison {
    pub solved1: String,
    pub solved2: String,
    pub changed: bool,
    pub status: ChangeStatus,
}

impl SolvedComparison {
    #[must_use]
    pub fn new(solved1: &str, solved2: &str) -> Self {
        let changed = solved1 != solved2;
        let status = if !changed {
            ChangeStatus::Unchanged
        } else if Solved::parse(solved1) == Some(Solved::Yes)
            && Solved::parse(solved2) == Some(Solved::No)
        {
            ChangeStatus::Improvement
        } else {
            ChangeStatus::Regression
        };
        Self {
            solved1: solved1.to_string(),
            solved2: solved2.to_string(),
            changed,
            status,
        }
    }

    /// Status that overrides every metric of the level, if the solved state flipped.
    #[must_use]
    pub fn override_status(&self) -> Option<ChangeStatus> {
        match (Solved::parse(&self.solved1), Solved::parse(&self.solved2)) {
            (Some(Solved::Yes), Some(Solved::No)) => Some(ChangeStatus::Improvement),
            (Some(Solved::No), Some(Solved::Yes)) => Some(ChangeStatus::Regression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelComparison {
    pub level_name: String,
    /// `false` when the baseline never attempted this level; its values then read as zero.
    pub baseline_present: bool,
    pub generated: MetricComparison,
    pub explored: MetricComparison,
    pub memory_alloc: MetricComparison,
    pub time: MetricComparison,
    pub actions: MetricComparison,
    pub solved: SolvedComparison,
}

impl LevelComparison {
    #[must_use]
    pub fn metric(&self, column: Column) -> Option<&MetricComparison> {
        match column {
            Column::Generated => Some(&self.generated),
            Column::Explored => Some(&self.explored),
            Column::MemoryAlloc => Some(&self.memory_alloc),
            Column::Time => Some(&self.time),
            Column::Actions => Some(&self.actions),
            _ => None,
        }
    }

    /// Compared metrics in report order.
    #[must_use]
    pub fn metrics(&self) -> [(Column, &MetricComparison); 5] {
        [
            (Column::Generated, &self.generated),
            (Column::Explored, &self.explored),
            (Column::MemoryAlloc, &self.memory_alloc),
            (Column::Time, &self.time),
            (Column::Actions, &self.actions),
        ]
    }

    fn metrics_mut(&mut self) -> [&mut MetricComparison; 5] {
        [
            &mut self.generated,
            &mut self.explored,
            &mut self.memory_alloc,
            &mut self.time,
            &mut self.actions,
        ]
    }
}

/// Tally of statuses for one metric across all levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub improvements: usize,
    pub regressions: usize,
    pub unchanged: usize,
}

impl StatusCounts {
    fn record(&mut self, status: ChangeStatus) {
        match status {
            ChangeStatus::Improvement => self.improvements += 1,
            ChangeStatus::Regression => self.regressions += 1,
            ChangeStatus::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub title: String,
    pub benchmark1_name: String,
    pub benchmark2_name: String,
    pub generated_at: String,
    pub metric_names: Vec<String>,
    pub levels: Vec<LevelComparison>,
}

impl ComparisonReport {
    #[must_use]
    pub fn status_counts(&self, column: Column) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for level in &self.levels {
            if let Some(metric) = level.metric(column) {
                counts.record(metric.status);
            }
        }
        counts
    }

    #[must_use]
    pub fn solved_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for level in &self.levels {
            counts.record(level.solved.status);
        }
        counts
    }
}

/// Compares `primary` against `baseline`, level by level over `primary`'s levels.
///
/// A level the baseline lacks compares against zeros, so any non-zero
/// primary value reads as a regression there.
#[must_use]
pub fn compare_runs(
    primary: &RunTable,
    baseline: &RunTable,
    primary_name: &str,
    baseline_name: &str,
) -> ComparisonReport {
    let levels = primary
        .records()
        .iter()
        .map(|record| {
            let level = record.level_name.as_str();
            let compare = |column| {
                MetricComparison::lower_is_better(
                    record.number(column),
                    baseline.number(level, column),
                )
            };
            let mut comparison = LevelComparison {
                level_name: level.to_string(),
                baseline_present: baseline.contains(level),
                generated: compare(Column::Generated),
                explored: compare(Column::Explored),
                memory_alloc: compare(Column::MemoryAlloc),
                time: compare(Column::Time),
                actions: compare(Column::Actions),
                solved: SolvedComparison::new(
                    &record.solved,
                    baseline.text(level, Column::Solved.name()),
                ),
            };
            if let Some(status) = comparison.solved.override_status() {
                for metric in comparison.metrics_mut() {
                    metric.force(status);
                }
            }
            comparison
        })
        .collect();

    ComparisonReport {
        title: COMPARISON_TITLE.to_string(),
        benchmark1_name: primary_name.to_string(),
        benchmark2_name: baseline_name.to_string(),
        generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        metric_names: Column::COMPARED
            .iter()
            .map(|column| column.name().to_string())
            .collect(),
        levels,
    }
}
