//! Multi-run summary: per-level winners, per-run totals and overall leaders.
//!
//! Ties are first-class throughout. Fastest time uses a tolerance window,
//! fewest actions uses exact equality, and every "best" statistic lists all
//! runs sharing the best value.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::Config;
use crate::constants::{
    DEFAULT_TIME_TOLERANCE, DEFAULT_TIMEOUT_SECS, NO_WINNER, NOT_SOLVED, SUMMARY_TITLE,
    TIMESTAMP_FORMAT,
};
use crate::record::Column;
use crate::table::RunTable;

/// Knobs for a summary computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Seconds charged for every unsolved or missing level.
    pub timeout_secs: f64,
    /// Solve times within this many seconds of the best count as tied.
    pub time_tolerance: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        #[allow(clippy::cast_precision_loss)]
        let timeout_secs = DEFAULT_TIMEOUT_SECS as f64;
        Self {
            timeout_secs,
            time_tolerance: DEFAULT_TIME_TOLERANCE,
        }
    }
}

impl SummaryOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let timeout_secs = config.timeout as f64;
        Self {
            timeout_secs,
            time_tolerance: config.time_tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkStat {
    pub name: String,
    pub value: String,
    pub extra: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_levels: usize,
    pub timeout: f64,
    pub most_levels_solved: Vec<BenchmarkStat>,
    pub fastest_completion: Vec<BenchmarkStat>,
    pub best_avg_time: Vec<BenchmarkStat>,
    pub least_memory: Vec<BenchmarkStat>,
    pub most_efficient: Vec<BenchmarkStat>,
}

/// Best value on a level together with the first run that achieved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkValue {
    pub benchmark_name: String,
    pub value: f64,
    pub display_value: String,
    pub is_solved: bool,
}

impl BenchmarkValue {
    fn unsolved() -> Self {
        Self {
            benchmark_name: NO_WINNER.to_string(),
            value: 0.0,
            display_value: NOT_SOLVED.to_string(),
            is_solved: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level_name: String,
    pub fastest_time: BenchmarkValue,
    pub fewest_actions: BenchmarkValue,
    pub fastest_time_winners: Vec<String>,
    pub fewest_actions_winners: Vec<String>,
    pub solved_by: Vec<String>,
    pub not_solved_by: Vec<String>,
}

/// Run(s) with the most per-level wins for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricLeader {
    None,
    Single { name: String, wins: usize },
    Tie { names: Vec<String>, wins: usize },
}

impl fmt::Display for MetricLeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(NO_WINNER),
            Self::Single { name, wins } => write!(f, "{name} ({wins} levels)"),
            Self::Tie { names, wins } => {
                write!(f, "{} (tie: {wins} levels each)", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestByMetric {
    pub best_time: MetricLeader,
    pub best_actions: MetricLeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndividualBenchmarkStats {
    pub name: String,
    pub levels_solved: usize,
    pub levels_total: usize,
    pub solve_percentage: f64,
    pub total_time: f64,
    pub avg_time: f64,
    pub total_actions: f64,
    pub avg_actions: f64,
    pub total_memory: f64,
    pub avg_memory: f64,
    pub total_generated: f64,
    pub total_explored: f64,
    pub time_wins: usize,
    pub action_wins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub title: String,
    pub generated_at: String,
    pub benchmarks: Vec<String>,
    pub overall_stats: OverallStats,
    pub level_summary: Vec<LevelSummary>,
    pub best_by_metric: BestByMetric,
    pub individual_stats: Vec<IndividualBenchmarkStats>,
}

/// Builds the full summary for every run in `tables`.
///
/// Runs are visited in name order; the level universe is the sorted union of
/// every run's levels.
#[must_use]
pub fn summarize(tables: &BTreeMap<String, RunTable>, options: &SummaryOptions) -> SummaryReport {
    let names: Vec<String> = tables.keys().cloned().collect();
    let levels = collect_all_levels(tables);
    log::debug!(
        "summarizing {} runs over {} levels",
        names.len(),
        levels.len()
    );

    let totals: Vec<RunTotals> = names
        .iter()
        .map(|name| RunTotals::collect(name, &tables[name], &levels, options.timeout_secs))
        .collect();

    let level_summary = calculate_level_summary(tables, &levels, options.time_tolerance);
    let overall_stats = overall_from_totals(&totals, levels.len(), options.timeout_secs);
    let best_by_metric = determine_best_by_metric(&level_summary, &names);
    let individual_stats = individual_from_totals(&totals, &level_summary, levels.len());

    SummaryReport {
        title: SUMMARY_TITLE.to_string(),
        generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        benchmarks: names,
        overall_stats,
        level_summary,
        best_by_metric,
        individual_stats,
    }
}

/// Sorted union of level names across all runs.
#[must_use]
pub fn collect_all_levels(tables: &BTreeMap<String, RunTable>) -> Vec<String> {
    let levels: BTreeSet<&str> = tables.values().flat_map(RunTable::level_names).collect();
    levels.into_iter().map(str::to_string).collect()
}

/// Per-level solved sets and winners.
#[must_use]
pub fn calculate_level_summary(
    tables: &BTreeMap<String, RunTable>,
    levels: &[String],
    time_tolerance: f64,
) -> Vec<LevelSummary> {
    levels
        .iter()
        .map(|level| {
            let mut solved_by = Vec::new();
            let mut not_solved_by = Vec::new();
            let mut time_winners = TimeWinners::new(time_tolerance);
            let mut action_winners = ActionWinners::default();

            for (name, table) in tables {
                let Some(record) = table.get(level).filter(|r| r.is_solved()) else {
                    not_solved_by.push(name.clone());
                    continue;
                };
                solved_by.push(name.clone());
                time_winners.offer(name, record.number(Column::Time));
                action_winners.offer(name, record.number(Column::Actions));
            }

            solved_by.sort();
            not_solved_by.sort();

            let fastest_time = time_winners.best(|t| format!("{t:.3}s"));
            let fewest_actions = action_winners.best(|a| format!("{a:.0}"));

            LevelSummary {
                level_name: level.clone(),
                fastest_time,
                fewest_actions,
                fastest_time_winners: time_winners.names,
                fewest_actions_winners: action_winners.names,
                solved_by,
                not_solved_by,
            }
        })
        .collect()
}

/// Fastest-time tracking with a tolerance window around the current best.
#[derive(Debug, Clone)]
struct TimeWinners {
    tolerance: f64,
    min: f64,
    names: Vec<String>,
}

impl TimeWinners {
    const fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            min: f64::MAX,
            names: Vec::new(),
        }
    }

    fn offer(&mut self, name: &str, time: f64) {
        if time < self.min - self.tolerance {
            self.min = time;
            self.names = vec![name.to_string()];
        } else if (time - self.min).abs() <= self.tolerance && !self.names.iter().any(|n| n == name)
        {
            self.names.push(name.to_string());
        }
    }

    fn best(&self, display: impl Fn(f64) -> String) -> BenchmarkValue {
        best_value(&self.names, self.min, display)
    }
}

/// Fewest-actions tracking with exact ties.
#[derive(Debug, Clone)]
struct ActionWinners {
    min: f64,
    names: Vec<String>,
}

impl Default for ActionWinners {
    fn default() -> Self {
        Self {
            min: f64::MAX,
            names: Vec::new(),
        }
    }
}

impl ActionWinners {
    fn offer(&mut self, name: &str, actions: f64) {
        if actions < self.min {
            self.min = actions;
            self.names = vec![name.to_string()];
        } else if actions == self.min && !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    fn best(&self, display: impl Fn(f64) -> String) -> BenchmarkValue {
        best_value(&self.names, self.min, display)
    }
}

fn best_value(names: &[String], value: f64, display: impl Fn(f64) -> String) -> BenchmarkValue {
    names
        .first()
        .map_or_else(BenchmarkValue::unsolved, |first| BenchmarkValue {
            benchmark_name: first.clone(),
            value,
            display_value: display(value),
            is_solved: true,
        })
}

/// Everything a run contributes to the overall and individual statistics.
#[derive(Debug, Clone, Default)]
struct RunTotals {
    name: String,
    solved: usize,
    /// Solved times plus the timeout for every unsolved or missing level.
    total_time: f64,
    solved_times: Vec<f64>,
    solved_actions: Vec<f64>,
    /// Finite memory readings of solved levels.
    solved_memory: Vec<f64>,
    total_generated: f64,
    total_explored: f64,
    /// Whether any attempted level reported a finite state count.
    has_state_counts: bool,
}

impl RunTotals {
    fn collect(name: &str, table: &RunTable, levels: &[String], timeout: f64) -> Self {
        let mut totals = Self {
            name: name.to_string(),
            ..Self::default()
        };

        for level in levels {
            let Some(record) = table.get(level) else {
                totals.total_time += timeout;
                continue;
            };

            let generated = record.number(Column::Generated);
            let explored = record.number(Column::Explored);
            if generated.is_finite() {
                totals.total_generated += generated;
                totals.has_state_counts = true;
            }
            if explored.is_finite() {
                totals.total_explored += explored;
                totals.has_state_counts = true;
            }

            if record.is_solved() {
                let time = record.number(Column::Time);
                totals.solved += 1;
                totals.total_time += time;
                totals.solved_times.push(time);
                totals.solved_actions.push(record.number(Column::Actions));
                let memory = record.number(Column::MemoryAlloc);
                if memory.is_finite() {
                    totals.solved_memory.push(memory);
                }
            } else {
                totals.total_time += timeout;
            }
        }

        totals
    }

    fn avg_time(&self) -> f64 {
        mean(&self.solved_times)
    }

    fn total_memory(&self) -> Option<f64> {
        (!self.solved_memory.is_empty()).then(|| self.solved_memory.iter().sum())
    }

    fn total_states(&self) -> Option<f64> {
        self.has_state_counts
            .then_some(self.total_generated + self.total_explored)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let count = values.len() as f64;
        values.iter().sum::<f64>() / count
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = part as f64 / total as f64;
        ratio * 100.0
    }
}

/// Every run whose value equals the best one; runs without a value are skipped.
fn all_at_best<'a>(
    totals: &'a [RunTotals],
    value: impl Fn(&RunTotals) -> Option<f64>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<(f64, Vec<&'a RunTotals>)> {
    let best = totals
        .iter()
        .filter_map(&value)
        .reduce(|best, v| if better(v, best) { v } else { best })?;
    let winners = totals
        .iter()
        .filter(|run| value(run) == Some(best))
        .collect();
    Some((best, winners))
}

fn stats_for(
    winners: Option<(f64, Vec<&RunTotals>)>,
    describe: impl Fn(f64, &RunTotals) -> (String, String),
) -> Vec<BenchmarkStat> {
    winners
        .map(|(best, runs)| {
            runs.into_iter()
                .map(|run| {
                    let (value, extra) = describe(best, run);
                    BenchmarkStat {
                        name: run.name.clone(),
                        value,
                        extra,
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn overall_from_totals(totals: &[RunTotals], total_levels: usize, timeout: f64) -> OverallStats {
    #[allow(clippy::cast_precision_loss)]
    let solved_value = |run: &RunTotals| Some(run.solved as f64);
    let most_levels_solved = stats_for(
        all_at_best(totals, solved_value, |a, b| a > b),
        |_, run| {
            (
                format!("{} levels", run.solved),
                format!("{:.2}% solved", percentage(run.solved, total_levels)),
            )
        },
    );

    let fastest_completion = stats_for(
        all_at_best(
            totals,
            |run| (total_levels > 0).then_some(run.total_time),
            |a, b| a < b,
        ),
        |best, run| (format!("{best:.3}s"), format!("{} solved", run.solved)),
    );

    let best_avg_time = stats_for(
        all_at_best(
            totals,
            |run| Some(run.avg_time()).filter(|avg| *avg > 0.0),
            |a, b| a < b,
        ),
        |best, run| {
            (
                format!("{best:.3}s avg"),
                format!("on {} solved levels", run.solved_times.len()),
            )
        },
    );

    let least_memory = stats_for(
        all_at_best(totals, RunTotals::total_memory, |a, b| a < b),
        |best, _| (format!("{best:.2} MB"), "lowest total memory".to_string()),
    );

    let most_efficient = stats_for(
        all_at_best(totals, RunTotals::total_states, |a, b| a < b),
        |best, _| {
            (
                format!("{best:.0} states"),
                "fewest explored+generated".to_string(),
            )
        },
    );

    OverallStats {
        total_levels,
        timeout,
        most_levels_solved,
        fastest_completion,
        best_avg_time,
        least_memory,
        most_efficient,
    }
}

/// Overall leaders across runs, with every tied run reported.
#[must_use]
pub fn calculate_overall_stats(
    tables: &BTreeMap<String, RunTable>,
    levels: &[String],
    timeout: f64,
) -> OverallStats {
    let totals: Vec<RunTotals> = tables
        .iter()
        .map(|(name, table)| RunTotals::collect(name, table, levels, timeout))
        .collect();
    overall_from_totals(&totals, levels.len(), timeout)
}

fn count_wins(summaries: &[LevelSummary]) -> (BTreeMap<&str, usize>, BTreeMap<&str, usize>) {
    let mut time_wins: BTreeMap<&str, usize> = BTreeMap::new();
    let mut action_wins: BTreeMap<&str, usize> = BTreeMap::new();
    for summary in summaries {
        for winner in &summary.fastest_time_winners {
            *time_wins.entry(winner.as_str()).or_default() += 1;
        }
        for winner in &summary.fewest_actions_winners {
            *action_wins.entry(winner.as_str()).or_default() += 1;
        }
    }
    (time_wins, action_wins)
}

/// Runs with the most per-level wins for time and for actions.
#[must_use]
pub fn determine_best_by_metric(summaries: &[LevelSummary], names: &[String]) -> BestByMetric {
    let (time_wins, action_wins) = count_wins(summaries);
    BestByMetric {
        best_time: find_max_winner(&time_wins, names),
        best_actions: find_max_winner(&action_wins, names),
    }
}

fn find_max_winner(wins: &BTreeMap<&str, usize>, names: &[String]) -> MetricLeader {
    let mut max_wins = 0;
    let mut leaders: Vec<String> = Vec::new();
    for name in names {
        let count = wins.get(name.as_str()).copied().unwrap_or(0);
        if count > max_wins {
            max_wins = count;
            leaders = vec![name.clone()];
        } else if count == max_wins && count > 0 {
            leaders.push(name.clone());
        }
    }

    match leaders.len() {
        0 => MetricLeader::None,
        1 => MetricLeader::Single {
            name: leaders.remove(0),
            wins: max_wins,
        },
        _ => MetricLeader::Tie {
            names: leaders,
            wins: max_wins,
        },
    }
}

fn individual_from_totals(
    totals: &[RunTotals],
    summaries: &[LevelSummary],
    total_levels: usize,
) -> Vec<IndividualBenchmarkStats> {
    let (time_wins, action_wins) = count_wins(summaries);
    totals
        .iter()
        .map(|run| IndividualBenchmarkStats {
            name: run.name.clone(),
            levels_solved: run.solved,
            levels_total: total_levels,
            solve_percentage: percentage(run.solved, total_levels),
            total_time: run.total_time,
            avg_time: run.avg_time(),
            total_actions: run.solved_actions.iter().sum(),
            avg_actions: mean(&run.solved_actions),
            total_memory: run.total_memory().unwrap_or(0.0),
            avg_memory: mean(&run.solved_memory),
            total_generated: run.total_generated,
            total_explored: run.total_explored,
            time_wins: time_wins.get(run.name.as_str()).copied().unwrap_or(0),
            action_wins: action_wins.get(run.name.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

/// Per-run totals, averages and win counts, in run-name order.
#[must_use]
pub fn calculate_individual_stats(
    tables: &BTreeMap<String, RunTable>,
    levels: &[String],
    summaries: &[LevelSummary],
    timeout: f64,
) -> Vec<IndividualBenchmarkStats> {
    let totals: Vec<RunTotals> = tables
        .iter()
        .map(|(name, table)| RunTotals::collect(name, table, levels, timeout))
        .collect();
    individual_from_totals(&totals, summaries, levels.len())
}
