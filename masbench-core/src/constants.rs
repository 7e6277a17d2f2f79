//! Shared column names, literals and defaults.

pub const COL_LEVEL_NAME: &str = "LevelName";
pub const COL_SOLVED: &str = "Solved";
pub const COL_ACTIONS: &str = "Actions";
pub const COL_TIME: &str = "Time";
pub const COL_GENERATED: &str = "Generated";
pub const COL_EXPLORED: &str = "Explored";
pub const COL_MEMORY_ALLOC: &str = "MemoryAlloc";
pub const COL_MAX_ALLOC: &str = "MaxAlloc";

pub const SOLVED_YES: &str = "Yes";
pub const SOLVED_NO: &str = "No";

/// Seconds within which two solve times count as the same result.
pub const DEFAULT_TIME_TOLERANCE: f64 = 0.1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_ALGORITHM_FLAG_FORMAT: &str = "-%s";
pub const DEFAULT_BENCHMARK_FOLDER: &str = "benchmarks";
pub const DEFAULT_CONFIG_FILE: &str = "masbench_config.yml";

pub const COMPARISON_TITLE: &str = "Benchmark Comparison Report";
pub const SUMMARY_TITLE: &str = "Benchmark Summary Report";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder shown for levels nobody solved.
pub const NOT_SOLVED: &str = "Not solved";
pub const NO_WINNER: &str = "None";
