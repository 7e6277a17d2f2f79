//! masbench core
//!
//! Turns server/client benchmark logs into per-level results tables, compares
//! two runs level by level and summarizes any number of runs. No terminal
//! output or process handling lives here; the CLI crate owns those.

pub mod compare;
pub mod config;
pub mod constants;
pub mod error;
pub mod parser;
pub mod record;
pub mod summary;
pub mod table;

// Re-export commonly used types
pub use compare::{
    ChangeStatus, ComparisonReport, LevelComparison, MetricComparison, SolvedComparison,
    StatusCounts, compare_runs,
};
pub use config::Config;
pub use error::{ConfigError, ParseError, TableError};
pub use parser::{LogParser, parse_log_to_csv};
pub use record::{Column, MetricRecord, Solved, level_name_from_path, parse_number};
pub use summary::{
    BenchmarkStat, BenchmarkValue, BestByMetric, IndividualBenchmarkStats, LevelSummary,
    MetricLeader, OverallStats, SummaryOptions, SummaryReport, calculate_individual_stats,
    calculate_level_summary, calculate_overall_stats, collect_all_levels,
    determine_best_by_metric, summarize,
};
pub use table::{ReadTableError, RunTable};
