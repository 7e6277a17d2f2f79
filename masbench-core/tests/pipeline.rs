use masbench_core::{
    ChangeStatus, Column, LogParser, RunTable, SummaryOptions, compare_runs, parse_log_to_csv,
    summarize,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

const RUN_A_LOG: &str = "\
[server][info] Starting server
[server][info] Running client on level file: levels/SAD1.lvl
[client][message] Explored: 1,000
[client][message] Generated: 2,000
[client][message] Alloc: 10.00 MB, MaxAlloc: 20.00 MB
[server][info] Level solved: Yes.
[server][info] Actions used: 30.
[server][info] Time to solve: 2.500 seconds.
[server][info] Running client on level file: levels/SAD2.lvl
[client][message] Explored: 50,000
[client][message] Generated: 90,000
[client][message] Alloc: 300.00 MB, MaxAlloc: 512.00 MB
[server][info] Level solved: No.
";

const RUN_B_LOG: &str = "\
[server][info] Running client on level file: levels/SAD1.lvl
[client][message] Explored: 900
[client][message] Generated: 1,800
[client][message] Alloc: 9.00 MB, MaxAlloc: 18.00 MB
[server][info] Level solved: Yes.
[server][info] Actions used: 28.
[server][info] Time to solve: 3.000 seconds.
[server][info] Running client on level file: levels/SAD2.lvl
[client][message] Explored: 40,000
[client][message] Generated: 70,000
[client][message] Alloc: 250.00 MB, MaxAlloc: 400.00 MB
[server][info] Level solved: Yes.
[server][info] Actions used: 112.
[server][info] Time to solve: 41.250 seconds.
";

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "masbench-core-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

/// Writes `log` to disk, parses it to CSV and loads the CSV back.
fn parse_and_load(label: &str, log: &str) -> RunTable {
    let dir = temp_path(label);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let log_path = dir.join("client.clog");
    let csv_path = dir.join("results.csv");
    std::fs::write(&log_path, log).expect("write log");
    let written = parse_log_to_csv(&log_path, &csv_path).expect("parse log");
    assert_eq!(written, 2);
    let table = RunTable::load(&csv_path).expect("load csv");
    std::fs::remove_dir_all(&dir).ok();
    table
}

fn csv_digest(log: &str) -> [u8; 32] {
    let table = LogParser::new().expect("patterns").parse_lines(log.lines());
    let mut buffer = Vec::new();
    table.write_csv(&mut buffer).expect("csv serialization");
    let mut hasher = Sha256::new();
    hasher.update(buffer);
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 32];
    bytes.copy_from_slice(&digest);
    bytes
}

#[test]
fn reparsing_a_log_is_byte_identical() {
    assert_eq!(csv_digest(RUN_A_LOG), csv_digest(RUN_A_LOG));
    assert_ne!(csv_digest(RUN_A_LOG), csv_digest(RUN_B_LOG));
}

#[test]
fn level_order_follows_first_occurrence() {
    let log = "\
[server][info] Running client on level file: z/ZETA.lvl
[server][info] Running client on level file: a/ALPHA.lvl
[server][info] Running client on level file: z/ZETA.lvl
[server][info] Actions used: 1,234
[server][info] Running client on level file: m/MID.lvl
";
    let table = LogParser::new().expect("patterns").parse_lines(log.lines());
    assert_eq!(
        table.level_names().collect::<Vec<_>>(),
        ["ZETA", "ALPHA", "MID"]
    );
    assert_eq!(table.text("ZETA", "Actions"), "1234");
}

#[test]
fn newer_run_against_older_baseline() {
    let run_a = parse_and_load("a", RUN_A_LOG);
    let run_b = parse_and_load("b", RUN_B_LOG);
    let report = compare_runs(&run_b, &run_a, "run_b", "run_a");

    assert_eq!(report.levels.len(), 2);
    let sad1 = &report.levels[0];
    assert_eq!(sad1.level_name, "SAD1");
    assert_eq!(sad1.time.status, ChangeStatus::Regression);
    assert!((sad1.time.diff - 0.5).abs() < 1e-9);
    assert!((sad1.time.diff_pct - 20.0).abs() < 1e-9);
    assert_eq!(sad1.actions.status, ChangeStatus::Improvement);
    assert!((sad1.actions.diff + 2.0).abs() < 1e-9);
    assert_eq!(sad1.solved.status, ChangeStatus::Unchanged);

    let sad2 = &report.levels[1];
    assert_eq!(sad2.solved.status, ChangeStatus::Improvement);
    assert!(
        sad2.metrics()
            .iter()
            .all(|(_, metric)| metric.status == ChangeStatus::Improvement)
    );
}

#[test]
fn losing_a_solve_forces_every_metric_to_regress() {
    let run_a = parse_and_load("a2", RUN_A_LOG);
    let run_b = parse_and_load("b2", RUN_B_LOG);
    let report = compare_runs(&run_a, &run_b, "run_a", "run_b");

    let sad2 = &report.levels[1];
    assert_eq!(sad2.level_name, "SAD2");
    assert!(sad2.solved.changed);
    assert_eq!(sad2.solved.status, ChangeStatus::Regression);
    // Fewer actions and zero time would otherwise read as improvements.
    assert!(sad2.actions.diff < 0.0);
    for (column, metric) in sad2.metrics() {
        assert_eq!(metric.status, ChangeStatus::Regression, "{column}");
        assert!(!metric.is_improvement);
    }
    let time = report.status_counts(Column::Time);
    assert_eq!((time.improvements, time.regressions), (1, 1));
}

#[test]
fn summary_over_parsed_runs() {
    let mut tables = BTreeMap::new();
    tables.insert("run_a".to_string(), parse_and_load("sa", RUN_A_LOG));
    tables.insert("run_b".to_string(), parse_and_load("sb", RUN_B_LOG));
    let options = SummaryOptions {
        timeout_secs: 180.0,
        time_tolerance: 0.1,
    };
    let report = summarize(&tables, &options);

    assert_eq!(report.benchmarks, ["run_a", "run_b"]);
    assert_eq!(report.overall_stats.total_levels, 2);
    let sad1 = &report.level_summary[0];
    assert_eq!(sad1.fastest_time_winners, ["run_a"]);
    assert_eq!(sad1.fewest_actions_winners, ["run_b"]);
    let sad2 = &report.level_summary[1];
    assert_eq!(sad2.solved_by, ["run_b"]);
    assert_eq!(sad2.not_solved_by, ["run_a"]);

    let run_a = &report.individual_stats[0];
    assert!((run_a.total_time - 182.5).abs() < 1e-9);
    assert!((run_a.total_generated - 92_000.0).abs() < 1e-9);
    assert_eq!(report.overall_stats.most_levels_solved[0].name, "run_b");
    assert_eq!(
        report.best_by_metric.best_actions.to_string(),
        "run_b (2 levels)"
    );
}
