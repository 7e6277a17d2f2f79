use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const RESULTS_HEADER: &str = "LevelName,Solved,Actions,Time,Generated,Explored,MemoryAlloc,MaxAlloc";

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "masbench-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn masbench(args: &[&str], config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_masbench"))
        .args(args)
        .arg("--config")
        .arg(config)
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli")
}

/// Workspace with a config file and two recorded runs.
fn workspace(label: &str) -> (PathBuf, PathBuf) {
    let root = temp_path(label);
    let benchmarks = root.join("benchmarks");
    let config = root.join("masbench_config.yml");
    fs::create_dir_all(&root).expect("create root");
    fs::write(
        &config,
        format!(
            "ServerPath: server.jar\nLevelsDir: levels\nBenchmarkFolder: {}\nClientCommand: java client\nTimeout: 100\n",
            benchmarks.display()
        ),
    )
    .expect("write config");

    write_run(
        &benchmarks,
        "astar",
        "heuristic search",
        &["SAD1,Yes,28,3.0,100,80,10.0,12.0", "SAD2,Yes,40,4.0,500,400,20.0,25.0"],
    );
    write_run(
        &benchmarks,
        "bfs",
        "",
        &["SAD1,Yes,30,2.5,120,90,11.0,13.0", "SAD2,No,,,9000,8000,,"],
    );
    (root, config)
}

fn write_run(benchmarks: &Path, name: &str, description: &str, rows: &[&str]) {
    let dir = benchmarks.join(name);
    fs::create_dir_all(dir.join("logs")).expect("create run dir");
    let mut csv = format!("{RESULTS_HEADER}\n");
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    fs::write(dir.join(format!("{name}_results.csv")), csv).expect("write results");
    fs::write(dir.join(format!("{name}.md")), format!("{description}\n")).expect("write md");
}

#[test]
fn version_prints_package_version() {
    let output = masbench(&["version"], Path::new("unused.yml"));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn init_writes_config_and_refuses_to_overwrite() {
    let root = temp_path("init");
    fs::create_dir_all(&root).expect("create root");
    let config = root.join("masbench_config.yml");

    assert!(masbench(&["init"], &config).status.success());
    let text = fs::read_to_string(&config).expect("read config");
    assert!(text.contains("BenchmarkFolder: benchmarks"));
    assert!(text.contains("Timeout: 180"));

    let again = masbench(&["init"], &config);
    assert!(!again.status.success());
    assert!(masbench(&["init", "--force"], &config).status.success());
    fs::remove_dir_all(root).ok();
}

#[test]
fn compare_prints_csv_and_persists_reports() {
    let (root, config) = workspace("compare");
    let output = masbench(&["compare", "astar", "bfs", "--format", "csv"], &config);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SAD1,Time,3,2.5,0.5,20.00,regression,true"));
    assert!(stdout.contains("SAD2,Solved,Yes,No,,,improvement,true"));

    let dir = root.join("benchmarks/comparisons/astarvsbfs");
    let markdown = fs::read_to_string(dir.join("astarvsbfs.md")).expect("markdown report");
    assert!(markdown.starts_with("# Benchmark Comparison Report"));
    let json = fs::read_to_string(dir.join("astarvsbfs.json")).expect("json report");
    assert!(json.contains("\"benchmark1_name\": \"astar\""));
    fs::remove_dir_all(root).ok();
}

#[test]
fn summary_writes_multi_benchmark_report() {
    let (root, config) = workspace("summary");
    let report_path = root.join("summary.md");
    let output = masbench(
        &[
            "summary",
            "bfs",
            "astar",
            "--format",
            "markdown",
            "--output",
            report_path.to_str().expect("utf8 path"),
        ],
        &config,
    );
    assert!(output.status.success(), "{output:?}");
    let printed = fs::read_to_string(&report_path).expect("read summary");
    assert!(printed.contains("- **Benchmarks**: astar, bfs"));
    assert!(printed.contains("- **Most levels solved**: astar (2 levels, 100.00% solved)"));
    assert!(printed.contains("- **Best actions**: astar (2 levels)"));

    let summaries = root.join("benchmarks/summaries");
    assert!(summaries.join("multi_benchmark_summary.md").is_file());
    assert!(summaries.join("multi_benchmark_summary.json").is_file());
    fs::remove_dir_all(root).ok();
}

#[test]
fn list_and_rm_manage_runs() {
    let (root, config) = workspace("list");
    assert!(masbench(&["compare", "bfs", "astar", "--format", "json"], &config)
        .status
        .success());

    let output = masbench(&["list"], &config);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["astar: heuristic search", "bfs"]);

    assert!(masbench(&["rm", "bfs"], &config).status.success());
    let output = masbench(&["list", "--name-only"], &config);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "astar");
    assert!(!root.join("benchmarks/comparisons/bfsvsastar").exists());
    fs::remove_dir_all(root).ok();
}

#[test]
fn compare_fails_for_unknown_benchmark() {
    let (root, config) = workspace("missing");
    let output = masbench(&["compare", "astar", "ghost"], &config);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ghost"));
    fs::remove_dir_all(root).ok();
}

#[test]
fn missing_config_is_reported() {
    let root = temp_path("noconfig");
    let output = masbench(&["list"], &root.join("absent.yml"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("masbench init"));
}
