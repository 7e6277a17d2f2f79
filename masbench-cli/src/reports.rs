use anyhow::Result;
use colored::{ColoredString, Colorize};
use masbench_core::{
    BenchmarkStat, ChangeStatus, Column, ComparisonReport, LevelComparison, MetricComparison,
    SummaryReport,
};
use std::io::Write;

fn format_value(column: Column, value: f64) -> String {
    match column {
        Column::Time => format!("{value:.3}"),
        Column::MemoryAlloc | Column::MaxAlloc => format!("{value:.2}"),
        _ => format!("{value:.0}"),
    }
}

fn format_diff(column: Column, metric: &MetricComparison) -> String {
    let sign = if metric.diff > 0.0 { "+" } else { "" };
    format!("{sign}{}", format_value(column, metric.diff))
}

fn paint(status: ChangeStatus) -> ColoredString {
    match status {
        ChangeStatus::Improvement => status.label().green(),
        ChangeStatus::Regression => status.label().red(),
        ChangeStatus::Unchanged => status.label().normal(),
    }
}

const fn status_icon(status: ChangeStatus) -> &'static str {
    match status {
        ChangeStatus::Improvement => "✅",
        ChangeStatus::Regression => "❌",
        ChangeStatus::Unchanged => "➖",
    }
}

fn baseline_text(level: &LevelComparison, column: Column, metric: &MetricComparison) -> String {
    if level.baseline_present {
        format_value(column, metric.value2)
    } else {
        "Missing".to_string()
    }
}

pub fn generate_comparison_console<W: Write>(
    writer: &mut W,
    report: &ComparisonReport,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", format!("📊 {}", report.title).bright_cyan().bold())?;
    writeln!(writer, "{}", "=".repeat(40).cyan())?;
    writeln!(
        writer,
        "{} vs {} (generated {})",
        report.benchmark1_name.bold(),
        report.benchmark2_name.bold(),
        report.generated_at
    )?;
    writeln!(writer)?;

    for level in &report.levels {
        writeln!(writer, "{}", level.level_name.bold())?;
        writeln!(
            writer,
            "   Solved: {} -> {} ({})",
            level.solved.solved2,
            level.solved.solved1,
            paint(level.solved.status)
        )?;
        for (column, metric) in level.metrics() {
            writeln!(
                writer,
                "   {:<12} {:>12} {:>12} {:>12} {:>9.2}%  {}",
                column.name(),
                format_value(column, metric.value1),
                baseline_text(level, column, metric),
                format_diff(column, metric),
                metric.diff_pct,
                paint(metric.status)
            )?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "⚡ Totals".bright_yellow().bold())?;
    writeln!(writer, "{}", "=".repeat(20).yellow())?;
    for column in Column::COMPARED {
        let counts = report.status_counts(column);
        writeln!(
            writer,
            "{:<12} improved: {}  regressed: {}  unchanged: {}",
            column.name(),
            counts.improvements.to_string().green(),
            counts.regressions.to_string().red(),
            counts.unchanged
        )?;
    }
    let solved = report.solved_counts();
    writeln!(
        writer,
        "{:<12} improved: {}  regressed: {}  unchanged: {}",
        Column::Solved.name(),
        solved.improvements.to_string().green(),
        solved.regressions.to_string().red(),
        solved.unchanged
    )?;
    Ok(())
}

pub fn generate_comparison_markdown<W: Write>(
    writer: &mut W,
    report: &ComparisonReport,
) -> Result<()> {
    writeln!(writer, "# {}\n", report.title)?;
    writeln!(
        writer,
        "- **Primary**: {}\n- **Baseline**: {}\n- **Generated**: {}\n",
        report.benchmark1_name, report.benchmark2_name, report.generated_at
    )?;

    writeln!(writer, "## Levels\n")?;
    writeln!(
        writer,
        "| Level | Metric | {} | {} | Diff | Diff % | Status |",
        report.benchmark1_name, report.benchmark2_name
    )?;
    writeln!(writer, "|---|---|---:|---:|---:|---:|---|")?;
    for level in &report.levels {
        writeln!(
            writer,
            "| {} | Solved | {} | {} | | | {} {} |",
            level.level_name,
            level.solved.solved1,
            level.solved.solved2,
            status_icon(level.solved.status),
            level.solved.status
        )?;
        for (column, metric) in level.metrics() {
            writeln!(
                writer,
                "| {} | {} | {} | {} | {} | {:.2}% | {} {} |",
                level.level_name,
                column.name(),
                format_value(column, metric.value1),
                baseline_text(level, column, metric),
                format_diff(column, metric),
                metric.diff_pct,
                status_icon(metric.status),
                metric.status
            )?;
        }
    }

    writeln!(writer, "\n## Totals\n")?;
    writeln!(writer, "| Metric | Improved | Regressed | Unchanged |")?;
    writeln!(writer, "|---|---:|---:|---:|")?;
    for column in Column::COMPARED {
        let counts = report.status_counts(column);
        writeln!(
            writer,
            "| {} | {} | {} | {} |",
            column.name(),
            counts.improvements,
            counts.regressions,
            counts.unchanged
        )?;
    }
    Ok(())
}

pub fn generate_comparison_json<W: Write>(writer: &mut W, report: &ComparisonReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

/// One row per level and metric, Solved included.
pub fn generate_comparison_csv<W: Write>(writer: &mut W, report: &ComparisonReport) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "LevelName",
        "Metric",
        report.benchmark1_name.as_str(),
        report.benchmark2_name.as_str(),
        "Diff",
        "DiffPct",
        "Status",
        "BaselinePresent",
    ])?;
    for level in &report.levels {
        let present = level.baseline_present.to_string();
        csv_writer.write_record([
            level.level_name.as_str(),
            Column::Solved.name(),
            level.solved.solved1.as_str(),
            level.solved.solved2.as_str(),
            "",
            "",
            level.solved.status.label(),
            present.as_str(),
        ])?;
        for (column, metric) in level.metrics() {
            csv_writer.write_record([
                level.level_name.clone(),
                column.name().to_string(),
                metric.value1.to_string(),
                metric.value2.to_string(),
                metric.diff.to_string(),
                format!("{:.2}", metric.diff_pct),
                metric.status.label().to_string(),
                present.clone(),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

fn stat_line(stats: &[BenchmarkStat]) -> String {
    if stats.is_empty() {
        return "None".to_string();
    }
    stats
        .iter()
        .map(|stat| format!("{} ({}, {})", stat.name, stat.value, stat.extra))
        .collect::<Vec<_>>()
        .join("; ")
}

fn overall_rows(report: &SummaryReport) -> [(&'static str, String); 5] {
    let overall = &report.overall_stats;
    [
        ("Most levels solved", stat_line(&overall.most_levels_solved)),
        ("Fastest completion", stat_line(&overall.fastest_completion)),
        ("Best average time", stat_line(&overall.best_avg_time)),
        ("Least memory", stat_line(&overall.least_memory)),
        ("Most efficient", stat_line(&overall.most_efficient)),
    ]
}

fn winners_text(winners: &[String], display: &str) -> String {
    if winners.is_empty() {
        display.to_string()
    } else {
        format!("{display} ({})", winners.join(", "))
    }
}

pub fn generate_summary_console<W: Write>(writer: &mut W, report: &SummaryReport) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", format!("📊 {}", report.title).bright_cyan().bold())?;
    writeln!(writer, "{}", "=".repeat(40).cyan())?;
    writeln!(writer, "Benchmarks: {}", report.benchmarks.join(", "))?;
    writeln!(
        writer,
        "Levels: {}  Timeout: {}s  Generated: {}",
        report.overall_stats.total_levels, report.overall_stats.timeout, report.generated_at
    )?;
    writeln!(writer)?;

    writeln!(writer, "{}", "🏆 Overall".bright_yellow().bold())?;
    for (label, line) in overall_rows(report) {
        writeln!(writer, "{label:<20} {line}")?;
    }
    writeln!(writer, "{:<20} {}", "Best time", report.best_by_metric.best_time)?;
    writeln!(
        writer,
        "{:<20} {}",
        "Best actions", report.best_by_metric.best_actions
    )?;
    writeln!(writer)?;

    writeln!(writer, "{}", "🧩 Levels".bright_blue().bold())?;
    for level in &report.level_summary {
        let time = winners_text(&level.fastest_time_winners, &level.fastest_time.display_value);
        let actions = winners_text(
            &level.fewest_actions_winners,
            &level.fewest_actions.display_value,
        );
        let time = if level.fastest_time.is_solved {
            time.green()
        } else {
            time.red()
        };
        writeln!(
            writer,
            "{:<20} time: {}  actions: {}  solved by {}/{}",
            level.level_name,
            time,
            actions,
            level.solved_by.len(),
            level.solved_by.len() + level.not_solved_by.len()
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "{}", "📈 Per benchmark".bright_magenta().bold())?;
    for stats in &report.individual_stats {
        writeln!(writer, "{}", stats.name.bold())?;
        writeln!(
            writer,
            "   Solved: {}/{} ({:.1}%)",
            stats.levels_solved, stats.levels_total, stats.solve_percentage
        )?;
        writeln!(
            writer,
            "   Time: {:.3}s total, {:.3}s avg",
            stats.total_time, stats.avg_time
        )?;
        writeln!(
            writer,
            "   Actions: {:.0} total, {:.1} avg",
            stats.total_actions, stats.avg_actions
        )?;
        writeln!(
            writer,
            "   Memory: {:.2} MB total, {:.2} MB avg",
            stats.total_memory, stats.avg_memory
        )?;
        writeln!(
            writer,
            "   States: {:.0} generated, {:.0} explored",
            stats.total_generated, stats.total_explored
        )?;
        writeln!(
            writer,
            "   Wins: {} time, {} actions",
            stats.time_wins, stats.action_wins
        )?;
    }
    Ok(())
}

pub fn generate_summary_markdown<W: Write>(writer: &mut W, report: &SummaryReport) -> Result<()> {
    writeln!(writer, "# {}\n", report.title)?;
    writeln!(writer, "- **Benchmarks**: {}", report.benchmarks.join(", "))?;
    writeln!(writer, "- **Levels**: {}", report.overall_stats.total_levels)?;
    writeln!(writer, "- **Timeout**: {}s", report.overall_stats.timeout)?;
    writeln!(writer, "- **Generated**: {}\n", report.generated_at)?;

    writeln!(writer, "## Overall\n")?;
    for (label, line) in overall_rows(report) {
        writeln!(writer, "- **{label}**: {line}")?;
    }
    writeln!(writer, "- **Best time**: {}", report.best_by_metric.best_time)?;
    writeln!(
        writer,
        "- **Best actions**: {}\n",
        report.best_by_metric.best_actions
    )?;

    writeln!(writer, "## Levels\n")?;
    writeln!(
        writer,
        "| Level | Fastest time | Fewest actions | Solved by | Not solved by |"
    )?;
    writeln!(writer, "|---|---|---|---|---|")?;
    for level in &report.level_summary {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} |",
            level.level_name,
            winners_text(&level.fastest_time_winners, &level.fastest_time.display_value),
            winners_text(
                &level.fewest_actions_winners,
                &level.fewest_actions.display_value
            ),
            level.solved_by.join(", "),
            level.not_solved_by.join(", ")
        )?;
    }

    writeln!(writer, "\n## Per benchmark\n")?;
    writeln!(
        writer,
        "| Benchmark | Solved | Total time (s) | Avg time (s) | Avg actions | Avg memory (MB) | Time wins | Action wins |"
    )?;
    writeln!(writer, "|---|---:|---:|---:|---:|---:|---:|---:|")?;
    for stats in &report.individual_stats {
        writeln!(
            writer,
            "| {} | {}/{} ({:.1}%) | {:.3} | {:.3} | {:.1} | {:.2} | {} | {} |",
            stats.name,
            stats.levels_solved,
            stats.levels_total,
            stats.solve_percentage,
            stats.total_time,
            stats.avg_time,
            stats.avg_actions,
            stats.avg_memory,
            stats.time_wins,
            stats.action_wins
        )?;
    }
    Ok(())
}

pub fn generate_summary_json<W: Write>(writer: &mut W, report: &SummaryReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}
