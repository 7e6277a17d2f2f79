mod benchmarks;
mod reports;
mod runner;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use masbench_core::constants::DEFAULT_CONFIG_FILE;
use masbench_core::{
    ComparisonReport, Config, SummaryOptions, SummaryReport, compare_runs, summarize,
};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use benchmarks::BenchmarkFolder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored text for the terminal
    Console,
    Markdown,
    Json,
    /// Flat per-level rows (comparisons only)
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "masbench", version)]
#[command(about = "Run, compare and summarize multi-agent search client benchmarks")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Run the server against the configured levels and record the results
    Run {
        name: String,
        /// Note stored with the run
        #[arg(short, long, default_value = "")]
        message: String,
        /// Algorithm passed to the client through AlgorithmFlagFormat
        #[arg(short, long)]
        algorithm: Option<String>,
    },
    /// Re-parse existing client logs into results files
    Refresh {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,
        /// Refresh every benchmark
        #[arg(long)]
        all: bool,
    },
    /// List recorded benchmarks
    List {
        /// Print names only
        #[arg(long)]
        name_only: bool,
    },
    /// Remove a benchmark and every comparison involving it
    Rm { name: String },
    /// Compare a benchmark against a baseline, level by level
    Compare {
        primary: String,
        baseline: String,
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,
        /// Write the printed report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarize one or more benchmarks
    Summary {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,
        /// Write the printed report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the version
    Version,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => init_config(&cli.config, force),
        Commands::Version => {
            println!("masbench {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let config = Config::load(&cli.config).with_context(|| {
                format!(
                    "could not load {}; run `masbench init` first",
                    cli.config.display()
                )
            })?;
            dispatch(command, &config)
        }
    }
}

fn dispatch(command: Commands, config: &Config) -> Result<()> {
    let folder = BenchmarkFolder::new(&config.benchmark_folder);
    match command {
        Commands::Run {
            name,
            message,
            algorithm,
        } => run(config, &folder, &name, &message, algorithm.as_deref()),
        Commands::Refresh { name, all } => refresh(&folder, name.as_deref(), all),
        Commands::List { name_only } => list(&folder, name_only),
        Commands::Rm { name } => remove(&folder, &name),
        Commands::Compare {
            primary,
            baseline,
            format,
            output,
        } => compare(&folder, &primary, &baseline, format, output),
        Commands::Summary {
            names,
            format,
            output,
        } => summary(config, &folder, &names, format, output),
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}

fn announce_banner() {
    println!("{}", "🧪 masbench".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    Config::default().save(path)?;
    println!(
        "{} {}. Please edit it before running benchmarks.",
        "✅ Created default config file at".green(),
        path.display()
    );
    Ok(())
}

fn run(
    config: &Config,
    folder: &BenchmarkFolder,
    name: &str,
    message: &str,
    algorithm: Option<&str>,
) -> Result<()> {
    announce_banner();
    println!("Running benchmark: {}", name.bold());
    let outcome = runner::run_benchmark(config, folder, name, message, algorithm)?;
    println!("{}", "✅ Benchmark run completed successfully.".green());
    println!(
        "Results for {} levels written to {}",
        outcome.levels,
        outcome.results_csv.display()
    );
    Ok(())
}

fn refresh(folder: &BenchmarkFolder, name: Option<&str>, all: bool) -> Result<()> {
    let names: Vec<String> = match name {
        Some(name) if !all => vec![name.to_string()],
        _ => folder.list_runs()?.into_iter().map(|run| run.name).collect(),
    };

    let mut failed = 0;
    for name in &names {
        match runner::refresh_run(folder, name) {
            Ok(outcome) => println!(
                "✅ {}: {} levels -> {}",
                name.green(),
                outcome.levels,
                outcome.results_csv.display()
            ),
            Err(err) => {
                eprintln!("❌ {}: {err:#}", name.red());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} benchmarks could not be refreshed", names.len());
    }
    Ok(())
}

fn list(folder: &BenchmarkFolder, name_only: bool) -> Result<()> {
    let runs = folder.list_runs()?;
    if runs.is_empty() {
        println!("No benchmarks found in {}", folder.root().display());
        return Ok(());
    }
    let mut out = stdout().lock();
    for run in runs {
        match (&run.description, name_only) {
            (Some(description), false) => writeln!(out, "{}: {description}", run.name)?,
            _ => writeln!(out, "{}", run.name)?,
        }
    }
    Ok(())
}

fn remove(folder: &BenchmarkFolder, name: &str) -> Result<()> {
    let removed = folder.remove_run(name)?;
    println!("🗑️  Removed benchmark {}", name.bold());
    for path in removed {
        println!("   and comparison {}", path.display());
    }
    Ok(())
}

fn compare(
    folder: &BenchmarkFolder,
    primary: &str,
    baseline: &str,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let primary_table = folder.load_table(primary)?;
    let baseline_table = folder.load_table(baseline)?;
    let report = compare_runs(&primary_table, &baseline_table, primary, baseline);

    let dir = folder.comparison_dir(primary, baseline);
    let stem = format!("{primary}vs{baseline}");
    persist(&dir, &stem, |kind, writer| match kind {
        Persisted::Markdown => reports::generate_comparison_markdown(writer, &report),
        Persisted::Json => reports::generate_comparison_json(writer, &report),
    })?;

    let mut output_target = OutputTarget::new(output)?;
    write_comparison(&mut output_target, &report, format)?;
    output_target.flush_inner()?;
    Ok(())
}

fn write_comparison<W: Write>(
    writer: &mut W,
    report: &ComparisonReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Console => reports::generate_comparison_console(writer, report),
        ReportFormat::Markdown => reports::generate_comparison_markdown(writer, report),
        ReportFormat::Json => reports::generate_comparison_json(writer, report),
        ReportFormat::Csv => reports::generate_comparison_csv(writer, report),
    }
}

fn summary(
    config: &Config,
    folder: &BenchmarkFolder,
    names: &[String],
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut tables = BTreeMap::new();
    for name in names {
        tables.insert(name.clone(), folder.load_table(name)?);
    }
    let report = summarize(&tables, &SummaryOptions::from_config(config));

    persist(
        &folder.summaries_dir(),
        &BenchmarkFolder::summary_stem(names),
        |kind, writer| match kind {
            Persisted::Markdown => reports::generate_summary_markdown(writer, &report),
            Persisted::Json => reports::generate_summary_json(writer, &report),
        },
    )?;

    let mut output_target = OutputTarget::new(output)?;
    write_summary(&mut output_target, &report, format)?;
    output_target.flush_inner()?;
    Ok(())
}

fn write_summary<W: Write>(
    writer: &mut W,
    report: &SummaryReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Console => reports::generate_summary_console(writer, report),
        ReportFormat::Markdown => reports::generate_summary_markdown(writer, report),
        ReportFormat::Json => reports::generate_summary_json(writer, report),
        ReportFormat::Csv => bail!("csv output is only available for comparisons"),
    }
}

/// Report files kept next to the benchmarks.
#[derive(Debug, Clone, Copy)]
enum Persisted {
    Markdown,
    Json,
}

impl Persisted {
    const ALL: [Self; 2] = [Self::Markdown, Self::Json];

    const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

fn persist(
    dir: &Path,
    stem: &str,
    render: impl Fn(Persisted, &mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for kind in Persisted::ALL {
        let path = dir.join(format!("{stem}.{}", kind.extension()));
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        render(kind, &mut writer)?;
        writer.flush()?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
