//! Launching the competition server and capturing its output.

use anyhow::{Context, Result, bail};
use masbench_core::{Config, parse_log_to_csv};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::thread;

use crate::benchmarks::BenchmarkFolder;

const JAVA: &str = "java";

/// Process invocation for one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ServerCommand {
    /// `java -jar <server> -l <levels> -o <server log> -c <client> -t <timeout>`.
    pub fn new(config: &Config, folder: &BenchmarkFolder, name: &str, client: &str) -> Self {
        let args = vec![
            OsString::from("-jar"),
            config.server_path.clone().into_os_string(),
            OsString::from("-l"),
            config.levels_dir.clone().into_os_string(),
            OsString::from("-o"),
            folder.server_log(name).into_os_string(),
            OsString::from("-c"),
            OsString::from(client),
            OsString::from("-t"),
            OsString::from(config.timeout.to_string()),
        ];
        Self {
            program: OsString::from(JAVA),
            args,
        }
    }

    /// Runs to completion, copying stdout and stderr to the console and to `log`.
    pub fn run_teed(&self, log: File) -> Result<ExitStatus> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start {}", self.program.to_string_lossy()))?;

        let log = Mutex::new(log);
        let log = &log;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        thread::scope(|scope| -> Result<()> {
            let out = stdout.map(|pipe| scope.spawn(move || tee(pipe, io::stdout(), log)));
            let err = stderr.map(|pipe| scope.spawn(move || tee(pipe, io::stderr(), log)));
            for handle in [out, err].into_iter().flatten() {
                match handle.join() {
                    Ok(result) => result.context("failed to capture server output")?,
                    Err(_) => bail!("output capture thread panicked"),
                }
            }
            Ok(())
        })?;

        let status = child.wait().context("failed to wait for the server")?;
        Ok(status)
    }
}

/// Copies `source` into both `echo` and the shared log until EOF.
fn tee<R: Read, W: Write>(mut source: R, mut echo: W, log: &Mutex<File>) -> io::Result<()> {
    let mut buffer = [0_u8; 8192];
    loop {
        let read = source.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        echo.write_all(chunk)?;
        echo.flush()?;
        let mut file = log
            .lock()
            .map_err(|_| io::Error::other("client log lock poisoned"))?;
        file.write_all(chunk)?;
    }
    Ok(())
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results_csv: PathBuf,
    pub levels: usize,
}

/// Executes a named benchmark run end to end.
///
/// The run directory is removed again if the server cannot be started or
/// exits with a failure status.
pub fn run_benchmark(
    config: &Config,
    folder: &BenchmarkFolder,
    name: &str,
    message: &str,
    algorithm: Option<&str>,
) -> Result<RunOutcome> {
    let client = config.client_command_for(algorithm)?;

    if folder.exists(name) {
        bail!("benchmark with name '{name}' already exists; remove it before running a new one");
    }
    let logs_dir = folder.logs_dir(name);
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;

    let client_log = folder.client_log(name);
    let log_file = File::create(&client_log)
        .with_context(|| format!("failed to create {}", client_log.display()))?;

    let command = ServerCommand::new(config, folder, name, &client);
    log::info!("starting server for {name} with client command: {client}");

    let status = command.run_teed(log_file);
    let failure = match status {
        Ok(status) if status.success() => None,
        Ok(status) => Some(anyhow::anyhow!("server exited with {status}")),
        Err(err) => Some(err),
    };
    if let Some(err) = failure {
        if let Err(cleanup) = fs::remove_dir_all(folder.run_dir(name)) {
            log::warn!("could not remove {}: {cleanup}", folder.run_dir(name).display());
        }
        return Err(err.context(format!("benchmark {name} failed")));
    }

    let results_csv = folder.results_csv(name);
    let levels = parse_log_to_csv(&client_log, &results_csv)?;

    let description = folder.description_file(name);
    fs::write(&description, format!("{message}\n"))
        .with_context(|| format!("failed to write {}", description.display()))?;

    Ok(RunOutcome {
        results_csv,
        levels,
    })
}

/// Re-parses an existing run's client log into its results file.
pub fn refresh_run(folder: &BenchmarkFolder, name: &str) -> Result<RunOutcome> {
    if !folder.exists(name) {
        bail!("benchmark '{name}' does not exist");
    }
    let client_log = folder.client_log(name);
    if !client_log.is_file() {
        bail!("client log file not found: {}", client_log.display());
    }
    let results_csv = folder.results_csv(name);
    let levels = parse_log_to_csv(&client_log, &results_csv)?;
    Ok(RunOutcome {
        results_csv,
        levels,
    })
}
