//! On-disk layout of the benchmark folder.

use anyhow::{Context, Result, bail};
use masbench_core::RunTable;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPARISONS_DIR: &str = "comparisons";
pub const SUMMARIES_DIR: &str = "summaries";
const RESERVED: [&str; 2] = [COMPARISONS_DIR, SUMMARIES_DIR];

/// A run found in the benchmark folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    pub name: String,
    pub description: Option<String>,
}

/// Paths of runs, comparisons and summaries under one root.
#[derive(Debug, Clone)]
pub struct BenchmarkFolder {
    root: PathBuf,
}

impl BenchmarkFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn logs_dir(&self, name: &str) -> PathBuf {
        self.run_dir(name).join("logs")
    }

    pub fn client_log(&self, name: &str) -> PathBuf {
        self.logs_dir(name).join(format!("{name}_client.clog"))
    }

    pub fn server_log(&self, name: &str) -> PathBuf {
        self.logs_dir(name).join(format!("{name}_server.zip"))
    }

    pub fn results_csv(&self, name: &str) -> PathBuf {
        self.run_dir(name).join(format!("{name}_results.csv"))
    }

    pub fn description_file(&self, name: &str) -> PathBuf {
        self.run_dir(name).join(format!("{name}.md"))
    }

    pub fn comparison_dir(&self, primary: &str, baseline: &str) -> PathBuf {
        self.root
            .join(COMPARISONS_DIR)
            .join(format!("{primary}vs{baseline}"))
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.root.join(SUMMARIES_DIR)
    }

    /// `<name>_summary` for a single run, `multi_benchmark_summary` otherwise.
    pub fn summary_stem(names: &[String]) -> String {
        match names {
            [single] => format!("{single}_summary"),
            _ => "multi_benchmark_summary".to_string(),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.run_dir(name).is_dir()
    }

    pub fn load_table(&self, name: &str) -> Result<RunTable> {
        let path = self.results_csv(name);
        if !path.is_file() {
            bail!("benchmark result file not found for {name}: {}", path.display());
        }
        RunTable::load(&path).with_context(|| format!("failed to load results of {name}"))
    }

    /// Runs in name order, skipping the reserved report directories.
    pub fn list_runs(&self) -> Result<Vec<RunEntry>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read directory {}", self.root.display()))?;

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if RESERVED.contains(&name.as_str()) {
                continue;
            }
            let description = fs::read_to_string(self.description_file(&name))
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            runs.push(RunEntry { name, description });
        }
        runs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(runs)
    }

    /// Deletes a run and every comparison naming it on either side.
    ///
    /// Returns the removed comparison directories.
    pub fn remove_run(&self, name: &str) -> Result<Vec<PathBuf>> {
        if !self.exists(name) {
            bail!("no benchmark called {name} was found");
        }
        fs::remove_dir_all(self.run_dir(name))
            .with_context(|| format!("failed to delete {}", self.run_dir(name).display()))?;
        log::info!("removed benchmark {name}");

        let comparisons = self.root.join(COMPARISONS_DIR);
        if !comparisons.is_dir() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for entry in fs::read_dir(&comparisons)? {
            let entry = entry?;
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if names_run(&dir_name, name) {
                let path = entry.path();
                fs::remove_dir_all(&path)
                    .with_context(|| format!("failed to delete {}", path.display()))?;
                removed.push(path);
            }
        }
        removed.sort();
        Ok(removed)
    }
}

fn names_run(comparison: &str, name: &str) -> bool {
    comparison
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with("vs") && rest.len() > 2)
        || comparison
            .strip_suffix(name)
            .is_some_and(|rest| rest.ends_with("vs") && rest.len() > 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_folder(label: &str) -> BenchmarkFolder {
        let root = std::env::temp_dir().join(format!(
            "masbench-folder-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir_all(&root).unwrap();
        BenchmarkFolder::new(root)
    }

    #[test]
    fn layout_paths() {
        let folder = BenchmarkFolder::new("benchmarks");
        assert_eq!(
            folder.client_log("bfs"),
            Path::new("benchmarks/bfs/logs/bfs_client.clog")
        );
        assert_eq!(
            folder.server_log("bfs"),
            Path::new("benchmarks/bfs/logs/bfs_server.zip")
        );
        assert_eq!(
            folder.results_csv("bfs"),
            Path::new("benchmarks/bfs/bfs_results.csv")
        );
        assert_eq!(
            folder.comparison_dir("a", "b"),
            Path::new("benchmarks/comparisons/avsb")
        );
        assert_eq!(BenchmarkFolder::summary_stem(&["a".into()]), "a_summary");
        assert_eq!(
            BenchmarkFolder::summary_stem(&["a".into(), "b".into()]),
            "multi_benchmark_summary"
        );
    }

    #[test]
    fn comparison_names_match_either_side() {
        assert!(names_run("bfsvsdfs", "bfs"));
        assert!(names_run("dfsvsbfs", "bfs"));
        assert!(!names_run("bfs2vsdfs", "bfs"));
        assert!(!names_run("bfsvs", "bfs"));
    }

    #[test]
    fn lists_runs_and_skips_reserved_dirs() {
        let folder = temp_folder("list");
        fs::create_dir_all(folder.run_dir("zeta")).unwrap();
        fs::create_dir_all(folder.run_dir("alpha")).unwrap();
        fs::create_dir_all(folder.summaries_dir()).unwrap();
        fs::create_dir_all(folder.comparison_dir("alpha", "zeta")).unwrap();
        fs::write(folder.description_file("alpha"), "  greedy search\n").unwrap();

        let runs = folder.list_runs().unwrap();
        assert_eq!(
            runs,
            [
                RunEntry {
                    name: "alpha".into(),
                    description: Some("greedy search".into())
                },
                RunEntry {
                    name: "zeta".into(),
                    description: None
                },
            ]
        );
        fs::remove_dir_all(folder.root()).unwrap();
    }

    #[test]
    fn remove_run_drops_its_comparisons() {
        let folder = temp_folder("rm");
        fs::create_dir_all(folder.logs_dir("bfs")).unwrap();
        fs::create_dir_all(folder.comparison_dir("bfs", "dfs")).unwrap();
        fs::create_dir_all(folder.comparison_dir("dfs", "bfs")).unwrap();
        fs::create_dir_all(folder.comparison_dir("dfs", "astar")).unwrap();

        let removed = folder.remove_run("bfs").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!folder.exists("bfs"));
        assert!(folder.comparison_dir("dfs", "astar").is_dir());
        assert!(folder.remove_run("bfs").is_err());
        fs::remove_dir_all(folder.root()).unwrap();
    }
}
