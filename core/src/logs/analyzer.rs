//! Latency analysis over aggregator logs.
//!
//! The aggregator prints one line per completed stage:
//!
//! ```text
//! ... with latency [12, 9, 31], status {"recv"}
//! ```
//!
//! Samples are grouped by status category in the order categories first
//! appear, averaged, and compared stage to stage.

use std::fmt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::RigError;

lazy_static! {
    /// Latency array and status category of one aggregator line.
    static ref RE_LATENCY: Regex = Regex::new(r#"with latency \[([^\]]*)\], status \{"([^"]+)"\}"#)
        .expect("failed to compile RE_LATENCY regex");
}


// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// All samples seen for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyRecord {
    pub category: String,
    pub samples: Vec<i64>,
}

impl LatencyRecord {
    /// `None` when no samples were recorded.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|&v| v as f64).sum();
        Some(sum / self.samples.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAverage {
    pub category: String,
    pub mean: Option<f64>,
    pub samples: usize,
}

/// Difference between the means of two consecutive categories.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDelta {
    pub from: String,
    pub to: String,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyReport {
    pub averages: Vec<CategoryAverage>,
    pub deltas: Vec<StageDelta>,
}

impl LatencyReport {
    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.averages.iter().map(|a| a.category.as_str()).collect()
    }

    pub fn mean(&self, category: &str) -> Option<f64> {
        self.averages
            .iter()
            .find(|a| a.category == category)
            .and_then(|a| a.mean)
    }
}

fn fmt_ms(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2} ms", v),
        None => "no data".to_string(),
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No latency samples found.");
        }
        writeln!(f, "Average latencies per category:")?;
        for a in &self.averages {
            writeln!(f, "  {}: {}", a.category, fmt_ms(a.mean))?;
        }
        writeln!(f)?;
        writeln!(f, "Latency differences between subsequent categories:")?;
        for d in &self.deltas {
            writeln!(f, "  {} -> {}: {}", d.from, d.to, fmt_ms(d.delta))?;
        }
        Ok(())
    }
}


// ---------------------------------------------------------------------------
// LatencyAnalyzer
// ---------------------------------------------------------------------------

/// Accumulates samples line by line.
#[derive(Debug, Default)]
pub struct LatencyAnalyzer {
    records: Vec<LatencyRecord>,
}

impl LatencyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LatencyRecord] {
        &self.records
    }

    /// Record the samples of one line. Returns whether the line matched.
    pub fn ingest_line(&mut self, line: &str) -> bool {
        let caps = match RE_LATENCY.captures(line) {
            Some(caps) => caps,
            None => return false,
        };
        let values = &caps[1];
        let category = &caps[2];
        let samples = match parse_samples(values) {
            Some(samples) => samples,
            None => {
                warn!(category = %category, values = %values, "skipping malformed latency line");
                return false;
            }
        };
        match self.records.iter_mut().find(|r| r.category == category) {
            Some(record) => record.samples.extend(samples),
            None => self.records.push(LatencyRecord {
                category: category.to_string(),
                samples,
            }),
        }
        true
    }

    /// Ingest every line of `content`. Returns the number of matching lines.
    pub fn ingest_str(&mut self, content: &str) -> usize {
        content.lines().filter(|l| self.ingest_line(l)).count()
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<usize, RigError> {
        let bytes = std::fs::read(path)?;
        let matched = self.ingest_str(&String::from_utf8_lossy(&bytes));
        debug!(file = %path.display(), matched, "ingested log file");
        Ok(matched)
    }

    /// Ingest files in name order, whatever order they are given in.
    pub fn ingest_files(&mut self, files: &[PathBuf]) -> Result<usize, RigError> {
        let mut sorted = files.to_vec();
        sorted.sort();
        let mut matched = 0;
        for file in &sorted {
            matched += self.ingest_file(file)?;
        }
        Ok(matched)
    }

    pub fn report(&self) -> LatencyReport {
        let averages: Vec<CategoryAverage> = self
            .records
            .iter()
            .map(|r| CategoryAverage {
                category: r.category.clone(),
                mean: r.mean(),
                samples: r.samples.len(),
            })
            .collect();
        let deltas = averages
            .windows(2)
            .map(|pair| StageDelta {
                from: pair[0].category.clone(),
                to: pair[1].category.clone(),
                delta: match (pair[0].mean, pair[1].mean) {
                    (Some(a), Some(b)) => Some(b - a),
                    _ => None,
                },
            })
            .collect();
        LatencyReport { averages, deltas }
    }
}

/// Comma-separated integers. An empty list is valid; any bad entry is not.
fn parse_samples(values: &str) -> Option<Vec<i64>> {
    if values.trim().is_empty() {
        return Some(Vec::new());
    }
    values
        .split(',')
        .map(|v| v.trim().parse::<i64>().ok())
        .collect()
}


/// `<prefix>*.log` files directly inside `dir`, sorted by name.
pub fn log_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, RigError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(prefix) && n.ends_with(".log"));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Analyze every matching log file in `dir`.
pub fn analyze_dir(dir: &Path, prefix: &str) -> Result<LatencyReport, RigError> {
    let files = log_files(dir, prefix)?;
    let mut analyzer = LatencyAnalyzer::new();
    let matched = analyzer.ingest_files(&files)?;
    debug!(files = files.len(), matched, "analysis complete");
    Ok(analyzer.report())
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
INFO node: started
INFO syncer: batch 1 with latency [10, 20, 30], status {\"recv\"}
INFO syncer: batch 1 with latency [5], status {\"commit\"}
garbage line
";

    #[test]
    fn means_and_differences() {
        let mut a = LatencyAnalyzer::new();
        assert_eq!(a.ingest_str(SAMPLE), 2);
        let report = a.report();
        assert_eq!(report.categories(), vec!["recv", "commit"]);
        assert_eq!(report.mean("recv"), Some(20.0));
        assert_eq!(report.mean("commit"), Some(5.0));
        assert_eq!(report.deltas.len(), 1);
        assert_eq!(report.deltas[0].delta, Some(-15.0));
        assert_eq!(report.deltas[0].from, "recv");
    }

    #[test]
    fn no_matching_lines_gives_empty_report() {
        let mut a = LatencyAnalyzer::new();
        assert_eq!(a.ingest_str("nothing here\n\n"), 0);
        let report = a.report();
        assert!(report.is_empty());
        assert!(report.deltas.is_empty());
        assert_eq!(report.to_string(), "No latency samples found.\n");
    }

    #[test]
    fn empty_array_registers_no_data_category() {
        let mut a = LatencyAnalyzer::new();
        a.ingest_str("with latency [4], status {\"a\"}\nwith latency [], status {\"b\"}\nwith latency [ 8 ], status {\"c\"}\n");
        let report = a.report();
        assert_eq!(report.categories(), vec!["a", "b", "c"]);
        assert_eq!(report.averages[1].mean, None);
        assert_eq!(report.deltas[0].delta, None);
        assert_eq!(report.deltas[1].delta, None);
        let text = report.to_string();
        assert!(text.contains("  b: no data\n"));
        assert!(text.contains("  a -> b: no data\n"));
    }

    #[test]
    fn categories_accumulate_across_lines() {
        let mut a = LatencyAnalyzer::new();
        a.ingest_str("with latency [1,2], status {\"x\"}\nwith latency [3], status {\"y\"}\nwith latency [ 3 ,  6 ], status {\"x\"}\n");
        assert_eq!(a.records()[0].samples, vec![1, 2, 3, 6]);
        assert_eq!(a.report().mean("x"), Some(3.0));
        assert_eq!(a.report().deltas[0].delta, Some(0.0));
    }

    #[test]
    fn malformed_line_is_skipped() {
        let mut a = LatencyAnalyzer::new();
        assert!(!a.ingest_line("with latency [1, x], status {\"bad\"}"));
        assert!(a.records().is_empty());
    }

    #[test]
    fn display_uses_two_decimals() {
        let mut a = LatencyAnalyzer::new();
        a.ingest_str("with latency [1, 2], status {\"p\"}\nwith latency [2], status {\"q\"}\n");
        let text = a.report().to_string();
        assert!(text.contains("  p: 1.50 ms\n"));
        assert!(text.contains("  p -> q: 0.50 ms\n"));
    }

    #[test]
    fn files_are_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("syncer-b.log"), "with latency [1], status {\"second\"}\n").unwrap();
        std::fs::write(dir.path().join("syncer-a.log"), "with latency [1], status {\"first\"}\n").unwrap();
        std::fs::write(dir.path().join("client-0.log"), "with latency [1], status {\"client\"}\n").unwrap();
        std::fs::write(dir.path().join("syncer-c.txt"), "with latency [1], status {\"other\"}\n").unwrap();

        let files = log_files(dir.path(), "syncer-").unwrap();
        assert_eq!(files.len(), 2);
        let report = analyze_dir(dir.path(), "syncer-").unwrap();
        assert_eq!(report.categories(), vec!["first", "second"]);
    }
}
