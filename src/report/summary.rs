// src/report/summary.rs
// =============================================================================
// JSON output for the `analyze` command.
//
// - analysis/<repo>.json: one record per repository, overwritten on rerun
// - summary.json: every record plus technology/skill frequency rankings
//
// Ranking tie-break: when two names have the same count, the one seen first
// (in repository order, then list order) ranks higher.
// =============================================================================

use super::archive::safe_file_stem;
use crate::analysis::RepositoryAnalysis;
use crate::github::RepositoryRef;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ANALYSIS_DIR: &str = "analysis";
pub const SUMMARY_JSON: &str = "summary.json";

/// Everything persisted about one analyzed repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub repository: RepositoryRef,
    pub analysis: RepositoryAnalysis,
    /// Paths of the files that were sent to the model
    pub sampled_files: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// A name and how many repositories mentioned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked {
    pub name: String,
    pub count: usize,
}

/// Aggregate over a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub user: String,
    pub generated_at: DateTime<Utc>,
    pub repositories_analyzed: usize,
    pub top_technologies: Vec<Ranked>,
    pub top_skills: Vec<Ranked>,
    pub analyses: Vec<RepositoryRecord>,
}

// Writes <dir>/analysis/<repo>.json, replacing any earlier record
//
// Returns: path of the written file
pub fn emit(dir: &Path, record: &RepositoryRecord) -> Result<PathBuf> {
    let analysis_dir = dir.join(ANALYSIS_DIR);
    fs::create_dir_all(&analysis_dir)
        .with_context(|| format!("Failed to create {}", analysis_dir.display()))?;

    let path = analysis_dir.join(format!("{}.json", safe_file_stem(&record.repository.name)));
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

// Builds the run summary
//
// Parameters:
//   user:         GitHub login the run was for
//   records:      per-repository records, in processing order
//   top_n:        how many technologies/skills to keep
//   generated_at: timestamp stored in the report
pub fn summarize(
    user: &str,
    records: Vec<RepositoryRecord>,
    top_n: usize,
    generated_at: DateTime<Utc>,
) -> SummaryReport {
    let top_technologies = top_counts(
        records
            .iter()
            .flat_map(|r| r.analysis.technologies.iter().map(String::as_str)),
        top_n,
    );
    let top_skills = top_counts(
        records
            .iter()
            .flat_map(|r| r.analysis.skills.iter().map(String::as_str)),
        top_n,
    );

    SummaryReport {
        user: user.to_string(),
        generated_at,
        repositories_analyzed: records.len(),
        top_technologies,
        top_skills,
        analyses: records,
    }
}

// Counts names and returns the `n` most common
//
// Equal counts keep first-seen order (the sort is stable and the input to it
// is in first-seen order).
pub fn top_counts<'a>(names: impl IntoIterator<Item = &'a str>, n: usize) -> Vec<Ranked> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for name in names {
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut ranked: Vec<Ranked> = order
        .into_iter()
        .map(|name| Ranked {
            name: name.to_string(),
            count: counts[name],
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

// Writes <dir>/summary.json
pub fn write_summary_json(dir: &Path, summary: &SummaryReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(SUMMARY_JSON);
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
