// src/report/markdown.rs
// =============================================================================
// Renders a SummaryReport as a human-readable markdown document.
//
// This is a pure function of the report: same report in, same text out.
// =============================================================================

use super::summary::{Ranked, SummaryReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_MARKDOWN: &str = "SUMMARY.md";

pub fn render_markdown(summary: &SummaryReport) -> String {
    let mut out = format!(
        "# Skills Summary for {}\n\n_Generated {} from {} repositories._\n\n",
        summary.user,
        summary.generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.repositories_analyzed
    );

    out.push_str(&ranking("Top Technologies", &summary.top_technologies));
    out.push_str(&ranking("Top Skills", &summary.top_skills));

    out.push_str("## Repositories\n\n");
    for record in &summary.analyses {
        let repo = &record.repository;
        let analysis = &record.analysis;
        out.push_str(&format!("### [{}]({})\n\n{}\n\n", repo.name, repo.url, analysis.summary));

        if !analysis.technologies.is_empty() {
            out.push_str(&format!("**Technologies:** {}\n\n", analysis.technologies.join(", ")));
        }
        if !analysis.skills.is_empty() {
            out.push_str(&format!("**Skills:** {}\n\n", analysis.skills.join(", ")));
        }
        if !analysis.achievements.is_empty() {
            out.push_str("**Achievements:**\n\n");
            for achievement in &analysis.achievements {
                out.push_str(&format!("- {achievement}\n"));
            }
            out.push('\n');
        }
    }

    out
}

// "## {title}" followed by a numbered list, or "_None found._"
fn ranking(title: &str, ranked: &[Ranked]) -> String {
    let mut section = format!("## {title}\n\n");
    if ranked.is_empty() {
        section.push_str("_None found._\n");
    }
    for (i, entry) in ranked.iter().enumerate() {
        section.push_str(&format!("{}. {} ({})\n", i + 1, entry.name, entry.count));
    }
    section.push('\n');
    section
}

// Writes <dir>/SUMMARY.md
pub fn write_markdown(dir: &Path, summary: &SummaryReport) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_MARKDOWN);
    fs::write(&path, render_markdown(summary))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
