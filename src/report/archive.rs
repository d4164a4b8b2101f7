// src/report/archive.rs
// =============================================================================
// Text archive output for the `archive` command.
//
// Layout of the output directory:
//   <repo>.txt      one file per repository, rewritten on every run
//   ALL_REPOS.txt   every repository of the run, one block after another
//
// Per-repository file:
//   Repository: <name>
//   Owner: <owner>
//   URL: <url>
//   Description: <description>
//   ==================================================
//
//   ===== src/main.py =======
//   <content>
// =============================================================================

use crate::github::RepositoryRef;
use crate::walk::CodeSample;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const COMBINED_FILE: &str = "ALL_REPOS.txt";

pub struct ArchiveWriter {
    dir: PathBuf,
    combined: PathBuf,
}

impl ArchiveWriter {
    // Creates the output directory and starts a fresh ALL_REPOS.txt
    //
    // Parameters:
    //   dir:   output directory (created if missing)
    //   user:  GitHub login, shown in the combined header
    //   total: number of repositories this run will process
    pub fn create(dir: &Path, user: &str, total: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let combined = dir.join(COMBINED_FILE);
        let header = format!(
            "ALL REPOSITORIES FOR {user}\nCreated on: {}\nTotal repositories: {total}\n{}\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(50)
        );
        fs::write(&combined, header)
            .with_context(|| format!("Failed to write {}", combined.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            combined,
        })
    }

    pub fn combined_path(&self) -> &Path {
        &self.combined
    }

    // Writes <repo>.txt (replacing any previous one) and appends the same
    // content to ALL_REPOS.txt
    //
    // Returns: path of the per-repository file
    pub fn write_repository(&self, repo: &RepositoryRef, samples: &[CodeSample]) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.txt", safe_file_stem(&repo.name)));

        let mut own = repository_header(repo, 50);
        let mut combined = format!("\n\n{}", repository_header(repo, 80));
        for sample in samples {
            own.push_str(&section(&sample.path, &sample.content));
            combined.push_str(&section(&format!("{}/{}", repo.name, sample.path), &sample.content));
        }

        fs::write(&path, own).with_context(|| format!("Failed to write {}", path.display()))?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.combined)
            .with_context(|| format!("Failed to open {}", self.combined.display()))?;
        file.write_all(combined.as_bytes())
            .with_context(|| format!("Failed to append to {}", self.combined.display()))?;

        Ok(path)
    }
}

// Header block framed by a rule of `width` '=' characters
fn repository_header(repo: &RepositoryRef, width: usize) -> String {
    let rule = "=".repeat(width);
    let framed = if width > 50 { format!("{rule}\n") } else { String::new() };
    format!(
        "{framed}Repository: {}\nOwner: {}\nURL: {}\nDescription: {}\n{rule}\n\n",
        repo.name,
        repo.owner,
        repo.url,
        repo.description_or_default()
    )
}

fn section(label: &str, content: &str) -> String {
    format!("===== {label} =======\n{content}\n\n")
}

// Repository names are already filesystem-safe on GitHub; this only guards
// against path separators sneaking into a file name
pub(crate) fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}
