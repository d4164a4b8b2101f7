// src/walk/policy.rs
// =============================================================================
// This module decides which parts of a repository are worth reading.
//
// Three kinds of rules:
// - Directories: a skip-set that is never entered. Sampling skips build
//   output, dependency caches, VCS/IDE metadata and temp/log folders; the
//   archive only skips VCS metadata, so code under bin/, out/ etc. is kept
// - Files: extension allow-set, filename keyword blocklist, size ceiling
// - Order: entry-point files ("main", then "index") first, so that running out
//   of budget drops the least interesting files
//
// Two ready-made policies exist:
// - sampling(): small, bounded samples to send to a language model
// - archival(): every code file, with placeholders for huge or binary files
// =============================================================================

use crate::github::TreeEntry;
use std::path::Path;

/// Directory names that are never descended into (compared lowercase).
pub const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".pytest_cache",
    "venv",
    ".venv",
    "env",
    "build",
    "dist",
    "target",
    ".idea",
    ".vscode",
    ".next",
    ".nuxt",
    "coverage",
    "vendor",
    "tmp",
    "temp",
    "logs",
    ".cache",
    "bin",
    "obj",
    "out",
];

/// Directories the archive never enters: everything else may hold code.
pub const ARCHIVE_SKIP_DIRS: &[&str] = &[".git"];

/// Filename fragments that rule a file out of sampling (compared lowercase).
pub const SKIP_KEYWORDS: &[&str] = &[
    "test", "spec", "config", "setup", "build", "dist", ".min.", "bundle", "vendor", "lock",
];

/// Extensions sent to the language model: real source code only.
pub const SAMPLE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".go", ".rs", ".rb", ".php", ".c", ".cpp",
    ".h", ".hpp", ".cs", ".swift", ".kt", ".scala", ".dart", ".lua", ".r", ".sh", ".sql",
    ".vue", ".svelte", ".html", ".css", ".scss",
];

/// Extensions kept in the archive: code plus the config/docs that go with it.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".py", ".java", ".js", ".jsx", ".ts", ".tsx", ".html", ".css", ".scss", ".sass", ".less",
    ".php", ".rb", ".go", ".c", ".cpp", ".h", ".hpp", ".cs", ".swift", ".kt", ".rs", ".sh",
    ".bash", ".sql", ".vue", ".xml", ".yaml", ".yml", ".json", ".md", ".scala", ".pl", ".pm",
    ".asm", ".s", ".f", ".f90", ".r", ".dart", ".lua", ".groovy", ".ps1", ".psm1", ".bat",
    ".cmd", ".hs", ".erl",
];

/// Marker appended to content cut at the per-file ceiling
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Rules for one kind of walk.
#[derive(Debug, Clone)]
pub struct WalkPolicy {
    pub extensions: &'static [&'static str],
    pub skip_dirs: &'static [&'static str],
    pub skip_keywords: &'static [&'static str],
    /// Largest file size (bytes) that is fetched; anything bigger is skipped
    /// or becomes a placeholder
    pub max_file_size: u64,
    /// Emit placeholder text for oversized/binary files instead of dropping them
    pub placeholders: bool,
    /// Per-file character ceiling
    pub max_chars: Option<usize>,
    /// Maximum number of admitted files per repository
    pub file_budget: Option<usize>,
    /// Maximum characters summed over all admitted files
    pub max_total_chars: Option<usize>,
}

impl WalkPolicy {
    /// Bounded samples for language-model analysis
    pub fn sampling() -> Self {
        Self {
            extensions: SAMPLE_EXTENSIONS,
            skip_dirs: SKIP_DIRS,
            skip_keywords: SKIP_KEYWORDS,
            // must stay below 50,000 bytes
            max_file_size: 49_999,
            placeholders: false,
            max_chars: Some(3_000),
            file_budget: Some(15),
            max_total_chars: Some(40_000),
        }
    }

    /// Everything that looks like code, no budget
    pub fn archival() -> Self {
        Self {
            extensions: ARCHIVE_EXTENSIONS,
            skip_dirs: ARCHIVE_SKIP_DIRS,
            skip_keywords: &[],
            max_file_size: 1_000_000,
            placeholders: true,
            max_chars: None,
            file_budget: None,
            max_total_chars: None,
        }
    }

    pub fn with_file_budget(mut self, budget: usize) -> Self {
        self.file_budget = Some(budget);
        self
    }

    pub fn skips_dir(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.skip_dirs.iter().any(|d| *d == name)
    }

    // Decides what to do with a file entry
    //
    // Checks, in order: extension, filename keywords, size
    pub fn decide(&self, entry: &TreeEntry) -> FileDecision {
        let name = entry.name.to_lowercase();

        match extension_of(&name) {
            Some(ext) if self.extensions.contains(&ext.as_str()) => {}
            _ => return FileDecision::Skip(SkipReason::Extension),
        }

        if let Some(keyword) = self.skip_keywords.iter().copied().find(|k| name.contains(k)) {
            return FileDecision::Skip(SkipReason::Keyword(keyword));
        }

        if entry.size_bytes > self.max_file_size {
            return if self.placeholders {
                FileDecision::Placeholder(format!(
                    "[Large file: {} bytes - content not included]",
                    entry.size_bytes
                ))
            } else {
                FileDecision::Skip(SkipReason::TooLarge(entry.size_bytes))
            };
        }

        FileDecision::Extract
    }
}

/// Outcome of checking a file against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDecision {
    Extract,
    /// Admit the file, but with this text instead of its content
    Placeholder(String),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Extension,
    Keyword(&'static str),
    TooLarge(u64),
}

// Placeholder for a file whose bytes are not UTF-8
pub fn binary_placeholder(size_bytes: u64) -> String {
    format!("[Binary file: {size_bytes} bytes - content not included]")
}

// Sort key for a directory listing
//
// (is-not-a-file, "main" not in name, "index" not in name, lowercase name)
//
// false sorts before true, so: files first, then files named like an entry
// point, then alphabetical.
pub fn sort_key(entry: &TreeEntry) -> (bool, bool, bool, String) {
    let name = entry.name.to_lowercase();
    (
        !entry.is_file(),
        !name.contains("main"),
        !name.contains("index"),
        name,
    )
}

// ".py" for "main.py", None for "Makefile"
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}
