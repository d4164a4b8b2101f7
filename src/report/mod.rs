// src/report/mod.rs
// =============================================================================
// This module writes everything a run produces to disk.
//
// Submodules:
// - archive: <repo>.txt and ALL_REPOS.txt for the `archive` command
// - summary: per-repository JSON records and summary.json for `analyze`
// - markdown: SUMMARY.md, rendered from the summary
//
// Every file is written whole, so rerunning a command replaces earlier
// output instead of appending to it.
// =============================================================================

mod archive;
mod markdown;
mod summary;

pub use archive::ArchiveWriter;
pub use markdown::write_markdown;
pub use summary::{emit, summarize, write_summary_json, RepositoryRecord};
