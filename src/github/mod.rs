// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub.
//
// Submodules:
// - fetch: GET with retries, exponential backoff and rate-limit waits
// - api: Typed endpoints (user, repository listing, directory contents)
// - extract: Turning a file entry into its text
// =============================================================================

mod api;
mod extract;
mod fetch;

pub use api::{ContentLocator, EntryKind, GitHubClient, RepositoryRef, TreeEntry};
pub use extract::FileContent;
pub use fetch::{Fetcher, RetryPolicy};
