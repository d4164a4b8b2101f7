// src/github/api.rs
// =============================================================================
// This module talks to the GitHub REST API (v3).
//
// Endpoints used:
// - GET /user                              -> who owns the token
// - GET /users/{user}/repos?page=N         -> repository listing (paginated)
// - GET /repos/{owner}/{repo}/contents/{p} -> one directory of a repository
//
// Every response is parsed into a typed struct. A listing entry that is
// missing a required field is logged and skipped instead of failing the
// whole listing.
//
// Rust concepts:
// - serde derive: Typed JSON parsing
// - From trait: Converting wire shapes into our own data model
// - Generics: One helper parses any list of entries
// =============================================================================

use super::fetch::Fetcher;
use crate::error::FetchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// GitHub returns at most 100 repositories per page
const PER_PAGE: u32 = 100;

/// The identity behind the token (GET /user)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

// One entry of GET /users/{user}/repos, as GitHub sends it
#[derive(Debug, Deserialize)]
struct RepoListing {
    name: String,
    owner: Owner,
    html_url: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
}

/// A repository as the rest of the tool sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    pub owner: String,
    pub url: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub star_count: u64,
    pub fork_count: u64,
}

impl RepositoryRef {
    /// "No description" when the repository has none (or an empty one)
    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => "No description",
        }
    }
}

impl From<RepoListing> for RepositoryRef {
    fn from(listing: RepoListing) -> Self {
        Self {
            name: listing.name,
            owner: listing.owner.login,
            url: listing.html_url,
            description: listing.description,
            primary_language: listing.language,
            star_count: listing.stargazers_count,
            fork_count: listing.forks_count,
        }
    }
}

/// What kind of thing a contents entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    #[serde(rename = "dir")]
    Directory,
    /// Symlinks and submodules: never followed
    #[serde(other)]
    Other,
}

/// Where a file's bytes can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocator {
    /// raw.githubusercontent.com style URL serving the bytes as-is
    Download(String),
    /// API resource returning a base64 envelope
    Api(String),
}

// One entry of GET /repos/{owner}/{repo}/contents/{path}, as GitHub sends it
#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    size: u64,
    download_url: Option<String>,
    url: String,
    encoding: Option<String>,
}

/// One file-or-directory record from a contents listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub locator: ContentLocator,
    pub encoding_hint: Option<String>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

impl From<RawEntry> for TreeEntry {
    fn from(raw: RawEntry) -> Self {
        // An empty download_url is as good as none
        let locator = match raw.download_url.filter(|u| !u.is_empty()) {
            Some(url) => ContentLocator::Download(url),
            None => ContentLocator::Api(raw.url),
        };

        Self {
            name: raw.name,
            path: raw.path,
            kind: raw.kind,
            size_bytes: raw.size,
            locator,
            encoding_hint: raw.encoding,
        }
    }
}

// GitHub API client
//
// Wraps the resilient fetcher with knowledge of GitHub's endpoints
#[derive(Debug, Clone)]
pub struct GitHubClient {
    pub(super) fetcher: Fetcher,
    api_url: Url,
}

impl GitHubClient {
    // Parameters:
    //   fetcher: retrying GET client carrying the auth headers
    //   api_url: API root, e.g. https://api.github.com
    pub fn new(fetcher: Fetcher, api_url: Url) -> Self {
        Self { fetcher, api_url }
    }

    // Builds an API URL from path segments, percent-encoding each one
    //
    // Example: ["repos", "octo", "demo", "contents", "src/main.rs"]
    //   -> https://api.github.com/repos/octo/demo/contents/src/main.rs
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> String {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                // Repository paths come in as "a/b/c"; split them so '/' survives
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url.to_string()
    }

    /// Who does the token belong to? Fails when the token is rejected.
    pub async fn authenticated_user(&self) -> Result<AuthenticatedUser, FetchError> {
        let url = self.endpoint(["user"]);
        let response = self.fetcher.get(&url, &[]).await?;
        read_json(&url, response).await
    }

    // Lists every repository of a user, one page at a time
    //
    // Stops at the first empty page. A failing page ends the listing; if it
    // was the very first page the error is returned, otherwise what we have
    // so far is kept.
    pub async fn list_repositories(&self, user: &str) -> Result<Vec<RepositoryRef>, FetchError> {
        let url = self.endpoint(["users", user, "repos"]);
        let mut repositories = Vec::new();
        let mut page: u32 = 1;

        loop {
            let query = [
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
            ];

            let entries = match self.fetch_list::<RepoListing>(&url, &query).await {
                Ok(entries) => entries,
                Err(e) if repositories.is_empty() => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Error fetching repositories page, keeping what we have");
                    break;
                }
            };

            if entries.is_empty() {
                break;
            }

            debug!(page, count = entries.len(), "Fetched repositories page");
            repositories.extend(entries.into_iter().map(RepositoryRef::from));
            page += 1;
        }

        info!(user, count = repositories.len(), "Listed repositories");
        Ok(repositories)
    }

    // Lists one directory of a repository ("" is the root)
    pub async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, FetchError> {
        let url = self.endpoint(["repos", owner, repo, "contents", path]);
        let entries = self.fetch_list::<RawEntry>(&url, &[]).await?;
        Ok(entries.into_iter().map(TreeEntry::from).collect())
    }

    // Fetches a JSON array and parses every element on its own
    //
    // Elements that don't fit T are logged and dropped
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let response = self.fetcher.get(url, query).await?;
        let value: serde_json::Value = read_json(url, response).await?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(FetchError::UnexpectedShape {
                    url: url.to_string(),
                    detail: format!("expected a JSON array, got {}", json_kind(&other)),
                })
            }
        };

        Ok(parse_each(url, items))
    }
}

// Parses each JSON value into T, skipping (and logging) the ones that fail
fn parse_each<T: DeserializeOwned>(url: &str, items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(url, index, error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect()
}

// Reads a response body as JSON of type T
pub(super) async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let bytes = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|e| FetchError::UnexpectedShape {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
