// src/walk/tree.rs
// =============================================================================
// This module walks a repository's file tree through the contents API.
//
// How it works:
// 1. Start with the repository root on a stack
// 2. Pop a directory and list it
// 3. Sort the listing (entry points first, files before directories)
// 4. Handle every file that passes the policy
// 5. Push the subdirectories (reversed, so the first one is popped next)
// 6. Repeat until the stack is empty or the sample set is full
//
// That gives exactly the same visiting order as a recursive depth-first walk,
// without recursion or a counter hidden in a closure: the only counter is the
// SampleSet owned by this one walk.
//
// Failures are isolated: a directory that can't be listed or a file that
// can't be fetched is logged and skipped, and the walk carries on.
// =============================================================================

use super::policy::{binary_placeholder, sort_key, FileDecision, WalkPolicy};
use super::sample::{CodeSample, SampleSet};
use crate::github::{EntryKind, FileContent, GitHubClient, RepositoryRef, TreeEntry};
use tracing::{debug, info, warn};

/// What a walk produced.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Admitted files, in visiting order
    pub samples: Vec<CodeSample>,
    /// Files rejected by the policy (extension, keyword, size, binary)
    pub skipped: usize,
    /// Files or directories that could not be fetched
    pub unavailable: usize,
}

// Walks repositories with one policy
pub struct TreeWalker<'a> {
    client: &'a GitHubClient,
    policy: &'a WalkPolicy,
}

impl<'a> TreeWalker<'a> {
    pub fn new(client: &'a GitHubClient, policy: &'a WalkPolicy) -> Self {
        Self { client, policy }
    }

    // Walks one repository from its root
    //
    // Parameters:
    //   repo: the repository to walk
    //
    // Returns: the admitted samples plus skip/failure counts
    pub async fn walk(&self, repo: &RepositoryRef) -> WalkOutcome {
        let mut samples = SampleSet::new(self.policy);
        let mut outcome = WalkOutcome::default();

        // Directories still to list, as repository paths ("" = root)
        let mut stack = vec![String::new()];

        'walk: while let Some(dir) = stack.pop() {
            if samples.is_full() {
                break;
            }

            let mut entries = match self.client.list_directory(&repo.owner, &repo.name, &dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(repo = %repo.name, path = %dir, error = %e, "Failed to list directory");
                    outcome.unavailable += 1;
                    continue;
                }
            };
            entries.sort_by_cached_key(sort_key);

            let mut subdirs = Vec::new();
            for entry in &entries {
                match entry.kind {
                    EntryKind::File => {
                        if samples.is_full() {
                            debug!(repo = %repo.name, "File budget reached");
                            break 'walk;
                        }
                        self.visit_file(entry, &mut samples, &mut outcome).await;
                    }
                    EntryKind::Directory if self.policy.skips_dir(&entry.name) => {
                        debug!(path = %entry.path, "Skipping directory");
                    }
                    EntryKind::Directory => subdirs.push(entry.path.clone()),
                    EntryKind::Other => {
                        debug!(path = %entry.path, "Skipping symlink/submodule");
                    }
                }
            }

            stack.extend(subdirs.into_iter().rev());
        }

        info!(
            repo = %repo.name,
            admitted = samples.len(),
            chars = samples.total_chars(),
            skipped = outcome.skipped,
            unavailable = outcome.unavailable,
            "Walk finished"
        );

        outcome.samples = samples.into_samples();
        outcome
    }

    // Applies the policy to one file and, if admitted, fetches it
    async fn visit_file(&self, entry: &TreeEntry, samples: &mut SampleSet, outcome: &mut WalkOutcome) {
        match self.policy.decide(entry) {
            FileDecision::Skip(reason) => {
                debug!(path = %entry.path, ?reason, "Skipping file");
                outcome.skipped += 1;
            }
            FileDecision::Placeholder(text) => {
                info!(path = %entry.path, size = entry.size_bytes, "Large file, keeping a placeholder");
                samples.push(&entry.path, text);
            }
            FileDecision::Extract => match self.client.extract(entry).await {
                FileContent::Text(text) => {
                    if samples.push(&entry.path, text) {
                        debug!(path = %entry.path, "Processed");
                    }
                }
                FileContent::Binary if self.policy.placeholders => {
                    info!(path = %entry.path, "Noted binary file");
                    samples.push(&entry.path, binary_placeholder(entry.size_bytes));
                }
                FileContent::Binary => {
                    debug!(path = %entry.path, "Skipping binary file");
                    outcome.skipped += 1;
                }
                FileContent::Unavailable => {
                    outcome.unavailable += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Fetcher, RetryPolicy};
    use reqwest::header::HeaderMap;
    use serde_json::{json, Value};
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepositoryRef {
        RepositoryRef {
            name: "demo".into(),
            owner: "octo".into(),
            url: "https://github.com/octo/demo".into(),
            description: None,
            primary_language: Some("Python".into()),
            star_count: 0,
            fork_count: 0,
        }
    }

    fn client_for(server: &MockServer) -> GitHubClient {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let fetcher = Fetcher::new(HeaderMap::new(), Duration::from_secs(5), policy).unwrap();
        GitHubClient::new(fetcher, Url::parse(&server.uri()).unwrap())
    }

    fn file_json(server: &MockServer, repo_path: &str, size: u64) -> Value {
        json!({
            "name": repo_path.rsplit('/').next().unwrap(),
            "path": repo_path,
            "type": "file",
            "size": size,
            "download_url": format!("{}/raw/{}", server.uri(), repo_path),
            "url": format!("{}/api/{}", server.uri(), repo_path)
        })
    }

    fn dir_json(server: &MockServer, repo_path: &str) -> Value {
        json!({
            "name": repo_path.rsplit('/').next().unwrap(),
            "path": repo_path,
            "type": "dir",
            "size": 0,
            "download_url": null,
            "url": format!("{}/repos/octo/demo/contents/{}", server.uri(), repo_path)
        })
    }

    async fn mount_listing(server: &MockServer, dir: &str, entries: Vec<Value>) {
        let listing_path = if dir.is_empty() {
            "/repos/octo/demo/contents".to_string()
        } else {
            format!("/repos/octo/demo/contents/{dir}")
        };
        Mock::given(method("GET"))
            .and(path(listing_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(entries)))
            .mount(server)
            .await;
    }

    async fn mount_file(server: &MockServer, repo_path: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/raw/{repo_path}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn paths(outcome: &WalkOutcome) -> Vec<&str> {
        outcome.samples.iter().map(|s| s.path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_walk_orders_entry_points_first_and_recurses() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "",
            vec![
                dir_json(&server, "src"),
                file_json(&server, "util.py", 10),
                file_json(&server, "main.py", 120),
                file_json(&server, "test_utils.py", 10),
            ],
        )
        .await;
        mount_listing(&server, "src", vec![file_json(&server, "src/index.js", 10)]).await;
        mount_file(&server, "main.py", "print('main')").await;
        mount_file(&server, "util.py", "def util(): pass").await;
        mount_file(&server, "src/index.js", "export {}").await;

        let client = client_for(&server);
        let policy = WalkPolicy::sampling();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["main.py", "util.py", "src/index.js"]);
        assert_eq!(outcome.samples[0].content, "print('main')");
        // test_utils.py is rejected by keyword
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_node_modules_is_never_listed() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "",
            vec![dir_json(&server, "node_modules"), file_json(&server, "app.py", 10)],
        )
        .await;
        mount_file(&server, "app.py", "x = 1").await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/node_modules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let policy = WalkPolicy::sampling();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["app.py"]);
    }

    #[tokio::test]
    async fn test_nested_skip_dir_is_never_visited() {
        let server = MockServer::start().await;
        mount_listing(&server, "", vec![dir_json(&server, "web")]).await;
        mount_listing(
            &server,
            "web",
            vec![dir_json(&server, "web/node_modules"), file_json(&server, "web/server.py", 10)],
        )
        .await;
        mount_file(&server, "web/server.py", "serve()").await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/web/node_modules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let policy = WalkPolicy::sampling();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["web/server.py"]);
    }

    #[tokio::test]
    async fn test_samples_never_exceed_file_budget() {
        let server = MockServer::start().await;
        let names = ["a.py", "b.py", "c.py", "d.py", "e.py"];
        mount_listing(
            &server,
            "",
            names.iter().map(|n| file_json(&server, n, 10)).collect(),
        )
        .await;
        for name in names {
            mount_file(&server, name, "pass").await;
        }

        let client = client_for(&server);
        let policy = WalkPolicy::sampling().with_file_budget(3);
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["a.py", "b.py", "c.py"]);
    }

    #[tokio::test]
    async fn test_one_bad_file_does_not_stop_the_walk() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "",
            vec![
                file_json(&server, "a.py", 10),
                file_json(&server, "b.py", 10),
                dir_json(&server, "broken"),
                dir_json(&server, "lib"),
            ],
        )
        .await;
        // a.py has no mock: the download 404s
        mount_file(&server, "b.py", "ok").await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/broken"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_listing(&server, "lib", vec![file_json(&server, "lib/core.py", 10)]).await;
        mount_file(&server, "lib/core.py", "core").await;

        let client = client_for(&server);
        let policy = WalkPolicy::sampling();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["b.py", "lib/core.py"]);
        assert_eq!(outcome.unavailable, 2);
    }

    #[tokio::test]
    async fn test_archival_keeps_placeholders() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "",
            vec![file_json(&server, "dump.sql", 5_000_000), file_json(&server, "data.json", 4)],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/raw/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0x00, 0x01]))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let policy = WalkPolicy::archival();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["data.json", "dump.sql"]);
        assert_eq!(outcome.samples[0].content, "[Binary file: 4 bytes - content not included]");
        assert_eq!(
            outcome.samples[1].content,
            "[Large file: 5000000 bytes - content not included]"
        );
    }

    #[tokio::test]
    async fn test_archival_walks_into_bin_dir() {
        let server = MockServer::start().await;
        mount_listing(&server, "", vec![dir_json(&server, "src")]).await;
        mount_listing(
            &server,
            "src",
            vec![dir_json(&server, "src/bin"), file_json(&server, "src/lib.rs", 10)],
        )
        .await;
        mount_listing(&server, "src/bin", vec![file_json(&server, "src/bin/cli.rs", 10)]).await;
        mount_file(&server, "src/lib.rs", "pub fn lib() {}").await;
        mount_file(&server, "src/bin/cli.rs", "fn main() {}").await;

        let client = client_for(&server);
        let policy = WalkPolicy::archival();
        let outcome = TreeWalker::new(&client, &policy).walk(&repo()).await;

        assert_eq!(paths(&outcome), vec!["src/lib.rs", "src/bin/cli.rs"]);
        assert_eq!(outcome.samples[1].content, "fn main() {}");
    }
}
