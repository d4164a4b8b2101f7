// src/harvest.rs
// =============================================================================
// This module runs a command over a list of repositories.
//
// Rules for a run:
// - Repositories are handled one at a time, in listing order
// - An error inside one repository is logged and counted; the run moves on
// - A short random pause between repositories keeps us under rate limits
//
// Errors that happen before the loop starts (e.g. the output directory can't
// be created) are returned and end the run.
// =============================================================================

use crate::analysis::Analyzer;
use crate::config::HarvestConfig;
use crate::github::{GitHubClient, RepositoryRef};
use crate::report::{self, ArchiveWriter, RepositoryRecord};
use crate::walk::{TreeWalker, WalkPolicy};
use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info};

/// How a run went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunStats {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

// Where `analyze` wrote its aggregate files
#[derive(Debug)]
pub struct AnalysisOutput {
    pub stats: RunStats,
    pub summary_json: PathBuf,
    pub summary_markdown: PathBuf,
}

// Archives every repository into <output>/<repo>.txt and ALL_REPOS.txt
//
// Parameters:
//   client: GitHub client
//   config: run configuration (output dir, delays)
//   user:   GitHub login the repositories belong to
//   repos:  repositories to process, in order
pub async fn archive_all(
    client: &GitHubClient,
    config: &HarvestConfig,
    user: &str,
    repos: &[RepositoryRef],
) -> Result<RunStats> {
    let dir = config.output_dir_for(user);
    let writer = ArchiveWriter::create(&dir, user, repos.len())?;
    let policy = WalkPolicy::archival();
    let walker = TreeWalker::new(client, &policy);

    let mut stats = RunStats::new(repos.len());
    for (i, repo) in repos.iter().enumerate() {
        info!("[{}/{}] Processing repository: {}", i + 1, repos.len(), repo.name);

        let outcome = walker.walk(repo).await;
        match writer.write_repository(repo, &outcome.samples) {
            Ok(path) => {
                stats.succeeded += 1;
                info!(
                    repo = %repo.name,
                    files = outcome.samples.len(),
                    "Repository saved to {}",
                    path.display()
                );
            }
            Err(e) => {
                stats.failed += 1;
                error!(repo = %repo.name, error = %format!("{e:#}"), "Error processing repository");
            }
        }

        pause_between_repositories(config, i, repos.len()).await;
    }

    info!(
        "Processed {} out of {} repositories successfully",
        stats.succeeded, stats.total
    );
    info!("Combined repository data is in {}", writer.combined_path().display());
    Ok(stats)
}

// Analyzes every repository and writes the per-repository records, the JSON
// summary and the markdown summary
//
// Parameters:
//   client:   GitHub client
//   analyzer: language-model analyzer
//   config:   run configuration
//   policy:   sampling policy (file budget etc.)
//   top_n:    how many technologies/skills the summary lists
//   user:     GitHub login
//   repos:    repositories to process, in order
pub async fn analyze_all(
    client: &GitHubClient,
    analyzer: &Analyzer,
    config: &HarvestConfig,
    policy: &WalkPolicy,
    top_n: usize,
    user: &str,
    repos: &[RepositoryRef],
) -> Result<AnalysisOutput> {
    let dir = config.output_dir_for(user);
    let walker = TreeWalker::new(client, policy);

    let mut stats = RunStats::new(repos.len());
    let mut records = Vec::with_capacity(repos.len());

    for (i, repo) in repos.iter().enumerate() {
        info!("[{}/{}] Analyzing repository: {}", i + 1, repos.len(), repo.name);

        let outcome = walker.walk(repo).await;
        let analysis = analyzer.analyze(repo, &outcome.samples).await;
        let record = RepositoryRecord {
            repository: repo.clone(),
            analysis,
            sampled_files: outcome.samples.iter().map(|s| s.path.clone()).collect(),
            analyzed_at: Utc::now(),
        };

        match report::emit(&dir, &record) {
            Ok(path) => {
                stats.succeeded += 1;
                info!(repo = %repo.name, "Analysis saved to {}", path.display());
                records.push(record);
            }
            Err(e) => {
                stats.failed += 1;
                error!(repo = %repo.name, error = %format!("{e:#}"), "Error processing repository");
            }
        }

        pause_between_repositories(config, i, repos.len()).await;
    }

    let summary = report::summarize(user, records, top_n, Utc::now());
    let summary_json = report::write_summary_json(&dir, &summary)?;
    let summary_markdown = report::write_markdown(&dir, &summary)?;

    info!(
        "Analyzed {} out of {} repositories successfully",
        stats.succeeded, stats.total
    );
    Ok(AnalysisOutput {
        stats,
        summary_json,
        summary_markdown,
    })
}

// Sleeps a random while, except after the last repository
async fn pause_between_repositories(config: &HarvestConfig, index: usize, total: usize) {
    if index + 1 >= total {
        return;
    }
    let delay = config.repo_delay.sample();
    if !delay.is_zero() {
        info!("Waiting {:.2} seconds before next repository...", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CompletionClient;
    use crate::config::{DelayRange, LlmConfig};
    use crate::github::{Fetcher, RetryPolicy};
    use reqwest::header::HeaderMap;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, out: &Path) -> HarvestConfig {
        HarvestConfig {
            api_url: Url::parse(&server.uri()).unwrap(),
            token: "t".into(),
            output_dir: Some(out.to_path_buf()),
            limit: None,
            assume_yes: true,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 0,
                ..RetryPolicy::default()
            },
            repo_delay: DelayRange {
                min: Duration::ZERO,
                max: Duration::ZERO,
            },
        }
    }

    fn client_for(config: &HarvestConfig) -> GitHubClient {
        let fetcher = Fetcher::new(HeaderMap::new(), config.timeout, config.retry.clone()).unwrap();
        GitHubClient::new(fetcher, config.api_url.clone())
    }

    fn repo(name: &str) -> RepositoryRef {
        RepositoryRef {
            name: name.into(),
            owner: "octo".into(),
            url: format!("https://github.com/octo/{name}"),
            description: Some("demo repo".into()),
            primary_language: Some("Python".into()),
            star_count: 0,
            fork_count: 0,
        }
    }

    async fn mount_repo(server: &MockServer, name: &str, file: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/octo/{name}/contents")))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(vec![json!({
                "name": file,
                "path": file,
                "type": "file",
                "size": body.len(),
                "download_url": format!("{}/raw/{name}/{file}", server.uri()),
                "url": format!("{}/api/{name}/{file}", server.uri())
            })])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/raw/{name}/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_archive_all_writes_every_repository() {
        let server = MockServer::start().await;
        mount_repo(&server, "one", "main.py", "print(1)").await;
        mount_repo(&server, "two", "app.rs", "fn main() {}").await;

        let out = tempfile::tempdir().unwrap();
        let config = config_for(&server, out.path());
        let client = client_for(&config);

        let stats = archive_all(&client, &config, "octo", &[repo("one"), repo("two")])
            .await
            .unwrap();

        assert_eq!(stats, RunStats { total: 2, succeeded: 2, failed: 0 });
        let one = fs::read_to_string(out.path().join("one.txt")).unwrap();
        assert!(one.contains("===== main.py =======\nprint(1)"));
        let combined = fs::read_to_string(out.path().join("ALL_REPOS.txt")).unwrap();
        assert!(combined.contains("===== two/app.rs =======\nfn main() {}"));
    }

    #[tokio::test]
    async fn test_analyze_all_survives_a_broken_repository() {
        let server = MockServer::start().await;
        mount_repo(&server, "good", "main.py", "print('hello')").await;
        // "bad" has no mocks: its listing 404s, the walk yields nothing, and
        // the analysis still runs on metadata alone
        Mock::given(method("POST"))
            .and(path("/llm/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content":
                    "{\"technologies\": [\"Python\"], \"skills\": [\"Scripting\"], \"achievements\": [], \"summary\": \"Prints things.\"}"
                } }]
            })))
            .mount(&server)
            .await;

        let out = tempfile::tempdir().unwrap();
        let config = config_for(&server, out.path());
        let client = client_for(&config);
        let analyzer = Analyzer::new(
            CompletionClient::new(LlmConfig {
                api_key: "k".into(),
                base_url: Url::parse(&format!("{}/llm", server.uri())).unwrap(),
                model: "m".into(),
                temperature: 0.3,
                max_tokens: 100,
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        );
        let policy = WalkPolicy::sampling();

        let output = analyze_all(
            &client,
            &analyzer,
            &config,
            &policy,
            10,
            "octo",
            &[repo("bad"), repo("good")],
        )
        .await
        .unwrap();

        assert_eq!(output.stats.succeeded, 2);
        assert!(out.path().join("analysis/good.json").exists());
        assert!(out.path().join("analysis/bad.json").exists());

        let good: RepositoryRecord =
            serde_json::from_str(&fs::read_to_string(out.path().join("analysis/good.json")).unwrap())
                .unwrap();
        assert_eq!(good.sampled_files, vec!["main.py"]);
        assert_eq!(good.analysis.technologies, vec!["Python"]);

        let summary: Value =
            serde_json::from_str(&fs::read_to_string(&output.summary_json).unwrap()).unwrap();
        assert_eq!(summary["top_technologies"][0]["name"], "Python");
        assert_eq!(summary["top_technologies"][0]["count"], 2);

        let markdown = fs::read_to_string(&output.summary_markdown).unwrap();
        assert!(markdown.starts_with("# Skills Summary for octo"));
    }
}
