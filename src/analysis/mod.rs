// src/analysis/mod.rs
// =============================================================================
// This module asks a language model what a repository shows about its author.
//
// Submodules:
// - prompt: Builds the prompt from metadata + code samples
// - llm: Sends it to the chat-completion endpoint
// - parse: Turns the reply into a RepositoryAnalysis (with fallbacks)
//
// Analyzer::analyze() never fails: an unreachable endpoint gives a "failed"
// record and an unreadable reply gives an "irregular" record.
// =============================================================================

mod llm;
mod parse;
mod prompt;

pub use llm::CompletionClient;
pub use parse::RepositoryAnalysis;

use crate::github::RepositoryRef;
use crate::walk::CodeSample;
use parse::parse_reply;
use prompt::build_prompt;
use tracing::{info, warn};

pub struct Analyzer {
    client: CompletionClient,
}

impl Analyzer {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, repo: &RepositoryRef, samples: &[CodeSample]) -> RepositoryAnalysis {
        let prompt = build_prompt(repo, samples);
        info!(
            repo = %repo.name,
            samples = samples.len(),
            truncated = samples.iter().filter(|s| s.is_truncated()).count(),
            "Requesting analysis"
        );

        match self.client.complete(&prompt).await {
            Ok(reply) => parse_reply(&reply),
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "Analysis request failed");
                RepositoryAnalysis::failed(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use serde_json::json;
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
            primary_language: None,
            star_count: 0,
            fork_count: 0,
        }
    }

    fn analyzer_for(base: &str) -> Analyzer {
        let config = LlmConfig {
            api_key: "sk-test".into(),
            base_url: Url::parse(base).unwrap(),
            model: "test-model".into(),
            temperature: 0.3,
            max_tokens: 100,
            timeout: Duration::from_secs(5),
        };
        Analyzer::new(CompletionClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_unparsable_reply_gives_irregular_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "not valid json{{" } }]
            })))
            .mount(&server)
            .await;

        let analysis = analyzer_for(&server.uri()).analyze(&repo(), &[]).await;
        assert_eq!(analysis.summary, "not valid json{{...");
        assert_eq!(analysis.skills, vec!["AI analysis completed but format irregular"]);
    }

    #[tokio::test]
    async fn test_endpoint_failure_gives_failed_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let analysis = analyzer_for(&server.uri()).analyze(&repo(), &[]).await;
        assert!(analysis.summary.starts_with("Analysis failed:"));
        assert!(analysis.technologies.is_empty());
    }
}
