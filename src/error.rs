// src/error.rs
// =============================================================================
// Typed errors for the layers that talk to the outside world.
//
// - FetchError: anything that can go wrong getting a resource from GitHub
// - ConfigError: bad or missing settings found before any request is made
// - AnalysisError: the language-model request failed
//
// The orchestrator (src/harvest.rs) wraps these in anyhow::Error once they
// reach the per-repository boundary.
// =============================================================================

use thiserror::Error;

/// Failure of a single GET through the resilient fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a status we do not retry (4xx, non-200 2xx, ...)
    #[error("GET {url} failed with HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Server errors or network faults used up the whole retry budget
    #[error("GET {url} gave up after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// The response body did not have the shape we expected
    #[error("unexpected response shape from {url}: {detail}")]
    UnexpectedShape { url: String, detail: String },

    /// The body could not be read off the wire
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Problems with the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no GitHub token given (use --token, GITHUB_TOKEN or the prompt)")]
    MissingToken,

    #[error("no language-model API key given (use --llm-api-key or OPENAI_API_KEY)")]
    MissingLlmKey,

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// The completion endpoint could not give us a reply.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion reply had no message content")]
    EmptyReply,
}
