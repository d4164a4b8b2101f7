// src/config.rs
// =============================================================================
// Run configuration, built once from the parsed command line.
//
// Nothing here is global: main() builds a HarvestConfig (and an LlmConfig for
// `analyze`) and passes references down to whoever needs them.
// =============================================================================

use crate::cli::{AnalyzeArgs, CommonArgs};
use crate::error::ConfigError;
use crate::github::RetryPolicy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Random pause inserted between two repositories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    /// Uniformly random duration in [min, max]
    pub fn sample(&self) -> Duration {
        let spread = self.max.saturating_sub(self.min);
        self.min + spread.mul_f64(rand::random::<f64>())
    }
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub api_url: Url,
    pub token: String,
    pub output_dir: Option<PathBuf>,
    pub limit: Option<usize>,
    pub assume_yes: bool,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub repo_delay: DelayRange,
}

impl HarvestConfig {
    // Parameters:
    //   args:  parsed command-line options
    //   token: GitHub token (from args/env or the interactive prompt)
    pub fn from_args(args: &CommonArgs, token: String) -> Result<Self, ConfigError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let api_url = parse_url("--api-url", &args.api_url)?;

        if args.limit == Some(0) {
            return Err(ConfigError::InvalidValue("--limit", "must be at least 1".into()));
        }

        let repo_delay = delay_range(args.min_delay_secs, args.max_delay_secs)?;

        Ok(Self {
            api_url,
            token,
            output_dir: args.output.clone(),
            limit: args.limit,
            assume_yes: args.yes,
            timeout: Duration::from_secs(args.timeout_secs),
            retry: RetryPolicy {
                max_retries: args.max_retries,
                base_delay: Duration::from_millis(args.base_delay_ms),
                ..RetryPolicy::default()
            },
            repo_delay,
        })
    }

    /// Headers sent with every GitHub request
    pub fn github_headers(&self) -> Result<HeaderMap, ConfigError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", self.token))
            .map_err(|_| ConfigError::InvalidValue("token", "contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        Ok(headers)
    }

    /// Where output goes: --output, or a folder named after the user
    pub fn output_dir_for(&self, user: &str) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from(user))
    }
}

/// Settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_args(args: &AnalyzeArgs) -> Result<Self, ConfigError> {
        let api_key = args
            .llm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingLlmKey)?
            .to_string();

        if args.file_budget == 0 {
            return Err(ConfigError::InvalidValue("--file-budget", "must be at least 1".into()));
        }

        Ok(Self {
            api_key,
            base_url: parse_url("--llm-url", &args.llm_url)?,
            model: args.model.clone(),
            temperature: 0.3,
            max_tokens: 1500,
            timeout: Duration::from_secs(120),
        })
    }

    /// {base}/chat/completions, whether or not the base ends in '/'
    pub fn completions_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["chat", "completions"]);
        }
        url
    }
}

fn parse_url(flag: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue(flag, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue(flag, format!("{value} is not a base URL")));
    }
    Ok(url)
}

fn delay_range(min_secs: f64, max_secs: f64) -> Result<DelayRange, ConfigError> {
    let min = Duration::try_from_secs_f64(min_secs)
        .map_err(|e| ConfigError::InvalidValue("--min-delay-secs", e.to_string()))?;
    let max = Duration::try_from_secs_f64(max_secs)
        .map_err(|e| ConfigError::InvalidValue("--max-delay-secs", e.to_string()))?;
    if min > max {
        return Err(ConfigError::InvalidValue(
            "--min-delay-secs",
            format!("{min_secs} is larger than --max-delay-secs {max_secs}"),
        ));
    }
    Ok(DelayRange { min, max })
}
