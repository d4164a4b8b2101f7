// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands share one set of GitHub options:
// - archive: save every code file of every repository to text files
// - analyze: send samples of each repository to a language model and
//            build a skills summary
//
// Secrets (tokens, API keys) can come from flags, environment variables or a
// .env file, so they don't have to appear in shell history.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-harvester",
    version,
    about = "Archive a GitHub user's repositories or summarize the skills they show",
    long_about = "repo-harvester lists the repositories of the user behind a GitHub token, walks \
                  each repository's file tree and either saves the code to text files (archive) \
                  or asks a language model what the code demonstrates (analyze)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save every code file of every repository to <output>/<repo>.txt
    ///
    /// Example: repo-harvester archive --output ./dump
    Archive {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Analyze repositories with a language model and write a skills summary
    ///
    /// Example: repo-harvester analyze --limit 5 --model gpt-4o-mini
    Analyze {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        llm: AnalyzeArgs,
    },
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Archive { common } | Commands::Analyze { common, .. } => common,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GitHub personal access token (prompted for when missing)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub API root
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Output directory (defaults to a folder named after the GitHub user)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Only process the first N repositories
    #[arg(long)]
    pub limit: Option<usize>,

    /// Don't ask for confirmation
    #[arg(long, short)]
    pub yes: bool,

    /// Extra attempts after a server error or network fault
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubled on every retry)
    #[arg(long, default_value_t = 1000)]
    pub base_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Minimum pause between repositories, in seconds
    #[arg(long, default_value_t = 2.0)]
    pub min_delay_secs: f64,

    /// Maximum pause between repositories, in seconds
    #[arg(long, default_value_t = 5.0)]
    pub max_delay_secs: f64,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Options for the language-model step of `analyze`.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// API key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_url: String,

    /// Model name
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Maximum number of files sampled per repository
    #[arg(long, default_value_t = 15)]
    pub file_budget: usize,

    /// How many technologies/skills to list in the summary
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}
