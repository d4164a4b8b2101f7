// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Load .env, parse command-line arguments and set up logging
// 2. Resolve the GitHub token and check who it belongs to
// 3. List the user's repositories and ask which ones to process
// 4. Dispatch to the `archive` or `analyze` handler
// 5. Exit with proper code (0 = all good, 1 = some repositories failed or the
//    run was cancelled, 2 = fatal error)
//
// Rust concepts used:
// - async/await: every GitHub and language-model call is a network request
// - Result<T, E> with `?`: errors bubble up to run() and become exit code 2
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod analysis; // src/analysis/ - language-model prompt, request and reply parsing
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - run configuration
mod error; // src/error.rs - typed errors
mod github; // src/github/ - GitHub API access with retries
mod harvest; // src/harvest.rs - per-repository loop
mod prompt; // src/prompt.rs - interactive questions
mod report; // src/report/ - output files
mod walk; // src/walk/ - repository tree traversal

use analysis::{Analyzer, CompletionClient};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands};
use config::{HarvestConfig, LlmConfig};
use github::{Fetcher, GitHubClient, RepositoryRef};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walk::WalkPolicy;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every repository processed
//   Ok(1) = some repositories failed, or the user said no
//   Err   = fatal error (bad config, authentication, listing)
async fn run() -> Result<i32> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let common = cli.command.common();
    init_tracing(common.verbose, common.log_file.as_deref())?;

    // Check the language-model settings before touching GitHub
    let llm_config = match &cli.command {
        Commands::Analyze { llm, .. } => Some(LlmConfig::from_args(llm)?),
        Commands::Archive { .. } => None,
    };

    let token = match &common.token {
        Some(token) => token.clone(),
        None => prompt::ask_secret("Enter your GitHub personal access token: ")
            .context("Failed to read the token")?,
    };
    let config = HarvestConfig::from_args(common, token)?;

    let fetcher = Fetcher::new(config.github_headers()?, config.timeout, config.retry.clone())
        .context("Failed to build the HTTP client")?;
    let client = GitHubClient::new(fetcher, config.api_url.clone());

    let user = client
        .authenticated_user()
        .await
        .context("Authentication failed, check your GitHub token")?;
    info!("Authenticated as {}", user.login);

    let repos = client
        .list_repositories(&user.login)
        .await
        .context("Failed to list repositories")?;

    if repos.is_empty() {
        info!("No repositories found for {}", user.login);
        return Ok(0);
    }

    for repo in &repos {
        info!(
            "{} - {} (stars: {})",
            repo.name,
            repo.description_or_default(),
            repo.star_count
        );
    }

    let is_analyze = matches!(cli.command, Commands::Analyze { .. });
    let Some(repos) = select_repositories(&config, is_analyze, repos)? else {
        info!("Cancelled");
        return Ok(1);
    };

    match (&cli.command, llm_config) {
        (Commands::Analyze { llm, .. }, Some(llm_config)) => {
            handle_analyze(&client, &config, llm, llm_config, &user.login, &repos).await
        }
        _ => handle_archive(&client, &config, &user.login, &repos).await,
    }
}

// Sets up logging to stderr (and optionally a file)
//
// Parameters:
//   verbose:  0 = info, 1 = debug, 2+ = trace (RUST_LOG wins when set)
//   log_file: optional path that receives a copy of the log without colors
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repo_harvester={level}")));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

// Narrows the listing down to what the user wants processed
//
// Returns: None when the user declined the confirmation
fn select_repositories(
    config: &HarvestConfig,
    is_analyze: bool,
    mut repos: Vec<RepositoryRef>,
) -> Result<Option<Vec<RepositoryRef>>> {
    let limit = match config.limit {
        Some(limit) => Some(limit),
        None if is_analyze && !config.assume_yes => {
            prompt::ask_count(repos.len()).context("Failed to read the repository count")?
        }
        None => None,
    };
    if let Some(limit) = limit {
        repos.truncate(limit);
    }

    if !config.assume_yes {
        let question = format!("Process all {} repositories?", repos.len());
        if !prompt::confirm(&question).context("Failed to read the confirmation")? {
            return Ok(None);
        }
    }
    Ok(Some(repos))
}

// Handles the 'archive' subcommand
async fn handle_archive(
    client: &GitHubClient,
    config: &HarvestConfig,
    user: &str,
    repos: &[RepositoryRef],
) -> Result<i32> {
    let stats = harvest::archive_all(client, config, user, repos).await?;
    Ok(if stats.all_succeeded() { 0 } else { 1 })
}

// Handles the 'analyze' subcommand
//
// Parameters:
//   args:       analyze-only options (file budget, top N)
//   llm_config: validated completion endpoint settings
async fn handle_analyze(
    client: &GitHubClient,
    config: &HarvestConfig,
    args: &AnalyzeArgs,
    llm_config: LlmConfig,
    user: &str,
    repos: &[RepositoryRef],
) -> Result<i32> {
    let analyzer = Analyzer::new(
        CompletionClient::new(llm_config).context("Failed to build the completion client")?,
    );
    let policy = WalkPolicy::sampling().with_file_budget(args.file_budget);

    let output =
        harvest::analyze_all(client, &analyzer, config, &policy, args.top, user, repos).await?;

    info!("Summary written to {}", output.summary_json.display());
    info!("Markdown summary written to {}", output.summary_markdown.display());
    Ok(if output.stats.all_succeeded() { 0 } else { 1 })
}
