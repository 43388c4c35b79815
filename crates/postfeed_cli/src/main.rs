//! Terminal driver for the posts screen.
//!
//! # Responsibility
//! - Run the same mount/search/refresh flow the mobile host runs.
//! - Print the visible list so core behavior can be checked without a UI.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use postfeed_core::config::{parse_timeout_ms, TIMEOUT_MS_ENV};
use postfeed_core::{
    init_logging, HttpPostFetcher, PostScreen, PostfeedConfig, QueryStore, ScreenState,
    ScreenStatus, SqliteQueryStore, EMPTY_LIST_MESSAGE,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "postfeed", version, about = "Fetch, filter and search remote posts")]
struct Cli {
    /// Posts endpoint to GET.
    #[arg(long, env = "POSTFEED_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// SQLite file holding the last search text.
    #[arg(long, env = "POSTFEED_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "POSTFEED_TIMEOUT_MS", value_parser = parse_timeout_arg, global = true)]
    timeout_ms: Option<Duration>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the core library links.
    Ping,
    /// Load posts and show them filtered by the saved search text.
    Show {
        /// Run a manual refresh after the initial load.
        #[arg(long)]
        refresh: bool,
    },
    /// Type a new search text, save it, and show the matches.
    Search { query: String },
    /// Forget the saved search text.
    Forget,
}

fn parse_timeout_arg(raw: &str) -> Result<Duration, String> {
    parse_timeout_ms(TIMEOUT_MS_ENV, raw).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(&cli.log_level, log_dir).context("failed to start logging")?;
    }

    let config = resolve_config(&cli);

    match cli.command {
        Command::Ping => {
            println!("postfeed_core ping={}", postfeed_core::ping());
            println!("postfeed_core version={}", postfeed_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Forget => {
            SqliteQueryStore::new(&config.store_path)
                .clear()
                .context("failed to clear saved search")?;
            println!("Saved search cleared.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { refresh } => {
            let mut screen = open_screen(&config)?;
            screen.mount().await;
            if refresh && !screen.refresh().await {
                bail!("refresh was ignored");
            }
            let code = render(screen.state());
            screen.shutdown().await;
            Ok(code)
        }
        Command::Search { query } => {
            let mut screen = open_screen(&config)?;
            screen.mount().await;
            screen.set_query(query);
            let code = render(screen.state());
            screen.shutdown().await;
            Ok(code)
        }
    }
}

fn resolve_config(cli: &Cli) -> PostfeedConfig {
    let mut config = PostfeedConfig::default();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(db) = &cli.db {
        config.store_path = db.clone();
    }
    config.request_timeout = cli.timeout_ms;
    config
}

fn open_screen(
    config: &PostfeedConfig,
) -> Result<PostScreen<HttpPostFetcher, SqliteQueryStore>> {
    let fetcher = HttpPostFetcher::new(config.endpoint.clone(), config.request_timeout)
        .context("failed to build HTTP client")?;
    Ok(PostScreen::new(
        fetcher,
        SqliteQueryStore::new(&config.store_path),
    ))
}

fn render(state: &ScreenState) -> ExitCode {
    if !state.query().is_empty() {
        println!("search: {:?}", state.query());
    }

    if let Some(message) = state.error_message() {
        eprintln!("{message}");
        return ExitCode::FAILURE;
    }
    if state.is_empty() {
        println!("{EMPTY_LIST_MESSAGE}");
        return ExitCode::SUCCESS;
    }

    for post in state.filtered() {
        println!("#{} {}", post.id, post.title);
        for line in post.body.lines() {
            println!("    {line}");
        }
    }
    if state.status() == ScreenStatus::Ready {
        println!(
            "{} of {} posts shown",
            state.filtered().len(),
            state.posts().len()
        );
    }
    ExitCode::SUCCESS
}
