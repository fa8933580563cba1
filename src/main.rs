//! xhs-harvest main entry point
//!
//! This is the command-line interface for the xhs-harvest comment and search
//! harvester. Every command prints its result as JSON on stdout; logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xhs_harvest::config::{load_config_with_hash, Config};
use xhs_harvest::crawler::{CommentRequest, Coordinator, SearchRequest};
use xhs_harvest::output::{default_export_path, export_rows};
use xhs_harvest::signer::CommandSigner;
use xhs_harvest::url::describe_url;

/// xhs-harvest: a paced comment and search harvester
///
/// Walks note comment threads and keyword search results through the
/// platform's signed web API, one request at a time, and flattens them into
/// records and spreadsheet exports.
#[derive(Parser, Debug)]
#[command(name = "xhs-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paced comment and search harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Cookie string of the logged-in web session
    #[arg(long, env = "XHS_COOKIES", global = true, hide_env_values = true)]
    cookies: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the comments of one note
    Comments {
        /// Note link (explore or discovery share link)
        url: String,

        /// Resume from this comment cursor
        #[arg(long)]
        cursor: Option<String>,

        /// Stop after this many comments
        #[arg(long)]
        max: Option<usize>,
    },

    /// Search notes by keyword
    Search {
        keyword: String,

        /// Number of results (1-100)
        #[arg(short, long, default_value_t = 20)]
        num: usize,
    },

    /// Collect comments across the search results for a keyword
    SearchComments {
        keyword: String,

        /// Total number of comments to collect
        #[arg(short, long, default_value_t = 20)]
        num: usize,
    },

    /// Fetch note metadata
    Note { url: String },

    /// Fetch a note with all its comments as merged export rows
    Collect {
        url: String,

        /// Job tag written to every row
        #[arg(long, default_value = "")]
        keyword: String,

        /// Customer identifier written to every row
        #[arg(long, default_value = "")]
        customer: String,

        /// Also write the rows to a CSV file in the export directory
        #[arg(long)]
        export: bool,
    },

    /// Reply to a comment
    Reply {
        /// Note id or note link
        note: String,
        comment_id: String,
        content: String,
    },

    /// Run a JSON file of comment requests
    BatchComments { file: PathBuf },

    /// Run a JSON file of search requests
    BatchSearch { file: PathBuf },

    /// Convert a share link to its canonical form
    ConvertUrl { url: String },

    /// Check whether the cookie string still works
    CheckCookies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match &cli.command {
        Command::ConvertUrl { url } => {
            let conversion = describe_url(url).context("Failed to convert URL")?;
            print_json(&conversion)
        }
        command => {
            let signer = Arc::new(CommandSigner::new(&config.signer));
            let export_dir = config.output.export_dir.clone();
            let coordinator = Coordinator::new(config, signer)?;
            run(&coordinator, &cli, command, &export_dir).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("xhs_harvest=info,warn"),
            1 => EnvFilter::new("xhs_harvest=debug,info"),
            2 => EnvFilter::new("xhs_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn cookies(cli: &Cli) -> Result<&str> {
    cli.cookies
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .context("No cookies given: pass --cookies or set XHS_COOKIES")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_requests<T: serde::de::DeserializeOwned>(file: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid batch file {}", file.display()))
}

/// Runs one network command
async fn run(
    coordinator: &Coordinator,
    cli: &Cli,
    command: &Command,
    export_dir: &str,
) -> Result<()> {
    match command {
        Command::Comments { url, cursor, max } => {
            let comments = coordinator
                .fetch_comments(cookies(cli)?, url, cursor.as_deref(), *max)
                .await?;
            tracing::info!("Fetched {} comments", comments.len());
            print_json(&comments)
        }
        Command::Search { keyword, num } => {
            let notes = coordinator
                .search_notes(cookies(cli)?, keyword, *num)
                .await?;
            print_json(&notes)
        }
        Command::SearchComments { keyword, num } => {
            let comments = coordinator
                .search_comments(cookies(cli)?, keyword, *num)
                .await?;
            print_json(&comments)
        }
        Command::Note { url } => {
            let detail = coordinator.note_detail(cookies(cli)?, url).await?;
            print_json(&detail)
        }
        Command::Collect {
            url,
            keyword,
            customer,
            export,
        } => {
            let rows = coordinator
                .collect_note_rows(cookies(cli)?, url, keyword, customer)
                .await?;
            if *export {
                let path = export_rows(&rows, &default_export_path(export_dir))?;
                eprintln!("Exported {} rows to {}", rows.len(), path.display());
            }
            print_json(&rows)
        }
        Command::Reply {
            note,
            comment_id,
            content,
        } => {
            let data = coordinator
                .reply_comment(cookies(cli)?, note, comment_id, content)
                .await?;
            print_json(&data)
        }
        Command::BatchComments { file } => {
            let requests: Vec<CommentRequest> = read_requests(file)?;
            let results = coordinator.process_batch_comments(requests).await;
            print_json(&results)
        }
        Command::BatchSearch { file } => {
            let requests: Vec<SearchRequest> = read_requests(file)?;
            let results = coordinator.process_batch_search(requests).await;
            print_json(&results)
        }
        Command::CheckCookies => {
            let valid = coordinator.validate_cookies(cookies(cli)?).await;
            print_json(&serde_json::json!({ "valid": valid }))
        }
        Command::ConvertUrl { url } => print_json(&describe_url(url)?),
    }
}
