//! redd-fetch - Print the newest posts of a subreddit

use std::str::FromStr;

use clap::Parser;
use libredditor::config::load_env_file;
use libredditor::logging::LoggingConfig;
use libredditor::types::DEFAULT_LIMIT;
use libredditor::{Config, Credentials, FetchRequest, Pipeline, Post, RedditorError, Result};
use serde_json::json;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "redd-fetch")]
#[command(version)]
#[command(about = "Fetch the newest posts of a subreddit, with optional AI enrichment", long_about = None)]
struct Cli {
    /// Subreddit to read (with or without the r/ prefix)
    #[arg(default_value = "politics")]
    subreddit: String,

    /// Number of posts to fetch (1-100)
    #[arg(short = 'n', long = "limit", default_value_t = DEFAULT_LIMIT)]
    limit: u32,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Skip enrichment even if COHERE_API_KEY is set
    #[arg(long)]
    no_enrich: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = RedditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(RedditorError::InvalidInput(format!(
                "Invalid format '{}'. Valid options: text, json",
                s
            ))),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Reject bad arguments before touching config, logging or the network
    let format: OutputFormat = cli.format.parse()?;
    let request = FetchRequest::new(&cli.subreddit, cli.limit)?;

    // A project .env may supply credentials and REDDITOR_CONFIG
    let env_file = load_env_file()?;

    let mut config = Config::load()?;
    if cli.no_enrich {
        config.enrichment.enabled = false;
    }

    let _guard = LoggingConfig::from_config(&config.logging, cli.verbose)?.init();
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    let credentials = Credentials::from_env()?;
    let pipeline = Pipeline::from_config(&config, &credentials)?;

    info!(
        "Fetching {} post(s) from r/{} (enrichment: {})",
        request.limit(),
        request.channel(),
        pipeline.enricher_name()
    );

    let posts = pipeline.run(&credentials, &request).await?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&posts)),
        OutputFormat::Json => println!("{}", format_json(&posts)),
    }

    Ok(())
}

fn format_text(posts: &[Post]) -> String {
    let mut out = String::new();
    for (i, post) in posts.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, post.title()));
        out.push_str(&format!("   by u/{} | {} points\n", post.author(), post.score()));
        if let Some(text) = post.enrichment() {
            out.push_str(&format!("   {}\n", text));
        }
        out.push('\n');
    }
    out
}

fn format_json(posts: &[Post]) -> String {
    let items: Vec<_> = posts
        .iter()
        .map(|post| {
            json!({
                "title": post.title(),
                "author": post.author(),
                "score": post.score(),
                "enrichment": post.enrichment(),
            })
        })
        .collect();

    format!("{:#}", serde_json::Value::Array(items))
}
