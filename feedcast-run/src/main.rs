//! feedcast-run - announce new blog articles on Twitter
//!
//! Performs exactly one run and exits. Schedule it with cron, a systemd timer
//! or a function runtime's periodic trigger.

use anyhow::{Context, Result};
use clap::Parser;
use libfeedcast::{logging, Config, DeploymentMode, FeedcastError, PublishReport, Sentinel};
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "feedcast-run")]
#[command(version)]
#[command(about = "Announce new blog articles on Twitter")]
#[command(long_about = "\
feedcast-run - Announce new blog articles on Twitter

DESCRIPTION:
    Fetches the blog's Atom feed and the account's recent timeline, keeps
    articles published inside the recency window (20 minutes by default),
    drops those whose link already appears on the timeline and posts the
    rest as \"<title> <link>?spref=tw\", oldest first.

    Each invocation is a single run. There is no daemon mode.

ENVIRONMENT:
    ENVIRONMENT            local (default) or lambda
                             local:  credentials read from credentials.json
                             lambda: credentials fetched from object storage
    FEEDCAST_CONFIG        Path to config.toml
                           (default: ~/.config/feedcast/config.toml)
    FEEDCAST_LOG_FORMAT    text (default), json or pretty
    FEEDCAST_LOG_LEVEL     error, warn, info (default), debug or trace
    RUST_LOG               Overrides FEEDCAST_LOG_LEVEL when set

CREDENTIALS:
    A JSON object with the keys ACCESS_TOKEN, ACCESS_SECRET, CONSUMER_KEY
    and CONSUMER_SECRET.

EXIT CODES:
    0 - Run completed, every article posted or skipped
    1 - Runtime error (feed, timeline, parse or posting failure)
    2 - Configuration, credential or authentication error
")]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _cli = Cli::parse();

    logging::init_default();

    match run().await {
        Ok(report) if report.is_clean() => {}
        Ok(report) => {
            warn!("{} article(s) could not be posted", report.failed);
            std::process::exit(1);
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// Exit status for a failed run: the library's code, or 1 for anything else
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<FeedcastError>()
        .map(FeedcastError::exit_code)
        .unwrap_or(1)
}

async fn run() -> Result<PublishReport> {
    let config = Config::load().context("Failed to load configuration")?;
    let mode = DeploymentMode::from_env()?;
    info!("Starting run in {} mode", mode);

    let sentinel = Sentinel::from_config(config, mode)
        .await
        .context("Failed to initialize")?;
    let report = sentinel
        .handle_event(&json!({}), &json!({}))
        .await
        .context("Run failed")?;

    info!(
        "Run complete: {} posted, {} skipped, {} failed",
        report.posted, report.skipped, report.failed
    );
    Ok(report)
}
