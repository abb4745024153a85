//! # VdP Index
//!
//! Builds a static JSON index of the Venganzas del Pasado radio archive,
//! optionally with per-episode transcripts, for a static front-end.
//!
//! ## Usage
//!
//! ```sh
//! vdp_index scrape --out site/data --years 2025,2024-2020 --with-transcripts
//! vdp_index split --src site/data/transcripts.json --dest site/transcripts
//! ```
//!
//! ## Architecture
//!
//! The scrape follows a strictly sequential pipeline:
//! 1. **Planning**: list years, then month pages per year
//! 2. **Listing**: parse each month page into episode records
//! 3. **Merging**: fold records into the previously saved index by id
//! 4. **Transcripts**: fetch missing transcripts for flagged episodes
//! 5. **Output**: rewrite `index.json` / `transcripts.json` once, at the end

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod fetch;
mod merge;
mod models;
mod outputs;
mod pipeline;
mod progress;
mod scrapers;
mod utils;

use cli::{Cli, Command, ScrapeArgs, SplitArgs};
use fetch::{HttpFetcher, RetryFetch};
use outputs::{INDEX_FILE, TRANSCRIPTS_FILE, json, split};
use pipeline::ScrapeOptions;
use progress::{BarProgress, NullProgress};
use utils::ensure_writable_dir;

/// Total attempts per request before a run is aborted.
const FETCH_ATTEMPTS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let result = match args.command {
        Command::Scrape(scrape) => run_scrape(scrape).await,
        Command::Split(split_args) => run_split(split_args).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

#[instrument(level = "info", skip_all, fields(out = %args.out.display()))]
async fn run_scrape(args: ScrapeArgs) -> Result<(), Box<dyn Error>> {
    // Early check: fail before any network traffic if we can't write results
    if let Err(e) = ensure_writable_dir(&args.out).await {
        error!(error = %e, "Output directory is not writable (fix perms or choose a different path)");
        return Err(e);
    }

    let delay = Duration::try_from_secs_f64(args.delay)
        .map_err(|e| format!("invalid --delay {}: {e}", args.delay))?;
    let options = ScrapeOptions {
        years: args.years.map(|selection| selection.0),
        with_transcripts: args.with_transcripts,
        delay,
        max_months: args.max_months,
    };

    let index_path = args.out.join(INDEX_FILE);
    let transcripts_path = args.out.join(TRANSCRIPTS_FILE);

    let existing = json::load_index(&index_path).await?;
    info!(posts = existing.posts.len(), "Loaded existing index");
    let transcripts = if options.with_transcripts {
        let store = json::load_transcripts(&transcripts_path).await?;
        info!(transcripts = store.len(), "Loaded existing transcripts");
        store
    } else {
        Default::default()
    };

    let fetcher = RetryFetch::new(HttpFetcher::new()?, FETCH_ATTEMPTS);
    let outcome = if args.no_progress {
        pipeline::run(&fetcher, &NullProgress, &options, existing, transcripts).await?
    } else {
        let progress = BarProgress::new(options.with_transcripts);
        pipeline::run(&fetcher, &progress, &options, existing, transcripts).await?
    };

    json::save_json(&index_path, &outcome.index).await?;
    if options.with_transcripts {
        json::save_json(&transcripts_path, &outcome.transcripts).await?;
    }
    info!(
        new_posts = outcome.stats.new_posts,
        total = outcome.index.posts.len(),
        transcripts_fetched = outcome.stats.transcripts_fetched,
        "Artifacts written"
    );
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_split(args: SplitArgs) -> Result<(), Box<dyn Error>> {
    let count = split::split_transcripts(&args.src, &args.dest).await?;
    info!(count, dest = %args.dest.display(), "Transcript scripts generated");
    Ok(())
}
