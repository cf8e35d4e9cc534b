//! `scrollback`: page through a synthetic feed with the real loader.
//!
//! Usage:
//!   # Cold refresh, two appends, then refresh around item 2900
//!   cargo run -p scrollback-cli -- refresh append append refresh@2900 window@2900
//!
//!   # New posts arrive at the head
//!   cargo run -p scrollback-cli -- refresh publish@5 prepend window
//!
//!   # More detail
//!   RUST_LOG=scrollback_core=trace cargo run -p scrollback-cli -- refresh append

mod config;
mod script;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use scrollback_core::constants::DEFAULT_SERVICE_NAME;
use scrollback_core::synthetic::SyntheticTimeline;
use scrollback_core::{LoadRequest, Loader, SharedPageCache, TimelineWindowSource};
use tracing::{info, warn};

use crate::config::{CliConfig, load_config};
use crate::script::Step;

/// Drive the scrollback loader against an in-memory feed.
#[derive(Parser, Debug)]
#[command(name = "scrollback")]
#[command(about = "Run scripted loads against a synthetic cursor-paginated feed")]
struct Args {
    /// Config file (default: ~/.config/scrollback/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Items in the synthetic feed
    #[arg(long)]
    items: Option<usize>,

    /// How far inside each batch the feed's cursors point
    #[arg(long)]
    overlap: Option<usize>,

    /// Simulated latency per fetch
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Items requested per fetch
    #[arg(long)]
    page_size: Option<usize>,

    /// Panic on cache/anchor inconsistencies
    #[arg(long)]
    verify: bool,

    /// Steps to run: refresh, refresh@<id>, append, prepend, window[@<id>], publish@<n>
    #[arg(default_values_t = [
        Step::Load(LoadRequest::Refresh { anchor: None }),
        Step::Load(LoadRequest::Append),
        Step::Window(None),
    ])]
    steps: Vec<Step>,
}

impl Args {
    /// Flags win over the config file.
    fn apply(&self, config: &mut CliConfig) {
        if let Some(items) = self.items {
            config.feed.items = items;
        }
        if let Some(overlap) = self.overlap {
            config.feed.overlap = overlap;
        }
        if let Some(latency) = self.latency_ms {
            config.feed.latency_ms = latency;
        }
        if let Some(size) = self.page_size {
            config.loader.initial_load_size = size;
        }
        if self.verify {
            config.loader.verify = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _tracing = scrollback_telemetry::init_tracing(DEFAULT_SERVICE_NAME);

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let mut feed = SyntheticTimeline::new(config.feed.items).with_overlap(config.feed.overlap);
    if config.feed.latency_ms > 0 {
        feed = feed.with_latency(Duration::from_millis(config.feed.latency_ms));
    }
    let feed = Arc::new(feed);
    info!(
        items = config.feed.items,
        overlap = config.feed.overlap,
        page_size = config.loader.initial_load_size,
        "starting"
    );

    let cache = SharedPageCache::new();
    let windows = Arc::new(TimelineWindowSource::new(cache.clone()));
    let loader = Loader::new(Arc::clone(&feed), cache, windows.clone(), config.loader)?;

    for step in &args.steps {
        match step {
            Step::Load(request) => run_load(&loader, step, request.clone()).await?,
            Step::Window(key) => match windows.load_window(key.as_ref()) {
                Some(window) => println!(
                    "{step}: {} items [{}..{}] prev={:?} next={:?} gen={}",
                    window.page.len(),
                    window.page.newest_id().map(|id| id.as_str()).unwrap_or("-"),
                    window.page.key().map(|id| id.as_str()).unwrap_or("-"),
                    window.prev_key,
                    window.next_key,
                    window.generation,
                ),
                None => println!("{step}: cache is empty"),
            },
            Step::Publish(count) => {
                feed.publish(*count);
                println!("{step}: feed now has {} items", feed.len());
            }
        }
    }

    println!("{} fetches", feed.call_count());
    Ok(())
}

/// Run one load, recovering from anchor desync with a cold refresh.
async fn run_load(
    loader: &Loader<SyntheticTimeline>,
    step: &Step,
    request: LoadRequest,
) -> Result<()> {
    match loader.load(request).await {
        Ok(outcome) => {
            let end = if outcome.end_of_pagination_reached {
                " (end of pagination)"
            } else {
                ""
            };
            println!("{step}: ok{end}");
        }
        Err(e) if e.is_fatal() => {
            warn!("{step}: {e}, falling back to a cold refresh");
            println!("{step}: {e}");
            loader.load(LoadRequest::Refresh { anchor: None }).await?;
        }
        Err(e) => println!("{step}: {e}"),
    }
    print_cache(loader);
    Ok(())
}

fn print_cache(loader: &Loader<SyntheticTimeline>) {
    loader.cache().read(|cache| {
        for (key, page) in cache.iter().rev() {
            println!(
                "    [{}..{key}] {} items",
                page.newest_id().map(|id| id.as_str()).unwrap_or("-"),
                page.len()
            );
        }
    });
}
