use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use time::format_description::well_known::Rfc3339;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

use spindle_core::persist::{save_snapshot, ArtifactPaths};
use spindle_crawler::{Crawler, CrawlerConfig};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Politely crawl the web from a seed list, dumping page text and the link graph")]
struct Cli {
    /// Path to a file with seed URLs (one per line)
    #[arg(long)]
    seeds: String,
    /// Directory the crawl artifacts are dumped into
    #[arg(long, default_value = "./artifacts")]
    output: String,
    /// Number of crawl workers
    #[arg(long, default_value_t = 100)]
    threads: usize,
    /// Number of front queues
    #[arg(long, default_value_t = 1)]
    front_queues: usize,
    /// Minimum delay between fetches against the same host, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// User-Agent string to use for robots.txt and crawling
    #[arg(long, default_value = "spindlebot/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// Stop and dump once this many pages have contents
    #[arg(long, default_value_t = 10_000)]
    dump_threshold: usize,
    /// Seconds between progress reports
    #[arg(long, default_value_t = 5)]
    log_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let config = CrawlerConfig {
        user_agent: args.user_agent.clone(),
        threads: args.threads,
        num_front_queues: args.front_queues,
        delay_ms: args.delay_ms,
        timeout_secs: args.timeout_secs,
    };
    let crawler = Arc::new(Crawler::new(config)?);

    let mut num_seeds = 0usize;
    for line in BufReader::new(File::open(&args.seeds)?).lines() {
        let line = line?;
        let seed = line.trim();
        if seed.is_empty() || seed.starts_with('#') {
            continue;
        }
        crawler.queue_raw_url(seed).await;
        num_seeds += 1;
    }
    if num_seeds == 0 {
        return Err(anyhow!("no valid seeds"));
    }
    tracing::info!(
        num_seeds,
        threads = args.threads,
        dump_threshold = args.dump_threshold,
        "starting crawl"
    );

    Arc::clone(&crawler).start_crawlers();

    loop {
        sleep(Duration::from_secs(args.log_interval_secs)).await;
        let stats = crawler.stats();
        tracing::info!(
            seen = stats.seen,
            hosts_waiting = stats.hosts_waiting,
            back_queues = stats.back_queues,
            requests = stats.requests,
            contents = stats.contents,
            references = stats.references,
            "crawl progress"
        );
        if stats.contents >= args.dump_threshold {
            break;
        }
    }

    crawler.stop_crawlers();

    let snapshot = crawler.snapshot();
    let paths = ArtifactPaths::new(&args.output);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    save_snapshot(&paths, &snapshot, &created_at)?;
    tracing::info!(
        output = %args.output,
        contents = snapshot.contents.len(),
        references = snapshot.references.len(),
        "crawl artifacts dumped"
    );
    Ok(())
}
