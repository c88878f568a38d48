use serde::Deserialize;

/// Runtime knobs for the crawler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User-Agent sent with every request and matched against robots rules.
    pub user_agent: String,
    /// Number of concurrent crawl workers.
    pub threads: usize,
    /// Number of front (admission) queues.
    pub num_front_queues: usize,
    /// Minimum wall time between two fetches against the same host.
    pub delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl CrawlerConfig {
    /// The back-queue set is capped at three queues per worker.
    pub fn num_back_queues(&self) -> usize {
        self.threads * 3
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: "spindlebot/0.1 (+https://example.com/bot)".to_string(),
            threads: 100,
            num_front_queues: 1,
            delay_ms: 1000,
            timeout_secs: 5,
        }
    }
}
