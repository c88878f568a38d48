use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::{Mutex, RwLock};
use reqwest::{header, Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tokio::time::sleep;
use url::Url;

use spindle_core::persist::CrawlSnapshot;

use crate::config::CrawlerConfig;
use crate::frontier::Frontier;
use crate::normalize::{has_forbidden_prefix, host_of, normalize};
use crate::robots::RobotsCache;

/// Observability counters reported by the monitor loop.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStats {
    pub seen: usize,
    pub hosts_waiting: usize,
    pub back_queues: usize,
    pub requests: u64,
    pub contents: usize,
    pub references: usize,
}

/// A page after fetching: its visible text and the normalized outgoing
/// links with their anchor text.
struct Page {
    text: String,
    links: Vec<(String, String)>,
}

/// The polite crawler: shared frontier state plus a pool of worker tasks.
/// Workers pop a ready host from the back heap, sleep out the politeness
/// wait, fetch one URL from the host's back queue, feed extracted links
/// back through admission, refill the queue and re-push the host.
pub struct Crawler {
    config: CrawlerConfig,
    client: Client,
    frontier: Frontier,
    robots: RobotsCache,
    contents: RwLock<HashMap<String, String>>,
    references: RwLock<HashMap<String, HashSet<String>>>,
    num_requests: AtomicU64,
    crawling: AtomicBool,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let frontier = Frontier::new(
            config.num_front_queues,
            config.num_back_queues(),
            config.delay_ms,
        );
        let robots = RobotsCache::new(client.clone());
        Ok(Self {
            config,
            client,
            frontier,
            robots,
            contents: RwLock::new(HashMap::new()),
            references: RwLock::new(HashMap::new()),
            num_requests: AtomicU64::new(0),
            crawling: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn robots(&self) -> &RobotsCache {
        &self.robots
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Admit a raw URL (seed or extracted link): guard illegal schemes,
    /// normalize, dedupe against the seen set, consult robots, then hand
    /// to the frontier for placement.
    pub async fn queue_raw_url(&self, raw: &str) {
        if has_forbidden_prefix(raw) {
            return;
        }
        let Some(url) = normalize(raw, None) else {
            return;
        };
        if !self.frontier.mark_seen(&url) {
            return;
        }
        let Some(host) = host_of(&url) else {
            return;
        };
        let path = Url::parse(&url)
            .map(|parsed| parsed.path().to_string())
            .unwrap_or_else(|_| "/".to_string());
        let policy = self.robots.policy_for(&host).await;
        if !policy.can_access(&path, &self.config.user_agent) {
            return;
        }
        self.frontier.place(url, &host);
    }

    /// Start the worker pool; returns immediately.
    pub fn start_crawlers(self: Arc<Self>) {
        self.crawling.store(true, Ordering::SeqCst);
        let mut workers = self.workers.lock();
        for _ in 0..self.config.threads {
            let crawler = Arc::clone(&self);
            let worker = tokio::spawn(crawler.worker_loop());
            // a panicking worker takes down only itself
            workers.push(tokio::spawn(async move {
                if let Err(error) = worker.await {
                    tracing::error!(%error, "crawl worker terminated");
                }
            }));
        }
    }

    /// Ask workers to stop; each finishes its current fetch first.
    pub fn stop_crawlers(&self) {
        self.crawling.store(false, Ordering::SeqCst);
    }

    async fn worker_loop(self: Arc<Self>) {
        while self.crawling.load(Ordering::SeqCst) {
            let Some((wait_ms, host)) = self.frontier.heap().pop_host() else {
                sleep(Duration::from_secs(1)).await;
                continue;
            };
            if wait_ms > 0 {
                sleep(Duration::from_millis(wait_ms)).await;
            }

            let Some(queue) = self.frontier.queue_for(&host) else {
                tracing::warn!(%host, "host has no back queue");
                self.frontier.heap().push_host(&host, true);
                continue;
            };

            let url = queue.lock().pop_front();
            if let Some(url) = url {
                if let Err(error) = self.fetch_url(&url).await {
                    tracing::warn!(%url, %error, "fetch failed");
                }
            }

            let host = self.frontier.refill(&queue, host);
            self.frontier.heap().push_host(&host, true);
        }
        tracing::debug!("crawl worker exiting");
    }

    /// Fetch one URL: record the redirect-final URL as seen, bail softly on
    /// non-200 or non-text responses, record the link graph and anchor
    /// text, admit extracted links, and append the page text.
    async fn fetch_url(&self, url: &str) -> Result<()> {
        self.num_requests.fetch_add(1, Ordering::Relaxed);

        let response = self.client.get(url).send().await.context("request failed")?;

        // Redirect targets count as crawled too.
        let final_url = normalize(response.url().as_str(), None)
            .unwrap_or_else(|| response.url().to_string());
        self.frontier.mark_seen(&final_url);

        if response.status() != StatusCode::OK {
            bail!("{url} returned {}", response.status());
        }
        let is_text = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("text"))
            .unwrap_or(false);
        if !is_text {
            return Ok(());
        }

        let body = response.text().await.context("body read failed")?;
        let page = extract_page(&body, &final_url);

        // Outgoing links become the page's references; links whose pages we
        // already hold pick up the anchor text.
        let mut references = HashSet::new();
        {
            let mut contents = self.contents.write();
            for (link, anchor) in &page.links {
                if let Some(existing) = contents.get_mut(link) {
                    append_contents(existing, anchor);
                }
                if link != &final_url {
                    references.insert(link.clone());
                }
            }
        }
        self.references.write().insert(final_url.clone(), references);

        for (link, _) in &page.links {
            self.queue_raw_url(link).await;
        }

        if !page.text.trim().is_empty() {
            let mut contents = self.contents.write();
            let entry = contents.entry(final_url).or_default();
            append_contents(entry, &page.text);
        }
        Ok(())
    }

    pub fn stats(&self) -> CrawlerStats {
        CrawlerStats {
            seen: self.frontier.seen_count(),
            hosts_waiting: self.frontier.heap().len(),
            back_queues: self.frontier.back_queue_count(),
            requests: self.num_requests.load(Ordering::Relaxed),
            contents: self.contents.read().len(),
            references: self.references.read().len(),
        }
    }

    /// Clone the dumpable state: page contents and the link graph.
    pub fn snapshot(&self) -> CrawlSnapshot {
        CrawlSnapshot {
            contents: self.contents.read().clone(),
            references: self.references.read().clone(),
        }
    }
}

fn append_contents(existing: &mut String, addition: &str) {
    let addition = addition.trim();
    if addition.is_empty() {
        return;
    }
    if !existing.is_empty() {
        existing.push(' ');
    }
    existing.push_str(addition);
}

/// Parse HTML and collect the normalized `<a href>` targets with their
/// anchor text, plus the page text with script and style subtrees skipped.
/// Synchronous so the non-Send DOM never crosses an await point.
fn extract_page(body: &str, base_url: &str) -> Page {
    let document = Html::parse_document(body);
    let anchor_selector = Selector::parse("a[href]").expect("valid selector");

    let mut links: HashMap<String, String> = HashMap::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if has_forbidden_prefix(href) {
            continue;
        }
        let Some(target) = normalize(href, Some(base_url)) else {
            continue;
        };
        let anchor_text = anchor.text().collect::<String>();
        append_contents(links.entry(target).or_default(), &anchor_text);
    }

    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    Page {
        text,
        links: links.into_iter().collect(),
    }
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            append_contents(out, text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !matches!(child_element.value().name(), "script" | "style") {
                collect_text(child_element, out);
            }
        }
    }
}
