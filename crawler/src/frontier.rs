use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;

use crate::heap::BackHeap;
use crate::normalize::host_of;

/// Per-host FIFO of URLs awaiting fetch. Queue objects are shared between
/// the frontier map and the worker currently draining them.
pub type BackQueue = Arc<Mutex<VecDeque<String>>>;

/// Two-tier crawl frontier: front queues hold admitted URLs awaiting a
/// back queue, a bounded set of per-host back queues feeds workers, and
/// the back heap decides when each host is next due.
pub struct Frontier {
    seen: Mutex<HashSet<String>>,
    front: Vec<Mutex<VecDeque<String>>>,
    inner: Mutex<FrontierInner>,
    heap: BackHeap,
    max_back_queues: usize,
}

struct FrontierInner {
    host_queue: HashMap<String, BackQueue>,
    num_back_queues: usize,
}

impl Frontier {
    pub fn new(num_front_queues: usize, max_back_queues: usize, delay_ms: u64) -> Self {
        let front = (0..num_front_queues.max(1))
            .map(|_| Mutex::new(VecDeque::new()))
            .collect();
        Self {
            seen: Mutex::new(HashSet::new()),
            front,
            inner: Mutex::new(FrontierInner {
                host_queue: HashMap::new(),
                num_back_queues: 0,
            }),
            heap: BackHeap::new(delay_ms),
            max_back_queues,
        }
    }

    pub fn heap(&self) -> &BackHeap {
        &self.heap
    }

    /// Check-and-insert into the seen set; true when the URL is new.
    pub fn mark_seen(&self, url: &str) -> bool {
        self.seen.lock().insert(url.to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Enqueue into a front queue chosen uniformly at random.
    pub fn add_to_front(&self, url: String) {
        let slot = rand::thread_rng().gen_range(0..self.front.len());
        self.front[slot].lock().push_back(url);
    }

    /// Non-blocking pull from a random front queue.
    pub fn pick_from_front(&self) -> Option<String> {
        let slot = rand::thread_rng().gen_range(0..self.front.len());
        self.front[slot].lock().pop_front()
    }

    /// Place an admitted URL. Hosts that never hit the heap get a fresh
    /// back queue while the bounded set has room; everything else waits in
    /// the front queues until a drained queue is recycled.
    pub fn place(&self, url: String, host: &str) {
        let mut inner = self.inner.lock();
        if inner.num_back_queues < self.max_back_queues && !self.heap.in_history(host) {
            let queue: BackQueue = Arc::new(Mutex::new(VecDeque::from([url])));
            inner.host_queue.insert(host.to_string(), queue);
            inner.num_back_queues += 1;
            // first fetch still respects politeness
            self.heap.push_host(host, true);
        } else {
            drop(inner);
            self.add_to_front(url);
        }
    }

    pub fn queue_for(&self, host: &str) -> Option<BackQueue> {
        self.inner.lock().host_queue.get(host).cloned()
    }

    /// Refill a drained back queue from the front queues. Pulled URLs whose
    /// host already owns a queue are routed there; the first URL from an
    /// unowned host takes over this queue, and that host is returned for
    /// the caller's subsequent heap push.
    pub fn refill(&self, queue: &BackQueue, host: String) -> String {
        let mut host = host;
        while queue.lock().is_empty() {
            let Some(url) = self.pick_from_front() else {
                break;
            };
            let Some(new_host) = host_of(&url) else {
                continue;
            };
            let mut inner = self.inner.lock();
            match inner.host_queue.get(&new_host) {
                Some(existing) => existing.lock().push_back(url),
                None => {
                    host = new_host.clone();
                    inner.host_queue.insert(new_host, queue.clone());
                    queue.lock().push_back(url);
                }
            }
        }
        host
    }

    pub fn back_queue_count(&self) -> usize {
        self.inner.lock().num_back_queues
    }

    pub fn front_len(&self) -> usize {
        self.front.iter().map(|queue| queue.lock().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_set_grows_monotonically() {
        let frontier = Frontier::new(1, 4, 0);
        assert!(frontier.mark_seen("http://a.test/x"));
        assert!(!frontier.mark_seen("http://a.test/x"));
        assert_eq!(frontier.seen_count(), 1);
    }

    #[test]
    fn new_host_gets_a_back_queue() {
        let frontier = Frontier::new(1, 4, 0);
        frontier.place("http://a.test/x".to_string(), "a.test");
        assert_eq!(frontier.back_queue_count(), 1);
        assert!(frontier.heap().contains("a.test"));
        let queue = frontier.queue_for("a.test").expect("queue was created");
        assert_eq!(queue.lock().front().map(String::as_str), Some("http://a.test/x"));
    }

    #[test]
    fn urls_beyond_the_queue_cap_wait_in_front() {
        let frontier = Frontier::new(1, 1, 0);
        frontier.place("http://a.test/x".to_string(), "a.test");
        frontier.place("http://b.test/x".to_string(), "b.test");
        assert_eq!(frontier.back_queue_count(), 1);
        assert_eq!(frontier.front_len(), 1);
        assert!(frontier.queue_for("b.test").is_none());
    }

    #[test]
    fn hosts_already_in_history_go_to_front() {
        let frontier = Frontier::new(1, 4, 0);
        frontier.place("http://a.test/x".to_string(), "a.test");
        frontier.heap().pop_host();
        frontier.place("http://a.test/y".to_string(), "a.test");
        assert_eq!(frontier.back_queue_count(), 1);
        assert_eq!(frontier.front_len(), 1);
    }

    #[test]
    fn refill_reassigns_a_drained_queue() {
        let frontier = Frontier::new(1, 1, 0);
        frontier.place("http://a.test/x".to_string(), "a.test");
        frontier.add_to_front("http://b.test/x".to_string());

        let queue = frontier.queue_for("a.test").unwrap();
        queue.lock().pop_front();

        let host = frontier.refill(&queue, "a.test".to_string());
        assert_eq!(host, "b.test");
        assert!(Arc::ptr_eq(&queue, &frontier.queue_for("b.test").unwrap()));
        assert_eq!(queue.lock().front().map(String::as_str), Some("http://b.test/x"));
    }

    #[test]
    fn refill_routes_to_an_existing_owner() {
        let frontier = Frontier::new(1, 2, 0);
        frontier.place("http://a.test/x".to_string(), "a.test");
        frontier.place("http://b.test/x".to_string(), "b.test");
        frontier.add_to_front("http://b.test/y".to_string());

        let queue = frontier.queue_for("a.test").unwrap();
        queue.lock().pop_front();

        // b.test already owns a queue, so the drained queue keeps its host
        let host = frontier.refill(&queue, "a.test".to_string());
        assert_eq!(host, "a.test");
        assert!(queue.lock().is_empty());
        let b_queue = frontier.queue_for("b.test").unwrap();
        assert_eq!(b_queue.lock().len(), 2);
    }
}
