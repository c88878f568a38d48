use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Client;

pub const ANY_USER_AGENT: &str = "*";

/// Parsed robots exclusion record: per-agent disallowed path prefixes.
/// Only `User-Agent:` and `Disallow:` lines are consumed.
#[derive(Debug, Default)]
pub struct RobotsPolicy {
    disallowed: HashMap<String, HashSet<String>>,
}

impl RobotsPolicy {
    /// Permissive policy used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut policy = Self::default();
        let mut current_agent: Option<String> = None;
        for line in text.lines() {
            let line = line.trim();
            if let Some(agent) = directive_value(line, &["User-Agent:", "User-agent:"]) {
                policy.disallowed.entry(agent.to_string()).or_default();
                current_agent = Some(agent.to_string());
            } else if let Some(path) = directive_value(line, &["Disallow:"]) {
                if let Some(agent) = &current_agent {
                    policy
                        .disallowed
                        .get_mut(agent)
                        .expect("current agent has an entry")
                        .insert(path.to_string());
                }
            }
        }
        policy
    }

    /// Whether `user_agent` may fetch `path`: forbidden iff any non-empty
    /// disallowed prefix for the agent matches. Agents without an entry
    /// fall back to the `*` record.
    pub fn can_access(&self, path: &str, user_agent: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };
        match self.disallowed.get(user_agent) {
            Some(prefixes) => !prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str())),
            None if user_agent != ANY_USER_AGENT => self.can_access(path, ANY_USER_AGENT),
            None => true,
        }
    }
}

fn directive_value<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .map(str::trim)
}

/// Lazily populated `host → RobotsPolicy` cache: one `/robots.txt` fetch
/// per host, shared by all workers.
pub struct RobotsCache {
    cache: RwLock<HashMap<String, Arc<RobotsPolicy>>>,
    client: Client,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            client,
        }
    }

    /// Seed a policy without fetching, e.g. for tests or allowlists.
    pub fn preload(&self, host: &str, policy: RobotsPolicy) {
        self.cache
            .write()
            .insert(host.to_string(), Arc::new(policy));
    }

    /// Cached policy for a host, fetching `/robots.txt` on the first miss.
    /// Unreachable or non-success robots files allow everything.
    pub async fn policy_for(&self, host: &str) -> Arc<RobotsPolicy> {
        if let Some(policy) = self.cache.read().get(host) {
            return Arc::clone(policy);
        }
        let url = format!("http://{host}/robots.txt");
        let policy = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let text = response.text().await.unwrap_or_default();
                RobotsPolicy::parse(&text)
            }
            _ => RobotsPolicy::allow_all(),
        };
        let policy = Arc::new(policy);
        Arc::clone(
            self.cache
                .write()
                .entry(host.to_string())
                .or_insert(policy),
        )
    }
}
