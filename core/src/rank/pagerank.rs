use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_ALPHA: f64 = 0.15;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

const RELATIVE_TOLERANCE: f64 = 1e-5;
const ABSOLUTE_TOLERANCE: f64 = 1e-8;

/// Damped random walk over the crawl's link graph. The analyzed set is the
/// graph's source URLs; references pointing outside it are ignored.
pub struct PageRank<'a> {
    references: &'a HashMap<String, HashSet<String>>,
}

impl<'a> PageRank<'a> {
    pub fn new(references: &'a HashMap<String, HashSet<String>>) -> Self {
        Self { references }
    }

    /// URLs with their stationary probabilities, highest first.
    pub fn rank(&self, alpha: f64, max_iterations: usize) -> Vec<(String, f64)> {
        if self.references.is_empty() {
            return Vec::new();
        }
        let mut urls: Vec<&String> = self.references.keys().collect();
        urls.sort();
        let n = urls.len();
        let index: HashMap<&str, usize> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| (url.as_str(), i))
            .collect();

        // Row-stochastic transitions with the uniform teleport blended in:
        // P = (1-α)·M + α·T.
        let teleport = alpha / n as f64;
        let mut matrix = vec![teleport; n * n];
        for (row, url) in urls.iter().enumerate() {
            let targets: Vec<usize> = self.references[*url]
                .iter()
                .filter_map(|target| index.get(target.as_str()).copied())
                .collect();
            if targets.is_empty() {
                // Dangling page: uniform over the whole set.
                let p = (1.0 - alpha) / n as f64;
                for col in 0..n {
                    matrix[row * n + col] += p;
                }
            } else {
                let p = (1.0 - alpha) / targets.len() as f64;
                for col in targets {
                    matrix[row * n + col] += p;
                }
            }
        }

        let mut state = vec![1.0 / n as f64; n];
        for iteration in 0..max_iterations {
            let mut next = vec![0.0; n];
            for row in 0..n {
                let p = state[row];
                for col in 0..n {
                    next[col] += p * matrix[row * n + col];
                }
            }
            let converged = all_close(&next, &state);
            state = next;
            if converged {
                tracing::debug!(iteration, "pagerank converged");
                break;
            }
        }

        let mut ranked: Vec<(String, f64)> = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| (url.clone(), state[i]))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }
}

fn all_close(a: &[f64], b: &[f64]) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> HashMap<String, HashSet<String>> {
        edges
            .iter()
            .map(|(from, to)| {
                (
                    from.to_string(),
                    to.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn triangle_is_uniform() {
        let references = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let ranked = PageRank::new(&references).rank(DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS);
        assert_eq!(ranked.len(), 3);
        for (_, score) in &ranked {
            assert!((score - 1.0 / 3.0).abs() < 1e-6);
        }
        let total: f64 = ranked.iter().map(|(_, score)| score).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn dangling_pages_spread_uniformly() {
        let references = graph(&[("a", &["b"]), ("b", &[])]);
        let ranked = PageRank::new(&references).rank(DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS);
        let total: f64 = ranked.iter().map(|(_, score)| score).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // b receives a's full outbound mass and must outrank it
        assert_eq!(ranked[0].0, "b");
    }

    #[test]
    fn references_outside_the_set_are_ignored() {
        let references = graph(&[("a", &["http://elsewhere.test"])]);
        let ranked = PageRank::new(&references).rank(DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_graph_ranks_nothing() {
        let references = HashMap::new();
        assert!(PageRank::new(&references)
            .rank(DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS)
            .is_empty());
    }
}
