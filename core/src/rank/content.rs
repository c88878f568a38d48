use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::index::InvertedIndex;
use crate::query::SearchQuery;
use crate::DocId;

/// Knobs for the content ranker.
pub struct RankOptions<'a> {
    /// Prune candidates with per-term champion lists when the index has
    /// recomputed them.
    pub use_champions: bool,
    /// Per-URL auxiliary scores (PageRank probabilities) blended into the
    /// cosine score.
    pub auxiliary: Option<&'a HashMap<String, f64>>,
    /// Weight of the auxiliary signal in the blend.
    pub auxiliary_weight: f64,
}

impl Default for RankOptions<'_> {
    fn default() -> Self {
        Self {
            use_champions: true,
            auxiliary: None,
            auxiliary_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedDocument {
    pub doc: DocId,
    pub url: String,
    pub score: f64,
}

/// Cosine-style content ranking over the documents a query matched.
/// Scores sum `tf · smoothed-idf` over the search terms, normalized by
/// document length; equal scores keep doc-id order.
pub struct ContentRanker {
    ranked: Vec<RankedDocument>,
}

impl ContentRanker {
    pub fn new(query: &dyn SearchQuery, index: &InvertedIndex, options: &RankOptions) -> Self {
        let mut candidates: Vec<DocId> = if options.use_champions && index.has_champions() {
            let mut set = HashSet::new();
            for term in query.search_terms() {
                if let Some(champions) = index.champions(term) {
                    set.extend(champions.iter().copied());
                }
            }
            set.into_iter().collect()
        } else {
            query.matches().iter().copied().collect()
        };
        candidates.sort_unstable();

        let mut ranked: Vec<RankedDocument> = candidates
            .into_iter()
            .filter_map(|doc| {
                let url = index.url(doc)?.to_string();
                let mut score = 0.0;
                for term in query.search_terms() {
                    score += index.tf(term, doc) as f64 * index.smoothed_idf(term);
                }
                score /= index.length(doc).max(1) as f64;
                Some(RankedDocument { doc, url, score })
            })
            .collect();

        if let Some(auxiliary) = options.auxiliary {
            blend(&mut ranked, auxiliary, options.auxiliary_weight);
        }

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Self { ranked }
    }

    pub fn top(&self, n: usize) -> &[RankedDocument] {
        &self.ranked[..self.ranked.len().min(n)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedDocument> {
        self.ranked.iter()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Convex combination of the cosine score and the auxiliary signal, each
/// min-max normalized over the candidate set so the scales are comparable.
fn blend(ranked: &mut [RankedDocument], auxiliary: &HashMap<String, f64>, weight: f64) {
    if ranked.is_empty() {
        return;
    }
    let content: Vec<f64> = normalize(&ranked.iter().map(|r| r.score).collect::<Vec<_>>());
    let aux: Vec<f64> = normalize(
        &ranked
            .iter()
            .map(|r| auxiliary.get(&r.url).copied().unwrap_or(0.0))
            .collect::<Vec<_>>(),
    );
    for (i, doc) in ranked.iter_mut().enumerate() {
        doc.score = (1.0 - weight) * content[i] + weight * aux[i];
    }
}

fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > min {
        values.iter().map(|v| (v - min) / (max - min)).collect()
    } else {
        vec![0.0; values.len()]
    }
}
