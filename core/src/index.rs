use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::tokenizer::tokenize;
use crate::DocId;

/// Bijection between document URLs and their monotonically assigned ids,
/// with add-if-absent semantics.
#[derive(Debug, Default)]
pub struct UrlVocabulary {
    ids: HashMap<String, DocId>,
    urls: Vec<String>,
}

impl UrlVocabulary {
    pub fn add(&mut self, url: &str) -> DocId {
        if let Some(&id) = self.ids.get(url) {
            return id;
        }
        let id = self.urls.len() as DocId;
        self.urls.push(url.to_string());
        self.ids.insert(url.to_string(), id);
        id
    }

    pub fn url(&self, id: DocId) -> Option<&str> {
        self.urls.get(id as usize).map(String::as_str)
    }

    pub fn id(&self, url: &str) -> Option<DocId> {
        self.ids.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn doc_ids(&self) -> std::ops::Range<DocId> {
        0..self.urls.len() as DocId
    }
}

/// In-memory inverted index: term → (doc → term frequency) postings plus
/// per-document token counts and on-demand champion lists. Immutable once
/// indexing over the batched corpus completes.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    vocab: UrlVocabulary,
    postings: HashMap<String, BTreeMap<DocId, u32>>,
    lengths: Vec<u32>,
    champions: HashMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one document, assigning (or reusing) its vocabulary id.
    pub fn index_document(&mut self, url: &str, text: &str) -> DocId {
        let doc = self.vocab.add(url);
        if self.lengths.len() <= doc as usize {
            self.lengths.resize(doc as usize + 1, 0);
        }
        let tokens = tokenize(text);
        self.lengths[doc as usize] += tokens.len() as u32;
        for term in tokens {
            *self
                .postings
                .entry(term)
                .or_default()
                .entry(doc)
                .or_insert(0) += 1;
        }
        doc
    }

    /// Index a batched corpus in sorted-URL order so ids are deterministic.
    pub fn index_corpus(&mut self, corpus: &HashMap<String, String>) {
        let mut urls: Vec<&String> = corpus.keys().collect();
        urls.sort();
        for url in urls {
            self.index_document(url, &corpus[url]);
        }
    }

    pub fn num_docs(&self) -> usize {
        self.vocab.len()
    }

    pub fn url(&self, doc: DocId) -> Option<&str> {
        self.vocab.url(doc)
    }

    pub fn vocab(&self) -> &UrlVocabulary {
        &self.vocab
    }

    pub fn all_doc_ids(&self) -> HashSet<DocId> {
        self.vocab.doc_ids().collect()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// Documents containing `term`; empty for unindexed terms.
    pub fn docs_with(&self, term: &str) -> HashSet<DocId> {
        self.postings
            .get(term)
            .map(|postings| postings.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn tf(&self, term: &str, doc: DocId) -> u32 {
        self.postings
            .get(term)
            .and_then(|postings| postings.get(&doc))
            .copied()
            .unwrap_or(0)
    }

    pub fn df(&self, term: &str) -> usize {
        self.postings.get(term).map(BTreeMap::len).unwrap_or(0)
    }

    /// Inverse document frequency, log10-damped. Zero for unindexed terms.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.df(term);
        if df == 0 {
            return 0.0;
        }
        (self.num_docs() as f64 / df as f64).log10()
    }

    /// Smoothed variant used for ranking weights: log10(1 + N/df) stays
    /// positive for terms present in every document.
    pub fn smoothed_idf(&self, term: &str) -> f64 {
        let df = self.df(term);
        if df == 0 {
            return 0.0;
        }
        (1.0 + self.num_docs() as f64 / df as f64).log10()
    }

    pub fn tf_idf(&self, term: &str, doc: DocId) -> f64 {
        self.tf(term, doc) as f64 * self.idf(term)
    }

    /// Number of tokens emitted for the document, fixed after indexing.
    pub fn length(&self, doc: DocId) -> u32 {
        self.lengths.get(doc as usize).copied().unwrap_or(0)
    }

    /// Recompute every term's champion list: the top `r` documents by
    /// tf·idf, ties broken by ascending doc id.
    pub fn update_champions(&mut self, r: usize) {
        let num_docs = self.num_docs() as f64;
        let mut champions = HashMap::with_capacity(self.postings.len());
        for (term, postings) in &self.postings {
            let idf = (num_docs / postings.len() as f64).log10();
            let mut weighted: Vec<(DocId, f64)> = postings
                .iter()
                .map(|(&doc, &tf)| (doc, tf as f64 * idf))
                .collect();
            weighted.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            champions.insert(
                term.clone(),
                weighted.into_iter().take(r).map(|(doc, _)| doc).collect(),
            );
        }
        self.champions = champions;
    }

    pub fn has_champions(&self) -> bool {
        !self.champions.is_empty()
    }

    pub fn champions(&self, term: &str) -> Option<&[DocId]> {
        self.champions.get(term).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_add_is_idempotent() {
        let mut vocab = UrlVocabulary::default();
        assert_eq!(vocab.add("http://a.test"), 0);
        assert_eq!(vocab.add("http://b.test"), 1);
        assert_eq!(vocab.add("http://a.test"), 0);
        assert_eq!(vocab.url(1), Some("http://b.test"));
        assert_eq!(vocab.id("http://b.test"), Some(1));
    }

    #[test]
    fn corpus_order_is_deterministic() {
        let mut corpus = HashMap::new();
        corpus.insert("http://b.test".to_string(), "beta".to_string());
        corpus.insert("http://a.test".to_string(), "alpha".to_string());
        let mut index = InvertedIndex::new();
        index.index_corpus(&corpus);
        assert_eq!(index.url(0), Some("http://a.test"));
        assert_eq!(index.url(1), Some("http://b.test"));
    }

    #[test]
    fn champions_keep_top_documents() {
        let mut index = InvertedIndex::new();
        index.index_document("http://a.test", "nokia phone");
        index.index_document("http://b.test", "nokia nokia phone charger");
        index.index_document("http://c.test", "phone charger cable");
        index.update_champions(1);
        assert_eq!(index.champions("nokia"), Some(&[1u32][..]));
    }
}
