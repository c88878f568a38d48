use std::collections::{BTreeSet, HashSet};

use super::SearchQuery;
use crate::index::InvertedIndex;
use crate::tokenizer::tokenize;
use crate::DocId;

/// Free-text query: tokenized like a document, matching the union of each
/// term's postings.
pub struct FreeTextQuery {
    matches: HashSet<DocId>,
    search_terms: BTreeSet<String>,
}

impl FreeTextQuery {
    pub fn new(index: &InvertedIndex, query: &str) -> Self {
        let mut matches = HashSet::new();
        let mut search_terms = BTreeSet::new();
        for term in tokenize(query) {
            matches.extend(index.docs_with(&term));
            search_terms.insert(term);
        }
        Self {
            matches,
            search_terms,
        }
    }
}

impl SearchQuery for FreeTextQuery {
    fn matches(&self) -> &HashSet<DocId> {
        &self.matches
    }

    fn search_terms(&self) -> &BTreeSet<String> {
        &self.search_terms
    }
}
