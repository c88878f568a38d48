use std::collections::HashMap;

use spindle_core::index::InvertedIndex;
use spindle_core::query::FreeTextQuery;
use spindle_core::rank::{ContentRanker, RankOptions};

/// Three otherwise-similar documents mentioning the query term two, three
/// and one time respectively.
fn phone_index() -> InvertedIndex {
    let mut index = InvertedIndex::new();
    index.index_document("http://a.test", "iphone iphone pixel galaxy nokia");
    index.index_document("http://b.test", "iphone iphone iphone pixel galaxy");
    index.index_document("http://c.test", "iphone pixel galaxy nokia motorola");
    index
}

fn order(ranker: &ContentRanker) -> Vec<u32> {
    ranker.iter().map(|doc| doc.doc).collect()
}

#[test]
fn cosine_order_follows_term_frequency() {
    let index = phone_index();
    let query = FreeTextQuery::new(&index, "iphone");
    let ranker = ContentRanker::new(&query, &index, &RankOptions::default());
    assert_eq!(order(&ranker), vec![1, 0, 2]);
}

#[test]
fn champions_prune_candidates() {
    let mut index = phone_index();
    index.update_champions(1);
    let query = FreeTextQuery::new(&index, "nokia");
    let ranker = ContentRanker::new(&query, &index, &RankOptions::default());
    // nokia appears in docs 0 and 2 with equal weight; the champion list of
    // size one keeps only the tie-broken first
    assert_eq!(order(&ranker), vec![0]);
}

#[test]
fn matches_are_used_when_champions_are_absent() {
    let index = phone_index();
    let query = FreeTextQuery::new(&index, "nokia");
    let ranker = ContentRanker::new(&query, &index, &RankOptions::default());
    assert_eq!(ranker.len(), 2);
}

#[test]
fn pagerank_blending_shifts_the_order() {
    let index = phone_index();
    let query = FreeTextQuery::new(&index, "iphone");

    let mut auxiliary = HashMap::new();
    auxiliary.insert("http://c.test".to_string(), 0.8);
    auxiliary.insert("http://a.test".to_string(), 0.1);
    auxiliary.insert("http://b.test".to_string(), 0.1);

    let options = RankOptions {
        use_champions: false,
        auxiliary: Some(&auxiliary),
        auxiliary_weight: 1.0,
    };
    let ranker = ContentRanker::new(&query, &index, &options);
    assert_eq!(order(&ranker)[0], 2);

    let balanced = RankOptions {
        use_champions: false,
        auxiliary: Some(&auxiliary),
        auxiliary_weight: 0.0,
    };
    let ranker = ContentRanker::new(&query, &index, &balanced);
    assert_eq!(order(&ranker), vec![1, 0, 2]);
}

#[test]
fn scores_are_length_normalized() {
    let mut index = InvertedIndex::new();
    index.index_document("http://short.test", "nokia phone");
    index.index_document(
        "http://long.test",
        "nokia phone charger cable adapter headset",
    );
    let query = FreeTextQuery::new(&index, "nokia");
    let ranker = ContentRanker::new(&query, &index, &RankOptions::default());
    assert_eq!(order(&ranker), vec![0, 1]);
    assert!(ranker.top(1)[0].score > ranker.top(2)[1].score);
}
