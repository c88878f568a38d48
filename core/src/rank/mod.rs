pub mod content;
pub mod pagerank;

pub use content::{ContentRanker, RankOptions, RankedDocument};
pub use pagerank::PageRank;
