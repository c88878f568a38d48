pub mod config;
pub mod crawler;
pub mod frontier;
pub mod heap;
pub mod normalize;
pub mod robots;

pub use config::CrawlerConfig;
pub use crawler::{Crawler, CrawlerStats};
