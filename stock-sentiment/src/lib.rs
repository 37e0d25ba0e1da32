pub mod agents;
pub mod api;
pub mod cache;
pub mod config;
pub mod display;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sentiment;
pub mod system;

// Re-export main components
pub use agents::{CompletionBackend, Narrative, NarrativeSummarizer};
pub use api::{ArticleSource, MarketDataSource, NewsApiArticleSource, YahooFinanceClient};
pub use cache::CacheEntry;
pub use config::{Secrets, Settings, Ticker};
pub use models::{
    Article, ClassificationError, FetchError, MarketDataError, MissingDataError, ScoredArticle,
    SentimentLabel, SentimentSummary, SummarizationError,
};
pub use sentiment::{ModelBackend, SentimentAggregator, SentimentClassifier};
pub use system::SentimentTerminal;
