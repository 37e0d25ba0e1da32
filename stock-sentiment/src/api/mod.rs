pub mod news;
pub mod yahoo;

pub use news::{ArticleSource, NewsApiArticleSource};
pub use yahoo::{MarketDataSource, YahooFinanceClient};
