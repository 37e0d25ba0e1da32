use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use stock_sentiment::{
    agents::{CompletionBackend, NarrativeSummarizer, NO_NEWS_MESSAGE},
    config::NarrativeConfig,
    models::{FeedStatus, MarketSnapshot},
    sentiment::Prediction,
    Article, ArticleSource, ClassificationError, FetchError, MarketDataError, MarketDataSource,
    ModelBackend, SentimentAggregator, SentimentClassifier, SentimentLabel, SentimentSummary,
    SentimentTerminal, Settings, SummarizationError,
};

/// Answers by keyword so results are deterministic.
struct KeywordModel;

#[async_trait]
impl ModelBackend for KeywordModel {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn predict(&self, text: &str) -> Result<Prediction, ClassificationError> {
        let text = text.to_lowercase();
        let (label, score) = if text.contains("beats") {
            ("positive", 0.9)
        } else if text.contains("recall") {
            ("negative", 0.5)
        } else if text.contains("outage") {
            return Err(ClassificationError::Backend("model loading".to_string()));
        } else {
            ("neutral", 0.8)
        };
        Ok(Prediction { label: label.to_string(), score })
    }
}

fn aggregator() -> SentimentAggregator {
    SentimentAggregator::new(Arc::new(SentimentClassifier::new(Box::new(KeywordModel))))
}

fn article(symbol: &str, title: &str, description: &str) -> Article {
    Article {
        symbol: symbol.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        content: None,
        source: "Reuters".to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap(),
        url: format!("https://news.example.com/{}", title.len()),
    }
}

#[tokio::test]
async fn single_positive_article_summary() {
    let aggregator = aggregator();
    let scored = aggregator
        .analyze(&[article("AAPL", "Apple beats earnings", "Record profit")])
        .await;

    assert_eq!(scored.len(), 1);
    assert!((scored[0].sentiment_score - 0.9).abs() < 1e-12);

    let summary = SentimentAggregator::summarize(&scored, "AAPL");
    assert!((summary.avg_sentiment - 0.9).abs() < 1e-12);
    assert_eq!(summary.total_articles, 1);
    assert_eq!(summary.positive_count, 1);
    assert_eq!(summary.negative_count, 0);
    assert_eq!(summary.neutral_count, 0);
    assert_eq!(summary.latest_articles.len(), 1);
}

#[tokio::test]
async fn symbol_without_articles_has_zero_summary() {
    let scored = aggregator().analyze(&[]).await;
    let summary = SentimentAggregator::summarize(&scored, "TSLA");

    assert_eq!(summary, SentimentSummary::empty("TSLA"));
    assert_eq!(summary.symbol, "TSLA");
    assert_eq!(summary.avg_sentiment, 0.0);
    assert_eq!(summary.total_articles, 0);
    assert!(summary.latest_articles.is_empty());
}

#[tokio::test]
async fn analyze_is_idempotent_and_buckets_sum() {
    let aggregator = aggregator();
    let articles = vec![
        article("TSLA", "Tesla beats delivery forecast", "Shares up"),
        article("TSLA", "Tesla recall widens", "Regulators expand probe"),
        article("TSLA", "Tesla annual meeting", "Shareholders vote"),
        article("TSLA", "Tesla outage", "Service disruption"),
        article("AAPL", "Apple beats", "Again"),
    ];

    let first = aggregator.analyze(&articles).await;
    let second = aggregator.analyze(&articles).await;
    assert_eq!(first, second);

    for symbol in ["TSLA", "AAPL", "MSFT"] {
        let summary = SentimentAggregator::summarize(&first, symbol);
        assert_eq!(
            summary.positive_count + summary.negative_count + summary.neutral_count,
            summary.total_articles
        );
    }

    let tsla = SentimentAggregator::summarize(&first, "TSLA");
    assert_eq!(tsla.total_articles, 4);
    assert_eq!(tsla.failed_classifications, 1);
    assert_eq!(tsla.neutral_count, 2);
    assert!(first.iter().all(|a| (-1.0..=1.0).contains(&a.sentiment_score)));
}

struct PanickingBackend;

#[async_trait]
impl CompletionBackend for PanickingBackend {
    async fn complete(&self, _prompt: &str, _max_tokens: u64) -> Result<String, SummarizationError> {
        panic!("no external call expected");
    }
}

#[tokio::test]
async fn narrative_for_empty_list_skips_the_model() {
    let summarizer = NarrativeSummarizer::new(Some(Box::new(PanickingBackend)), NarrativeConfig::default());
    assert_eq!(summarizer.summarize_symbol("AAPL", &[]).await, NO_NEWS_MESSAGE);
}

struct FlakyNews {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ArticleSource for FlakyNews {
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Article>, FetchError> {
        assert_eq!(lookback_days, 3);
        self.calls.fetch_add(1, Ordering::SeqCst);
        match symbol {
            "AAPL" => Ok(vec![
                article("AAPL", "Apple beats earnings", "Record profit"),
                article("AAPL", "Apple recall", "Minor issue"),
            ]),
            "GOOGL" => Err(FetchError::Unauthorized { symbol: symbol.to_string() }),
            _ => Ok(Vec::new()),
        }
    }
}

struct Offline;

#[async_trait]
impl MarketDataSource for Offline {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        Err(MarketDataError::Api { symbol: symbol.to_string(), reason: "offline".to_string() })
    }
}

#[tokio::test]
async fn terminal_builds_a_board_for_every_ticker() {
    let mut settings = Settings::default();
    settings.news.request_delay_ms = 0;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut terminal = SentimentTerminal::new(
        settings,
        Box::new(FlakyNews { calls: calls.clone() }),
        Box::new(Offline),
        aggregator(),
        NarrativeSummarizer::new(None, NarrativeConfig::default()),
    );

    let board = terminal.sentiment_board().await.clone();
    assert_eq!(board.symbols.len(), 8);
    assert_eq!(calls.load(Ordering::SeqCst), 8);

    let symbols: Vec<&str> = board.symbols.iter().map(|s| s.summary.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "TSLA", "GOOGL", "MSFT", "AMZN", "NVDA", "META", "NFLX"]);

    let aapl = board.get("AAPL").unwrap();
    assert_eq!(aapl.summary.positive_count, 1);
    assert_eq!(aapl.summary.negative_count, 1);
    assert!((aapl.summary.avg_sentiment - 0.2).abs() < 1e-12);
    assert_eq!(aapl.summary.tone(), SentimentLabel::Positive);

    let googl = board.get("GOOGL").unwrap();
    assert!(matches!(googl.feed, FeedStatus::Unavailable { .. }));
    assert_eq!(googl.summary, SentimentSummary::empty("GOOGL"));

    let market = terminal.market_board().await;
    assert!(market.snapshots.is_empty());
    assert_eq!(market.failures.len(), 8);
    assert!(terminal.symbol_market("AAPL").await.is_err());
}
