use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use chrono::{DateTime, Utc};
use common::providers::FinBertClient;
use tracing::{info, warn};

use crate::{
    agents::{Narrative, NarrativeSummarizer},
    api::{ArticleSource, MarketDataSource, NewsApiArticleSource, YahooFinanceClient},
    cache::CacheEntry,
    config::{ClassifierBackend, Secrets, Settings, Ticker},
    models::{
        DataKind, FeedStatus, MarketBoard, MarketSnapshot, MissingDataError, SentimentBoard,
        SentimentLabel, SymbolFailure, SymbolSentiment,
    },
    sentiment::{FinBertBackend, LexiconBackend, ModelBackend, SentimentAggregator, SentimentClassifier},
};

/// Runs the news → sentiment → narrative pipeline over the configured tickers
/// and memoizes whole boards for their TTL.
pub struct SentimentTerminal {
    settings: Settings,
    articles: Box<dyn ArticleSource>,
    market: Box<dyn MarketDataSource>,
    aggregator: SentimentAggregator,
    narrator: NarrativeSummarizer,
    sentiment_cache: Option<CacheEntry<SentimentBoard>>,
    market_cache: Option<CacheEntry<MarketBoard>>,
}

impl SentimentTerminal {
    pub fn new(
        settings: Settings,
        articles: Box<dyn ArticleSource>,
        market: Box<dyn MarketDataSource>,
        aggregator: SentimentAggregator,
        narrator: NarrativeSummarizer,
    ) -> Self {
        Self {
            settings,
            articles,
            market,
            aggregator,
            narrator,
            sentiment_cache: None,
            market_cache: None,
        }
    }

    /// Wires the hosted clients. Missing credentials degrade individual
    /// features instead of failing startup.
    pub fn from_settings(settings: Settings, secrets: &Secrets) -> Result<Self> {
        if secrets.news_api_key.is_none() {
            warn!("NEWS_API_KEY is not set; every ticker will report an unavailable news feed");
        }
        let articles = NewsApiArticleSource::new(secrets.news_api_key.as_deref(), &settings)?;
        let market = YahooFinanceClient::new(&settings.market)?;

        let backend: Box<dyn ModelBackend> = match (settings.classifier.backend, secrets.hf_api_token.as_deref()) {
            (ClassifierBackend::Finbert, Some(token)) => {
                let mut client = FinBertClient::new(token)?.with_model(&settings.classifier.model);
                if let Some(base_url) = &settings.classifier.base_url {
                    client = client.with_base_url(base_url);
                }
                Box::new(FinBertBackend::new(client))
            }
            (ClassifierBackend::Finbert, None) => {
                warn!("HF_API_TOKEN is not set; falling back to the financial lexicon classifier");
                Box::new(LexiconBackend::new())
            }
            (ClassifierBackend::Lexicon, _) => Box::new(LexiconBackend::new()),
        };
        let classifier = SentimentClassifier::new(backend);
        info!("🎭 Sentiment classifier: {}", classifier.backend_name());

        let narrator = NarrativeSummarizer::claude(secrets.claude_api_key.as_deref(), settings.narrative.clone());
        if narrator.is_configured() {
            info!("📝 Research summaries: {}", settings.narrative.model);
        } else {
            warn!("CLAUDE_API_KEY is not set; research summaries are disabled");
        }

        Ok(Self::new(
            settings,
            Box::new(articles),
            Box::new(market),
            SentimentAggregator::new(Arc::new(classifier)),
            narrator,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.settings.tickers
    }

    /// Drops both boards so the next read reloads every ticker.
    pub fn refresh(&mut self) {
        info!("🔄 Manual refresh requested; clearing cached boards");
        self.sentiment_cache = None;
        self.market_cache = None;
    }

    /// When the cached sentiment board was computed and when it expires.
    pub fn sentiment_freshness(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.sentiment_cache.as_ref().map(|e| (e.computed_at, e.expires_at()))
    }

    pub async fn sentiment_board(&mut self) -> &SentimentBoard {
        if let Some(entry) = self.sentiment_cache.take().filter(|e| !e.is_stale()) {
            return &self.sentiment_cache.insert(entry).value;
        }
        let board = self.load_sentiment().await;
        let ttl = self.settings.cache.sentiment_ttl();
        &self.sentiment_cache.insert(CacheEntry::new(board, ttl)).value
    }

    pub async fn market_board(&mut self) -> &MarketBoard {
        if let Some(entry) = self.market_cache.take().filter(|e| !e.is_stale()) {
            return &self.market_cache.insert(entry).value;
        }
        let board = self.load_market().await;
        let ttl = self.settings.cache.market_ttl();
        &self.market_cache.insert(CacheEntry::new(board, ttl)).value
    }

    pub async fn symbol_sentiment(&mut self, symbol: &str) -> Result<&SymbolSentiment, MissingDataError> {
        let symbol = normalize(symbol);
        self.sentiment_board()
            .await
            .get(&symbol)
            .ok_or(MissingDataError { symbol, kind: DataKind::Sentiment })
    }

    pub async fn symbol_market(&mut self, symbol: &str) -> Result<&MarketSnapshot, MissingDataError> {
        let symbol = normalize(symbol);
        self.market_board()
            .await
            .get(&symbol)
            .ok_or(MissingDataError { symbol, kind: DataKind::Market })
    }

    /// Research note over the ticker's stored top articles.
    pub async fn analyze_symbol(&mut self, symbol: &str) -> Result<Narrative, MissingDataError> {
        let entry = self.symbol_sentiment(symbol).await?.clone();
        let text = self.narrator
            .summarize_symbol(&entry.summary.symbol, &entry.articles)
            .await;

        Ok(Narrative {
            symbol: Some(entry.summary.symbol.clone()),
            text,
            tone: entry.summary.tone(),
        })
    }

    pub async fn market_overview(&mut self) -> Narrative {
        let summaries = self.sentiment_board().await.summaries();
        let text = self.narrator.summarize_market(&summaries).await;

        let mean = if summaries.is_empty() {
            0.0
        } else {
            summaries.iter().map(|s| s.avg_sentiment).sum::<f64>() / summaries.len() as f64
        };

        Narrative {
            symbol: None,
            text,
            tone: SentimentLabel::bucket(mean),
        }
    }

    async fn load_sentiment(&self) -> SentimentBoard {
        info!("🤖 Analyzing news sentiment for {} tickers...", self.settings.tickers.len());
        let delay = Duration::from_millis(self.settings.news.request_delay_ms);
        let mut symbols = Vec::with_capacity(self.settings.tickers.len());

        for (i, ticker) in self.settings.tickers.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            symbols.push(self.load_symbol_sentiment(&ticker.symbol).await);
        }

        let unavailable = symbols.iter().filter(|s| s.feed != FeedStatus::Ok).count();
        info!("✅ Sentiment board ready ({} tickers, {} feeds unavailable)", symbols.len(), unavailable);
        SentimentBoard { symbols }
    }

    async fn load_symbol_sentiment(&self, symbol: &str) -> SymbolSentiment {
        let (articles, feed) = match self.articles.fetch(symbol, self.settings.news.lookback_days).await {
            Ok(articles) => (articles, FeedStatus::Ok),
            Err(e) => {
                warn!(symbol, error = %e, "news fetch failed, continuing with no articles");
                (Vec::new(), FeedStatus::Unavailable { reason: e.to_string() })
            }
        };

        let scored = self.aggregator.analyze(&articles).await;
        let summary = SentimentAggregator::summarize(&scored, symbol);

        SymbolSentiment {
            summary,
            articles: scored.into_iter().take(self.settings.dashboard.articles_per_symbol).collect(),
            feed,
        }
    }

    async fn load_market(&self) -> MarketBoard {
        info!("📊 Loading market data for {} tickers...", self.settings.tickers.len());
        let mut board = MarketBoard::default();

        for ticker in &self.settings.tickers {
            match self.market.snapshot(&ticker.symbol).await {
                Ok(snapshot) => board.snapshots.push(snapshot),
                Err(e) => {
                    warn!(symbol = %ticker.symbol, error = %e, "market data unavailable");
                    board.failures.push(SymbolFailure {
                        symbol: ticker.symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        board
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
